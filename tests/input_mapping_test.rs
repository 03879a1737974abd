//! Keyboard intents driving a real game.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use math_tiles::core::GameState;
use math_tiles::input::{handle_key_event, should_quit, Cursor, CursorTarget};
use math_tiles::types::{Operator, RoundStatus};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn press(game: &mut GameState, cursor: &mut Cursor, code: KeyCode) -> bool {
    match handle_key_event(key(code), cursor, game.board().len()) {
        Some(action) => game.apply_action(action),
        None => false,
    }
}

#[test]
fn keyboard_session_solves_round() {
    let mut game = GameState::from_cells(&[3, 4, 5]);
    let mut cursor = Cursor::new();

    // Move onto the first gap and multiply.
    press(&mut game, &mut cursor, KeyCode::Right);
    assert_eq!(cursor.target(), CursorTarget::Gap(0));
    assert!(press(&mut game, &mut cursor, KeyCode::Char('x')));
    assert!(press(&mut game, &mut cursor, KeyCode::Enter));
    assert_eq!(game.placements().operator_at(0), Some(Operator::Mul));

    // Merge 4 and 5 into 45 from the second gap.
    press(&mut game, &mut cursor, KeyCode::End);
    press(&mut game, &mut cursor, KeyCode::Left);
    assert_eq!(cursor.target(), CursorTarget::Gap(1));
    assert!(press(&mut game, &mut cursor, KeyCode::Char('m')));
    assert_eq!(game.board().cells(), &[3, 45]);

    cursor.clamp(game.board().len());
    assert!(cursor.position() <= 2);

    assert!(press(&mut game, &mut cursor, KeyCode::Char('v')));
    assert_eq!(game.status(), RoundStatus::Solved);
    // 3 * 45 = 135: weight 2 plus 60 / 5.
    assert_eq!(game.score(), 14);
}

#[test]
fn parentheses_attach_to_cell_under_cursor() {
    let mut game = GameState::from_cells(&[1, 2, 3, 4]);
    let mut cursor = Cursor::new();

    press(&mut game, &mut cursor, KeyCode::Char('('));
    press(&mut game, &mut cursor, KeyCode::Enter);
    press(&mut game, &mut cursor, KeyCode::Right);
    press(&mut game, &mut cursor, KeyCode::Right);
    assert_eq!(cursor.target(), CursorTarget::Cell(1));
    press(&mut game, &mut cursor, KeyCode::Char(')'));
    press(&mut game, &mut cursor, KeyCode::Enter);

    assert_eq!(game.expression().to_text(), "(1+2)+3+4");
}

#[test]
fn new_round_key_resets_round() {
    let mut game = GameState::from_cells(&[5, 5]);
    let mut cursor = Cursor::new();
    press(&mut game, &mut cursor, KeyCode::Char('-'));

    assert!(press(&mut game, &mut cursor, KeyCode::Char('n')));
    assert!(game.selection().is_empty());
    assert_eq!(game.round_id(), 1);
}

#[test]
fn release_events_and_quit_keys() {
    let mut cursor = Cursor::new();
    let release = KeyEvent::new_with_kind(KeyCode::Char('v'), KeyModifiers::NONE, KeyEventKind::Release);
    assert_eq!(handle_key_event(release, &mut cursor, 4), None);

    assert!(should_quit(key(KeyCode::Char('q'))));
    assert!(should_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    assert!(!should_quit(key(KeyCode::Char('c'))));
}
