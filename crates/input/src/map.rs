//! Key mapping from terminal events to game actions.

use crate::cursor::Cursor;
use crate::types::{GameAction, Operator, ParenKind, Tile};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Map keyboard input to game actions.
///
/// Cursor movement is handled here and produces no action.
pub fn handle_key_event(key: KeyEvent, cursor: &mut Cursor, cell_count: usize) -> Option<GameAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        // Cursor
        KeyCode::Left => {
            cursor.move_left();
            None
        }
        KeyCode::Right => {
            cursor.move_right(cell_count);
            None
        }
        KeyCode::Home => {
            cursor.home();
            None
        }
        KeyCode::End => {
            cursor.end(cell_count);
            None
        }

        // Board
        KeyCode::Enter => Some(GameAction::PlaceTile(cursor.index())),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(GameAction::MergeCells(cursor.index())),
        KeyCode::Char(' ') | KeyCode::Char('v') | KeyCode::Char('V') => Some(GameAction::Validate),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('r') | KeyCode::Char('R') => {
            Some(GameAction::NewRound)
        }

        KeyCode::Char(c) => tile_for_key(c).map(GameAction::SelectTile),

        _ => None,
    }
}

/// Tile picked up by a character key.
pub fn tile_for_key(c: char) -> Option<Tile> {
    let tile = match c {
        '+' => Tile::Op(Operator::Add),
        '-' => Tile::Op(Operator::Sub),
        'x' | 'X' | '*' => Tile::Op(Operator::Mul),
        '%' | '/' => Tile::Op(Operator::Div),
        '^' => Tile::Op(Operator::Pow),
        'h' | 'H' | '½' => Tile::Op(Operator::Half),
        '(' => Tile::Paren(ParenKind::Open),
        ')' => Tile::Paren(ParenKind::Close),
        _ => return None,
    };
    Some(tile)
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
