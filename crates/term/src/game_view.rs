//! GameView: maps a `core::GameSnapshot` into a terminal framebuffer.
//!
//! Pure (no I/O), so it can be unit-tested.
//!
//! Layout, inside a bordered frame:
//!
//! ```text
//! ┌─ MATH TILES ───────────────────────────┐
//! │                                        │
//! │  (3 + 7) X 2 ½ 5                       │  SCORE
//! │      ▲                                 │  14
//! │  = (3+7)*20.55                         │
//! │  SOLVED 205.5 +14                      │  TIME
//! │  + 3  - 3  X 2  % 3  ^ 3  ½ 2          │  42
//! │  next: ( )                             │
//! └────────────────────────────────────────┘
//! ```

use crate::core::{GameSnapshot, ValidationOutcome};
use crate::fb::{digit_count, CellStyle, FrameBuffer, Rgb};
use crate::types::{Operator, RoundStatus, Tile, TimerState};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// Rows inside the frame.
const ROW_BOARD: u16 = 2;
const ROW_CURSOR: u16 = 3;
const ROW_EXPR: u16 = 4;
const ROW_STATUS: u16 = 5;
const ROW_POOL: u16 = 6;
const ROW_SELECTION: u16 = 7;
const FRAME_H: u16 = 9;
const MIN_FRAME_W: u16 = 42;
const PAD_X: u16 = 2;

const HELP: &str = "+-x%^h() pick  <- -> move  enter place  m merge  v check  n new  q quit";

const BORDER: CellStyle = CellStyle::plain(Rgb::new(200, 200, 200));
const LABEL: CellStyle = CellStyle::plain(Rgb::new(220, 220, 220)).bold();
const VALUE: CellStyle = CellStyle::plain(Rgb::new(200, 200, 200));
const DIGIT: CellStyle = CellStyle::plain(Rgb::new(80, 220, 220)).bold();
const PAREN: CellStyle = CellStyle::plain(Rgb::new(200, 120, 220)).bold();
const PLACED_OP: CellStyle = CellStyle::plain(Rgb::new(240, 220, 80)).bold();
const DEFAULT_OP: CellStyle = CellStyle::plain(Rgb::new(140, 140, 140)).dim();
const MARKER: CellStyle = CellStyle::plain(Rgb::new(255, 255, 255)).bold();
const GOOD: CellStyle = CellStyle::plain(Rgb::new(100, 220, 120)).bold();
const BAD: CellStyle = CellStyle::plain(Rgb::new(220, 80, 80)).bold();

/// A lightweight terminal renderer for the puzzle.
pub struct GameView {
    anchor_y: AnchorY,
    show_help: bool,
}

impl Default for GameView {
    fn default() -> Self {
        Self {
            anchor_y: AnchorY::Center,
            show_help: true,
        }
    }
}

/// Horizontal extent of a drawn cell or gap.
#[derive(Debug, Clone, Copy, Default)]
struct Span {
    start: u16,
    end: u16,
}

impl Span {
    fn center(&self) -> u16 {
        self.start + (self.end.saturating_sub(self.start).saturating_sub(1)) / 2
    }
}

impl GameView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    pub fn with_help(mut self, show_help: bool) -> Self {
        self.show_help = show_help;
        self
    }

    /// Frame width needed for `snap`.
    pub fn frame_width(&self, snap: &GameSnapshot) -> u16 {
        (board_row_width(snap) + PAD_X * 2 + 2).max(MIN_FRAME_W)
    }

    /// Render into an existing framebuffer.
    ///
    /// `cursor` is a position in the interleaved `cell gap cell ...` row.
    pub fn render_into(
        &self,
        snap: &GameSnapshot,
        cursor: Option<usize>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        self.render_into_with_adapter(snap, cursor, None, viewport, fb);
    }

    pub fn render_into_with_adapter(
        &self,
        snap: &GameSnapshot,
        cursor: Option<usize>,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let frame_w = self.frame_width(snap);
        let start_x = viewport.width.saturating_sub(frame_w) / 2;
        let start_y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(FRAME_H) / 2,
            AnchorY::Top => 0,
        };

        self.draw_border(fb, start_x, start_y, frame_w, FRAME_H);
        fb.put_str(start_x + 2, start_y, " MATH TILES ", LABEL);

        let inner_x = start_x + 1 + PAD_X;
        let spans = self.draw_board_row(fb, snap, inner_x, start_y + ROW_BOARD);

        if let Some(pos) = cursor {
            if let Some(span) = spans.get(pos) {
                fb.put_char(span.center(), start_y + ROW_CURSOR, '▲', MARKER);
            }
        }

        let x = fb.put_str(inner_x, start_y + ROW_EXPR, "= ", DEFAULT_OP);
        fb.put_str(x, start_y + ROW_EXPR, &snap.expression, VALUE.dim());

        self.draw_status_line(fb, snap, inner_x, start_y + ROW_STATUS);
        self.draw_pool(fb, snap, inner_x, start_y + ROW_POOL);
        self.draw_selection(fb, snap, inner_x, start_y + ROW_SELECTION);

        self.draw_side_panel(fb, snap, adapter, viewport, start_x, start_y, frame_w);

        if self.show_help {
            let help_y = start_y + FRAME_H + 1;
            let help_w = HELP.chars().count() as u16;
            let help_x = viewport.width.saturating_sub(help_w) / 2;
            fb.put_str(help_x, help_y, HELP, VALUE.dim());
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, cursor: Option<usize>, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, cursor, viewport, &mut fb);
        fb
    }

    pub fn render_with_adapter(
        &self,
        snap: &GameSnapshot,
        cursor: Option<usize>,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into_with_adapter(snap, cursor, adapter, viewport, &mut fb);
        fb
    }

    fn draw_border(&self, fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16) {
        if w < 2 || h < 2 {
            return;
        }

        fb.put_char(x, y, '┌', BORDER);
        fb.put_char(x + w - 1, y, '┐', BORDER);
        fb.put_char(x, y + h - 1, '└', BORDER);
        fb.put_char(x + w - 1, y + h - 1, '┘', BORDER);

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', BORDER);
            fb.put_char(x + dx, y + h - 1, '─', BORDER);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', BORDER);
            fb.put_char(x + w - 1, y + dy, '│', BORDER);
        }
    }

    /// Draw `(3 + 7) X 2`; returns one span per cursor position.
    fn draw_board_row(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16) -> Vec<Span> {
        let mut spans = Vec::with_capacity(snap.cells.len() * 2);
        let mut cx = x;

        for (i, &value) in snap.cells.iter().enumerate() {
            let parens = snap.parens.get(i).copied().unwrap_or_default();
            for _ in 0..parens.open {
                fb.put_char(cx, y, '(', PAREN);
                cx = cx.saturating_add(1);
            }
            let start = cx;
            cx = fb.put_u64(cx, y, value, DIGIT);
            spans.push(Span { start, end: cx });
            for _ in 0..parens.close {
                fb.put_char(cx, y, ')', PAREN);
                cx = cx.saturating_add(1);
            }

            if let Some(gap) = snap.gaps.get(i) {
                let style = if gap.placed { PLACED_OP } else { DEFAULT_OP };
                let at = cx.saturating_add(1);
                fb.put_char(at, y, gap.operator.symbol(), style);
                spans.push(Span { start: at, end: at + 1 });
                cx = cx.saturating_add(3);
            }
        }

        spans
    }

    fn draw_status_line(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16) {
        match (snap.status, snap.last_outcome) {
            (RoundStatus::Solved, Some(ValidationOutcome::Accepted { value, award })) => {
                let cx = fb.put_str(x, y, "SOLVED ", GOOD);
                let cx = fb.put_str(cx, y, &format_value(value), GOOD);
                let cx = fb.put_str(cx, y, " +", GOOD);
                fb.put_u64(cx, y, award.total as u64, GOOD);
            }
            (RoundStatus::Solved, _) => {
                fb.put_str(x, y, "SOLVED", GOOD);
            }
            (RoundStatus::Invalid, Some(ValidationOutcome::Rejected(err))) => {
                let cx = fb.put_str(x, y, "INVALID: ", BAD);
                fb.put_str(cx, y, &err.to_string(), BAD);
            }
            (RoundStatus::Invalid, _) => {
                fb.put_str(x, y, "INVALID", BAD);
            }
            (RoundStatus::TimedOut, _) => {
                fb.put_str(x, y, "TIME UP - press n for a new round", BAD);
            }
            (RoundStatus::InProgress, _) => {
                if snap.timer == TimerState::Inactive {
                    fb.put_str(x, y, "press n to start", VALUE.dim());
                }
            }
        }
    }

    fn draw_pool(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16) {
        let mut cx = x;
        for op in Operator::ALL {
            let count = snap.pool[op.index()];
            let style = if count == 0 { DEFAULT_OP } else { PLACED_OP };
            fb.put_char(cx, y, op.symbol(), style);
            fb.put_u64(cx + 2, y, count as u64, if count == 0 { DEFAULT_OP } else { VALUE });
            cx = cx.saturating_add(5);
        }
    }

    fn draw_selection(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, x: u16, y: u16) {
        let mut cx = fb.put_str(x, y, "next:", LABEL);
        if snap.selection.is_empty() {
            fb.put_str(cx + 1, y, "-", DEFAULT_OP);
            return;
        }
        for (i, tile) in snap.selection.iter().enumerate() {
            let style = match (i, tile) {
                (0, Tile::Paren(_)) => PAREN,
                (0, Tile::Op(_)) => PLACED_OP,
                _ => VALUE.dim(),
            };
            cx = cx.saturating_add(1);
            fb.put_char(cx, y, tile.symbol(), style);
            cx = cx.saturating_add(1);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        start_x: u16,
        start_y: u16,
        frame_w: u16,
    ) {
        let panel_x = start_x.saturating_add(frame_w).saturating_add(2);
        if panel_x >= viewport.width {
            return;
        }
        if viewport.width - panel_x < 8 {
            return;
        }

        let mut y = start_y;
        fb.put_str(panel_x, y, "SCORE", LABEL);
        y = y.saturating_add(1);
        fb.put_u64(panel_x, y, snap.score as u64, VALUE);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "TIME", LABEL);
        y = y.saturating_add(1);
        let time_style = match snap.timer {
            TimerState::Running if snap.time_remaining <= 10 => BAD,
            TimerState::Running => VALUE,
            _ => VALUE.dim(),
        };
        fb.put_u64(panel_x, y, snap.time_remaining as u64, time_style);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "ROUND", LABEL);
        y = y.saturating_add(1);
        fb.put_u64(panel_x, y, snap.round_id as u64 + 1, VALUE);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "AI", LABEL);
        y = y.saturating_add(1);
        match adapter {
            Some(st) if st.enabled => {
                let cx = fb.put_str(panel_x, y, "C ", VALUE);
                fb.put_u64(cx, y, st.client_count as u64, VALUE);
                y = y.saturating_add(1);
                let cx = fb.put_str(panel_x, y, "CTRL ", VALUE);
                match st.controller_id {
                    Some(id) => {
                        fb.put_u64(cx, y, id as u64, VALUE);
                    }
                    None => {
                        fb.put_str(cx, y, "-", VALUE);
                    }
                }
            }
            _ => {
                fb.put_str(panel_x, y, "OFF", VALUE);
            }
        }
    }
}

/// Columns taken by the board row.
fn board_row_width(snap: &GameSnapshot) -> u16 {
    let mut w: u16 = 0;
    for (i, &value) in snap.cells.iter().enumerate() {
        let parens = snap.parens.get(i).copied().unwrap_or_default();
        w = w
            .saturating_add(parens.open)
            .saturating_add(digit_count(value))
            .saturating_add(parens.close);
        if i < snap.gaps.len() {
            w = w.saturating_add(3);
        }
    }
    w
}

/// Whole numbers without decimals, otherwise up to three places.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{:.0}", value);
    }
    let s = format!("{:.3}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
