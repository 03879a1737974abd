//! Terminal Math Tiles runner (default binary).
//!
//! Uses crossterm for input and a framebuffer renderer. The optional AI
//! adapter is polled once per frame on the same thread that owns the game.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use log::info;

use math_tiles::adapter::Adapter;
use math_tiles::core::{GameSnapshot, GameState};
use math_tiles::input::{handle_key_event, should_quit, Cursor};
use math_tiles::logging::setup_logging;
use math_tiles::term::{AdapterStatusView, FrameBuffer, GameView, TerminalRenderer, Viewport};
use math_tiles::types::TICK_MS;

#[derive(Parser, Debug)]
#[command(name = "math-tiles", version)]
#[command(about = "Place operators between digits and build an expression under 1000")]
struct Cli {
    /// RNG seed (default: derived from the clock)
    #[arg(long)]
    seed: Option<u32>,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Log spec, e.g. "debug" or "math_tiles_core=debug" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not start the AI adapter
    #[arg(long, default_value_t = false)]
    no_adapter: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_dir, cli.log_level.as_deref())?;

    let seed = cli.seed.unwrap_or_else(clock_seed);
    info!("starting with seed {}", seed);

    let adapter = if cli.no_adapter {
        None
    } else {
        Adapter::start_from_env()?
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, seed, adapter);

    // Always try to restore terminal state.
    let _ = term.exit();
    info!("exiting");
    result
}

fn run(term: &mut TerminalRenderer, seed: u32, mut adapter: Option<Adapter>) -> Result<()> {
    let mut game = GameState::new(seed);
    game.start();

    let view = GameView::default();
    let mut cursor = Cursor::new();
    let mut fb = FrameBuffer::new(0, 0);
    let mut snap = GameSnapshot::default();
    let mut adapter_view = adapter_status(adapter.as_ref());
    let mut dirty = true;

    if let Some(a) = adapter.as_mut() {
        a.broadcast(&game);
    }

    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        if dirty {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            game.snapshot_into(&mut snap);
            cursor.clamp(snap.cells.len());
            view.render_into_with_adapter(
                &snap,
                Some(cursor.position()),
                adapter_view.as_ref(),
                Viewport::new(w, h),
                &mut fb,
            );
            term.draw_swap(&mut fb)?;
            dirty = false;
        }

        // Input with timeout until next tick.
        let timeout = tick_duration.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if should_quit(key) {
                        return Ok(());
                    }

                    let before = cursor;
                    if let Some(action) = handle_key_event(key, &mut cursor, game.board().len()) {
                        if game.apply_action(action) {
                            dirty = true;
                            if let Some(a) = adapter.as_mut() {
                                a.broadcast(&game);
                            }
                        }
                    }
                    dirty |= cursor != before;
                }
                Event::Resize(_, _) => {
                    term.invalidate();
                    dirty = true;
                }
                _ => {}
            }
        }

        // Tick.
        let elapsed = last_tick.elapsed();
        if elapsed >= tick_duration {
            last_tick = Instant::now();

            if game.advance(elapsed.as_millis() as u32) {
                dirty = true;
                if let Some(a) = adapter.as_mut() {
                    a.broadcast(&game);
                }
            }

            if let Some(a) = adapter.as_mut() {
                dirty |= a.pump(&mut game);
            }

            let status = adapter_status(adapter.as_ref());
            if status != adapter_view {
                adapter_view = status;
                dirty = true;
            }
        }
    }
}

fn adapter_status(adapter: Option<&Adapter>) -> Option<AdapterStatusView> {
    adapter.map(|a| AdapterStatusView {
        enabled: true,
        client_count: a.client_count().min(u16::MAX as usize) as u16,
        controller_id: a.controller_id(),
    })
}

fn clock_seed() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() as u32) ^ now.subsec_nanos()
}
