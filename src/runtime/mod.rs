use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::audio::RodioBackend;
use crate::cli::Args;
use crate::config;
use crate::logging;
use crate::playback::{Command, ControllerOptions, PlaybackController};
use crate::ui::TerminalRenderer;

mod event_loop;
mod input;
mod render;
mod settings;
mod startup;

use event_loop::CoordinationLoop;

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.clone().or_else(config::default_log_path);
    let _log_guard = logging::init(log_path.as_deref(), args.verbose)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let mut settings = settings::load_settings();
    startup::apply_cli_overrides(&mut settings, &args);

    let dir = startup::library_dir(&args);
    let catalog = startup::load_catalog(&dir, &settings)?;

    // Without an output device there is nothing to do; fail before the TUI starts.
    let backend = RodioBackend::open(settings.audio.fade_out_ms)
        .context("cannot start audio playback")?;
    let controller = PlaybackController::new(
        backend,
        Arc::clone(&catalog),
        ControllerOptions::from_settings(&settings),
    );

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let run_result: anyhow::Result<()> = (|| {
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let renderer = render::DetachedRenderer::spawn(TerminalRenderer::new(
            terminal,
            Arc::clone(&catalog),
            settings.ui.clone(),
            settings.controls.seek_seconds,
        ))?;

        let (tx, rx) = mpsc::sync_channel::<Command>(settings.controls.queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));
        let input_thread =
            input::spawn_input_thread(tx, Arc::clone(&shutdown), settings.controls.seek_seconds)
                .context("spawning input thread")?;

        let period = Duration::from_secs_f64(1.0 / f64::from(settings.ui.tick_rate_hz.max(1)));
        let mut coordination =
            CoordinationLoop::new(controller, renderer, rx, period, settings.visualizer.columns);
        coordination.run();
        info!(ticks = coordination.ticks(), "coordination loop finished");

        // Dropping the loop closes the command queue as well.
        let (_controller, renderer) = coordination.into_parts();
        shutdown.store(true, Ordering::Relaxed);
        if input_thread.join().is_err() {
            warn!("input thread panicked");
        }

        let dropped = renderer.dropped();
        if renderer.finish().is_none() {
            warn!("render thread panicked");
        }
        info!(dropped_frames = dropped, "renderer finished");
        Ok(())
    })();

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;

    run_result
}
