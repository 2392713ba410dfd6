use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use crate::playback::Command;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Translate a key press into a command.
pub fn map_key(key: KeyEvent, seek_seconds: u64) -> Option<Command> {
    let seek = seek_seconds as f64;
    let cmd = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            ' ' => Command::PlayPause,
            's' => Command::Stop,
            'n' => Command::Next,
            'p' => Command::Prev,
            'q' => Command::Quit,
            'v' => Command::CycleVisualizerMode,
            'r' => Command::CycleLoopMode,
            '+' | '=' => Command::VolumeUp,
            '-' | '_' => Command::VolumeDown,
            _ => return None,
        },
        KeyCode::Esc => Command::Quit,
        KeyCode::Up => Command::VolumeUp,
        KeyCode::Down => Command::VolumeDown,
        KeyCode::Left => Command::Seek(-seek),
        KeyCode::Right => Command::Seek(seek),
        _ => return None,
    };
    Some(cmd)
}

/// Read terminal key events and forward them as commands until `shutdown`
/// is raised, the queue disconnects or a Quit has been sent.
pub fn spawn_input_thread(
    tx: SyncSender<Command>,
    shutdown: Arc<AtomicBool>,
    seek_seconds: u64,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new().name("input".into()).spawn(move || {
        while !shutdown.load(Ordering::Relaxed) {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(error = %e, "terminal input failed");
                    let _ = tx.send(Command::Quit);
                    return;
                }
            }

            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "terminal input failed");
                    let _ = tx.send(Command::Quit);
                    return;
                }
            };

            let Some(cmd) = map_key(key, seek_seconds) else {
                continue;
            };

            if cmd == Command::Quit {
                // Quit must get through even if the queue is momentarily full.
                let _ = tx.send(cmd);
                return;
            }
            match tx.try_send(cmd) {
                Ok(()) => {}
                Err(TrySendError::Full(cmd)) => warn!(?cmd, "command queue full, key dropped"),
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
        debug!("input thread exiting");
    })
}
