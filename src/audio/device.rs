use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use crate::library::Track;

use super::source::open_source;
use super::types::{AudioBackend, BackendUnavailable, LoadError, SeekUnsupported};

/// rodio-backed transport.
///
/// The `OutputStream` is opened, kept alive and dropped on a dedicated
/// `audio-device` thread; this handle only holds the stream's mixer and the
/// sink of the loaded track. Stopping a playing sink fades it out on a short
/// lived thread so the caller never waits for the ramp.
pub struct RodioBackend {
    mixer: Mixer,
    sink: Option<Sink>,
    volume: f32,
    fade_out_ms: u64,
    faders: Faders,
    close_tx: Option<Sender<()>>,
    device_thread: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Open the default output device. Blocks until the device thread reports
    /// readiness or failure.
    pub fn open(fade_out_ms: u64) -> Result<Self, BackendUnavailable> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<Mixer, String>>();
        let (close_tx, close_rx) = mpsc::channel::<()>();

        let device_thread = thread::Builder::new()
            .name("audio-device".into())
            .spawn(move || match OutputStreamBuilder::open_default_stream() {
                Ok(mut stream) => {
                    // rodio logs to stderr when OutputStream is dropped, which
                    // would scribble over the TUI.
                    stream.log_on_drop(false);
                    if ready_tx.send(Ok(stream.mixer().clone())).is_err() {
                        return;
                    }
                    // Park until close() or until the backend is dropped.
                    let _ = close_rx.recv();
                    debug!("closing audio output stream");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| BackendUnavailable(format!("cannot spawn audio thread: {e}")))?;

        let ready = ready_rx
            .recv()
            .map_err(|_| BackendUnavailable("audio thread exited during startup".into()))
            .and_then(|r| r.map_err(BackendUnavailable));

        match ready {
            Ok(mixer) => {
                info!("audio output device opened");
                Ok(Self {
                    mixer,
                    sink: None,
                    volume: 1.0,
                    fade_out_ms,
                    faders: Faders::default(),
                    close_tx: Some(close_tx),
                    device_thread: Some(device_thread),
                })
            }
            Err(e) => {
                let _ = device_thread.join();
                Err(e)
            }
        }
    }
}

impl AudioBackend for RodioBackend {
    fn load(&mut self, track: &Track) -> Result<(), LoadError> {
        let source = open_source(&track.path)?;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
    }

    fn resume(&mut self) {
        self.play();
    }

    fn stop(&mut self) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        if self.fade_out_ms == 0 || sink.is_paused() {
            sink.stop();
            return;
        }

        let (from, fade_out_ms) = (self.volume, self.fade_out_ms);
        if let Err(e) = self.faders.spawn(move || {
            fade_out_sink(&sink, from, fade_out_ms);
            sink.stop();
        }) {
            warn!(error = %e, "cannot spawn fade thread, sink dropped without fade");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(volume);
        }
    }

    fn query_position(&self) -> Option<f64> {
        self.sink.as_ref().map(|s| s.get_pos().as_secs_f64())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn seek(&mut self, position: f64) -> Result<(), SeekUnsupported> {
        let Some(sink) = self.sink.as_ref() else {
            return Ok(());
        };
        sink.try_seek(Duration::from_secs_f64(position.max(0.0)))
            .map_err(|e| {
                debug!(error = %e, "sink refused seek");
                SeekUnsupported
            })
    }

    fn close(&mut self) {
        self.stop();
        self.faders.join_all();

        // Dropping the sender wakes the device thread as well.
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.device_thread.take() {
            if handle.join().is_err() {
                warn!("audio device thread panicked");
            }
        }
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Ramp `sink` from `from` down to silence over `fade_out_ms`.
fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

/// Fade threads still ramping down old sinks.
///
/// Spawning never waits on earlier fades; finished threads are reaped on the
/// next spawn and the rest are joined by `join_all`.
#[derive(Default)]
struct Faders {
    handles: Vec<JoinHandle<()>>,
}

impl Faders {
    fn spawn(&mut self, fade: impl FnOnce() + Send + 'static) -> std::io::Result<()> {
        self.reap();
        let handle = thread::Builder::new().name("audio-fade".into()).spawn(fade)?;
        self.handles.push(handle);
        Ok(())
    }

    fn reap(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(JoinHandle::is_finished);
        self.handles = running;
        for handle in done {
            if handle.join().is_err() {
                warn!("fade thread panicked");
            }
        }
    }

    fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("fade thread panicked");
            }
        }
    }
}
