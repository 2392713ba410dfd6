use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, anyhow};
use tracing::warn;

use crate::ui::{DisplayMetadata, Renderer};
use crate::visualizer::VisualFrame;

type Job = (VisualFrame, DisplayMetadata);

/// Runs a [`Renderer`] on its own thread. `render` never waits: when the
/// render thread is still busy with the previous frame the new one is
/// dropped and counted.
pub struct DetachedRenderer<R> {
    tx: Option<SyncSender<Job>>,
    handle: Option<JoinHandle<R>>,
    dropped: u64,
}

impl<R: Renderer + Send + 'static> DetachedRenderer<R> {
    pub fn spawn(mut inner: R) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<Job>(1);
        let handle = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                for (frame, meta) in rx {
                    if let Err(e) = inner.render(&frame, &meta) {
                        warn!(error = %e, "render failed");
                    }
                }
                inner
            })
            .context("spawning render thread")?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            dropped: 0,
        })
    }

    /// Frames discarded because the render thread was busy.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Let the render thread drain the queued frame, join it and hand back
    /// the inner renderer. `None` if the render thread panicked.
    pub fn finish(mut self) -> Option<R> {
        self.tx.take();
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl<R> Renderer for DetachedRenderer<R> {
    fn render(&mut self, frame: &VisualFrame, meta: &DisplayMetadata) -> anyhow::Result<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(anyhow!("render thread already finished"));
        };
        match tx.try_send((frame.clone(), meta.clone())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(anyhow!("render thread exited")),
        }
    }
}

impl<R> Drop for DetachedRenderer<R> {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::Receiver;

    use super::*;
    use crate::library::Catalog;
    use crate::playback::{PlaybackState, Status, VisualizerMode};
    use crate::visualizer::{FrameRequest, compose};

    fn frame(elapsed: f64) -> (VisualFrame, DisplayMetadata) {
        let state = PlaybackState {
            elapsed,
            ..PlaybackState::default()
        };
        let frame = compose(&FrameRequest {
            mode: VisualizerMode::Bars,
            activity: Status::Playing,
            elapsed,
            seed: 1,
            width: 8,
        });
        (frame, DisplayMetadata::new(state, &Catalog::default()))
    }

    struct Gated {
        gate: Receiver<()>,
        seen: Vec<f64>,
        count: Arc<AtomicUsize>,
    }

    impl Renderer for Gated {
        fn render(&mut self, _frame: &VisualFrame, meta: &DisplayMetadata) -> anyhow::Result<()> {
            let _ = self.gate.recv();
            self.seen.push(meta.state.elapsed);
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn busy_render_thread_drops_frames_without_blocking() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let mut detached = DetachedRenderer::spawn(Gated {
            gate: gate_rx,
            seen: Vec::new(),
            count: Arc::clone(&count),
        })
        .unwrap();

        for i in 0..5 {
            let (f, m) = frame(i as f64);
            detached.render(&f, &m).unwrap();
        }
        // At most one frame is being rendered and one is queued.
        assert!(detached.dropped() >= 3);
        let dropped = detached.dropped();

        drop(gate_tx);
        let inner = detached.finish().unwrap();
        assert_eq!(inner.seen.len() as u64, 5 - dropped);
        assert_eq!(inner.seen.first(), Some(&0.0));
        assert!(inner.seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(count.load(Ordering::SeqCst), inner.seen.len());
    }

    struct Failing;

    impl Renderer for Failing {
        fn render(&mut self, _: &VisualFrame, _: &DisplayMetadata) -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        }
    }

    #[test]
    fn inner_errors_stay_on_the_render_thread() {
        let mut detached = DetachedRenderer::spawn(Failing).unwrap();
        let (f, m) = frame(0.0);
        assert!(detached.render(&f, &m).is_ok());
        assert!(detached.finish().is_some());
    }
}
