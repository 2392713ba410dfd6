use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::AudioBackend;
use crate::playback::{Command, PlaybackController};
use crate::ui::{DisplayMetadata, Renderer};
use crate::visualizer::{FrameRequest, compose};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Fixed-rate scheduler tying input, playback, visualizer and renderer
/// together. Owns the controller, so it is the only place playback state
/// changes.
pub struct CoordinationLoop<B: AudioBackend, R: Renderer> {
    controller: PlaybackController<B>,
    renderer: R,
    commands: Receiver<Command>,
    period: Duration,
    /// Width of composed frames; renderers resample to their own size.
    columns: usize,
    ticks: u64,
    terminated: bool,
}

impl<B: AudioBackend, R: Renderer> CoordinationLoop<B, R> {
    pub fn new(
        controller: PlaybackController<B>,
        renderer: R,
        commands: Receiver<Command>,
        period: Duration,
        columns: usize,
    ) -> Self {
        Self {
            controller,
            renderer,
            commands,
            period: period.max(Duration::from_millis(1)),
            columns,
            ticks: 0,
            terminated: false,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &PlaybackController<B> {
        &self.controller
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One iteration: drain commands, refresh playback, compose and render.
    ///
    /// A `Quit` (or a disconnected command queue) finishes the current tick,
    /// then shuts the controller down; every later call is a no-op returning
    /// [`LoopState::Terminated`].
    pub fn tick(&mut self, dt: Duration) -> LoopState {
        if self.terminated {
            return LoopState::Terminated;
        }

        let quit = self.drain_commands();

        self.controller.refresh(dt);
        let state = self.controller.snapshot();

        let frame = compose(&FrameRequest {
            mode: state.mode,
            activity: state.status,
            elapsed: state.elapsed,
            seed: self.controller.current_track().map_or(0, |t| t.seed),
            width: self.columns,
        });
        let meta = DisplayMetadata::new(state, self.controller.catalog());

        if let Err(e) = self.renderer.render(&frame, &meta) {
            warn!(error = %e, "render failed");
        }
        self.ticks += 1;

        if quit {
            info!(ticks = self.ticks, "quit requested");
            self.controller.shutdown();
            self.terminated = true;
            return LoopState::Terminated;
        }
        LoopState::Running
    }

    /// Apply queued commands in arrival order. Returns true on Quit.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Quit) => return true,
                Ok(cmd) => self.controller.apply(cmd),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    debug!("command queue disconnected");
                    return true;
                }
            }
        }
    }

    /// Tick at the configured rate until terminated. Missed deadlines are
    /// skipped rather than caught up in a burst.
    pub fn run(&mut self) {
        let mut last = Instant::now();
        let mut deadline = last + self.period;

        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(last);
            last = now;

            if self.tick(dt) == LoopState::Terminated {
                return;
            }

            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
                deadline += self.period;
            } else {
                let behind = now.saturating_duration_since(deadline);
                let missed = (behind.as_nanos() / self.period.as_nanos()) as u32 + 1;
                debug!(missed, "tick deadline missed");
                deadline += self.period * missed;
            }
        }
    }

    pub fn into_parts(self) -> (PlaybackController<B>, R) {
        (self.controller, self.renderer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc::{self, Sender};

    use anyhow::bail;

    use super::*;
    use crate::audio::fake::{Call, FakeBackend};
    use crate::library::{Catalog, Track};
    use crate::playback::{ControllerOptions, Status};
    use crate::visualizer::{IDLE_CAPTION, VisualFrame};

    const TICK: Duration = Duration::from_millis(50);

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(VisualFrame, DisplayMetadata)>,
        fail: bool,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, frame: &VisualFrame, meta: &DisplayMetadata) -> anyhow::Result<()> {
            self.frames.push((frame.clone(), meta.clone()));
            if self.fail {
                bail!("terminal went away");
            }
            Ok(())
        }
    }

    type TestLoop = CoordinationLoop<FakeBackend, RecordingRenderer>;

    fn setup(n: usize, renderer: RecordingRenderer) -> (TestLoop, Sender<Command>) {
        let catalog = Arc::new(Catalog::new(
            (0..n)
                .map(|i| {
                    let mut t = Track::untagged(format!("/music/{i}.mp3"), format!("t{i}"));
                    t.duration = Some(Duration::from_secs(180));
                    t
                })
                .collect(),
        ));
        let controller =
            PlaybackController::new(FakeBackend::new(), catalog, ControllerOptions::default());
        let (tx, rx) = mpsc::channel();
        (CoordinationLoop::new(controller, renderer, rx, TICK, 32), tx)
    }

    fn last_meta(lp: &TestLoop) -> &DisplayMetadata {
        &lp.renderer().frames.last().unwrap().1
    }

    #[test]
    fn applies_all_pending_commands_in_order_within_one_tick() {
        let (mut lp, tx) = setup(4, RecordingRenderer::default());
        tx.send(Command::Play).unwrap();
        tx.send(Command::Next).unwrap();
        tx.send(Command::Next).unwrap();
        tx.send(Command::Prev).unwrap();

        assert_eq!(lp.tick(TICK), LoopState::Running);
        assert_eq!(lp.renderer().frames.len(), 1);
        assert_eq!(last_meta(&lp).state.current, Some(1));
        assert_eq!(last_meta(&lp).track.as_ref().map(|t| t.title.as_str()), Some("t1"));
    }

    #[test]
    fn quit_discards_later_commands_and_shuts_down() {
        let (mut lp, tx) = setup(3, RecordingRenderer::default());
        tx.send(Command::Play).unwrap();
        tx.send(Command::Quit).unwrap();
        tx.send(Command::Next).unwrap();

        assert_eq!(lp.tick(TICK), LoopState::Terminated);
        // The quit tick is still rendered with the pre-shutdown state.
        assert_eq!(last_meta(&lp).state.current, Some(0));

        let calls = lp.controller().backend().transport();
        assert_eq!(&calls[calls.len() - 2..], &[Call::Stop, Call::Close]);
        assert_eq!(lp.controller().snapshot().status, Status::Stopped);

        assert_eq!(lp.tick(TICK), LoopState::Terminated);
        assert_eq!(lp.renderer().frames.len(), 1);
    }

    #[test]
    fn disconnected_queue_counts_as_quit() {
        let (mut lp, tx) = setup(1, RecordingRenderer::default());
        tx.send(Command::Play).unwrap();
        drop(tx);

        assert_eq!(lp.tick(TICK), LoopState::Terminated);
        assert!(lp.controller().backend().calls.contains(&Call::Close));
    }

    #[test]
    fn renderer_errors_do_not_stop_the_loop() {
        let (mut lp, _tx) = setup(1, RecordingRenderer {
            fail: true,
            ..RecordingRenderer::default()
        });
        for _ in 0..3 {
            assert_eq!(lp.tick(TICK), LoopState::Running);
        }
        assert_eq!(lp.ticks(), 3);
    }

    #[test]
    fn idle_frames_while_stopped() {
        let (mut lp, _tx) = setup(2, RecordingRenderer::default());
        lp.tick(TICK);
        let (frame, meta) = lp.renderer().frames.last().unwrap();
        assert!(frame.idle);
        assert_eq!(frame.caption, IDLE_CAPTION);
        assert_eq!(frame.columns.len(), 32);
        assert_eq!(meta.track, None);
        assert_eq!(meta.track_count, 2);
    }

    #[test]
    fn end_of_track_advances_before_rendering() {
        let (mut lp, tx) = setup(3, RecordingRenderer::default());
        tx.send(Command::Play).unwrap();
        lp.tick(TICK);
        assert_eq!(last_meta(&lp).state.current, Some(0));

        // No backend position, so the free-running clock runs past the end.
        lp.tick(Duration::from_secs(200));
        let meta = last_meta(&lp);
        assert_eq!(meta.state.current, Some(1));
        assert_eq!(meta.state.elapsed, 0.0);
    }

    #[test]
    fn frames_follow_the_current_track_seed() {
        let (mut lp, tx) = setup(2, RecordingRenderer::default());
        tx.send(Command::Play).unwrap();
        lp.tick(TICK);
        tx.send(Command::Next).unwrap();
        lp.tick(TICK);

        let frames = &lp.renderer().frames;
        assert!(!frames[0].0.idle);
        assert_ne!(frames[0].0.columns, frames[1].0.columns);
    }

    #[test]
    fn run_returns_after_quit() {
        let (mut lp, tx) = setup(2, RecordingRenderer::default());
        lp.period = Duration::from_millis(1);
        tx.send(Command::Play).unwrap();
        tx.send(Command::Quit).unwrap();
        lp.run();
        assert_eq!(lp.ticks(), 1);
        assert!(lp.controller().backend().calls.contains(&Call::Close));
    }
}
