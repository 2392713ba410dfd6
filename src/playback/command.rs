/// User intent delivered to the controller through the command queue.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    /// Pause when playing, play otherwise.
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in seconds (negative rewinds).
    Seek(f64),
    VolumeUp,
    VolumeDown,
    CycleVisualizerMode,
    CycleLoopMode,
    Quit,
}
