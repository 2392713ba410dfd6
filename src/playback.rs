//! Playback core: the authoritative playback state and the controller that
//! owns it.
//!
//! The controller is the only writer of [`PlaybackState`]; everything else
//! works on copies obtained through [`PlaybackController::snapshot`].

mod command;
mod controller;
mod state;

pub use command::Command;
pub use controller::{ControllerOptions, PlaybackController};
pub use state::{Fault, LoopMode, PlaybackState, Status, VisualizerMode};
