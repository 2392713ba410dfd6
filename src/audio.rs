//! Audio backend interface and its rodio implementation.
//!
//! The playback controller only talks to the [`AudioBackend`] trait. The
//! rodio backend keeps the output device on its own thread and exposes
//! non-blocking sink operations to the caller.

mod device;
mod source;
mod types;

#[cfg(test)]
pub mod fake;

pub use device::RodioBackend;
pub use types::{AudioBackend, LoadError, SeekUnsupported};

#[cfg(test)]
mod tests;
