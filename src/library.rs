//! Music library: directory scanning and the read-only track catalog.
//!
//! The catalog is built once at startup and never mutated afterwards, so the
//! playback core can refer to tracks by index for the whole process lifetime.

mod display;
mod model;
mod scan;

pub use display::display_from_fields;
pub use model::{Catalog, Track};
pub use scan::scan;
