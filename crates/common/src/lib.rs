//! Shared types used by every hotspot viewer crate.

mod types;

pub use types::{Color, ColorParseError, HotspotId, Transform, ViewerId, Viewport};
