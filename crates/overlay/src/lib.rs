//! Hotspot Overlay: named 3D anchor points made visible and clickable.
//!
//! The overlay attaches a pair of marker shapes per hotspot to the scene,
//! projects every hotspot to screen space each frame, resolves clicks to the
//! nearest hit along the camera ray, and drives a presentation layer through
//! the [`Presenter`] trait.
//!
//! # Invariants
//! - Exactly two marker visuals per hotspot once initialized.
//! - Every marker tag resolves to a hotspot owned by the overlay.
//! - The active selection is empty or a hotspot the overlay owns.
//! - Only the nearest surface along a click ray counts; occluded markers
//!   are never selected.

pub mod config;
pub mod context;
pub mod error;
pub mod hotspot;
pub mod overlay;
pub mod projection;

pub use config::{CameraConfig, ConfigError, HotspotConfig, MarkerStyle, ViewerConfig};
pub use context::ViewerContext;
pub use error::OverlayError;
pub use hotspot::Hotspot;
pub use overlay::{HotspotOverlay, InitStatus, MarkerKind, MarkerVisual, Presenter, ScreenAnchor};
pub use projection::{ndc_to_screen, project_to_screen, pulse_scale, screen_to_ndc, unproject_from_screen};

pub fn crate_info() -> &'static str {
    "hotspot-overlay v0.1.0"
}
