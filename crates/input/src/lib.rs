//! Viewer input: raw pointer events become `Action`s, and drags drive a
//! damped orbit camera.
//!
//! # Invariants
//! - A press/release pair only becomes a pick if the pointer stayed within
//!   the click slop; longer drags orbit the camera instead.
//! - Orbit controls never zoom unless explicitly enabled.

pub mod action;
pub mod orbit;
pub mod pointer;

pub use action::Action;
pub use orbit::OrbitControls;
pub use pointer::PointerTracker;

pub fn crate_info() -> &'static str {
    "hotspot-input v0.1.0"
}
