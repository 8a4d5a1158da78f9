//! Rendering Adapter: camera projection and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Projection uses the OpenGL clip convention (NDC depth in [-1, 1]).
//!
//! The GPU backend lives in `hotspot-render-wgpu`. The debug text renderer
//! here backs the CLI and tests.

mod camera;
mod renderer;

pub use camera::PerspectiveCamera;
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "hotspot-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
