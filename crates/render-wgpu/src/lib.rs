//! wgpu render backend for the hotspot viewer.
//!
//! Draws the loaded model lit by one directional light plus ambient, the
//! marker fills as additive translucent spheres and the marker outlines as
//! wireframe spheres, over a transparent background.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Cameras use OpenGL clip depth; the conversion to wgpu depth happens here.
//! - Every sphere geometry shares one unit sphere mesh scaled per instance.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{Lighting, WgpuRenderer};
pub use mesh::{DrawList, InstanceData, Vertex, mesh_vertices, sphere_mesh, wireframe_indices};
