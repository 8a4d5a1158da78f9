//! Scene graph: the node hierarchy the model and hotspot markers live in.
//!
//! # Invariants
//! - Node ids are never reused within one scene.
//! - Every node except the root has exactly one parent.
//! - All mutations flow through explicit operations. Structural changes
//!   are logged; per-frame and per-click state is not.
//! - Ray cast results are ordered nearest first.

pub mod geometry;
pub mod material;
pub mod scene;

pub use geometry::{Geometry, Ray, TriangleMesh};
pub use material::{Blending, Material};
pub use scene::{
    Intersection, MarkerTag, Mesh, Node, NodeId, NodeKind, Scene, SceneError, SceneEvent,
};

pub fn crate_info() -> &'static str {
    "hotspot-scene v0.1.0"
}
