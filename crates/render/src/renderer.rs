use crate::camera::PerspectiveCamera;
use hotspot_scene::{Geometry, NodeKind, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface.
///
/// A renderer reads the scene and a camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and camera.
    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Produces an indented, human-readable dump of the scene graph.
///
/// Used for CLI output, logging and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let model = scene
            .model()
            .map(|id| id.0.to_string())
            .unwrap_or_else(|| "none".into());
        let _ = writeln!(
            out,
            "=== Scene (nodes={}, model={model}) ===",
            scene.node_count()
        );
        let (eye, target) = (camera.position, camera.target);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            eye.x, eye.y, eye.z, target.x, target.y, target.z, camera.fov_degrees
        );

        let world = scene.world_matrices();
        scene.traverse(scene.root(), |id, node| {
            let mut depth = 0;
            let mut parent = node.parent();
            while let Some(p) = parent {
                depth += 1;
                parent = scene.get(p).and_then(|n| n.parent());
            }
            let p = world
                .get(&id)
                .map(|m| m.w_axis.truncate())
                .unwrap_or_default();
            let kind = match &node.kind {
                NodeKind::Group => "group".to_string(),
                NodeKind::Mesh(mesh) => match &mesh.geometry {
                    Geometry::Sphere { radius, .. } => format!(
                        "sphere r={radius:.2} {}{}",
                        mesh.material.color,
                        if mesh.material.wireframe { " wire" } else { "" }
                    ),
                    Geometry::Triangles(tris) => format!("mesh tris={}", tris.triangle_count()),
                },
            };
            let tag = node
                .tag()
                .map(|t| format!(" -> {}", t.hotspot))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:indent$}[{}] {} {kind} pos=({:.2}, {:.2}, {:.2}){tag}",
                "",
                id.0,
                node.name,
                p.x,
                p.y,
                p.z,
                indent = depth * 2
            );
        });

        out
    }
}
