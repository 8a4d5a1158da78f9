//! CPU-side geometry and per-frame draw lists. Nothing here touches the GPU,
//! so it is all unit-testable.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use hotspot_scene::{Blending, Geometry, Material, NodeId, Scene, TriangleMesh};
use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

/// Tessellation of the shared unit sphere used for every sphere geometry.
pub const SPHERE_SEGMENTS: u32 = 32;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    pub fn new(model: Mat4, material: &Material) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: material.rgba(),
        }
    }
}

/// Unit UV sphere. Normals equal positions.
pub fn sphere_mesh(width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let w = width_segments.max(3);
    let h = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    for y in 0..=h {
        let v = y as f32 / h as f32;
        let theta = v * PI;
        for x in 0..=w {
            let u = x as f32 / w as f32;
            let phi = u * TAU;
            let p = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: p.to_array(),
                normal: p.to_array(),
            });
        }
    }

    let row = w + 1;
    let mut indices = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let a = y * row + x + 1;
            let b = y * row + x;
            let c = (y + 1) * row + x;
            let d = (y + 1) * row + x + 1;
            // Pole rows collapse to a point; skip their degenerate halves.
            if y != 0 {
                indices.extend([a, b, d]);
            }
            if y != h - 1 {
                indices.extend([b, c, d]);
            }
        }
    }
    (vertices, indices)
}

/// Line-list indices for every distinct triangle edge.
pub fn wireframe_indices(triangles: &[u32]) -> Vec<u32> {
    let mut edges = BTreeSet::new();
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            edges.insert((a.min(b), a.max(b)));
        }
    }
    edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
}

/// Vertices of an arbitrary triangle mesh with smooth normals.
pub fn mesh_vertices(mesh: &TriangleMesh) -> Vec<Vertex> {
    mesh.positions()
        .iter()
        .zip(mesh.vertex_normals())
        .map(|(p, n)| Vertex {
            position: p.to_array(),
            normal: n.to_array(),
        })
        .collect()
}

/// Everything to draw this frame, bucketed by pipeline.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawList {
    /// Lit triangle meshes, each with its own uploaded buffers.
    pub meshes: Vec<(NodeId, InstanceData)>,
    /// Lit spheres with normal blending.
    pub spheres: Vec<InstanceData>,
    /// Additive translucent spheres (marker fills).
    pub glows: Vec<InstanceData>,
    /// Wireframe spheres (marker outlines).
    pub outlines: Vec<InstanceData>,
}

impl DrawList {
    /// Collect visible meshes. A hidden node hides its whole subtree.
    pub fn build(scene: &Scene) -> Self {
        let worlds = scene.world_matrices();
        let mut hidden = BTreeSet::new();
        let mut list = Self::default();
        scene.traverse(scene.root(), |id, node| {
            if !node.visible || node.parent().is_some_and(|p| hidden.contains(&p)) {
                hidden.insert(id);
                return;
            }
            let (Some(mesh), Some(world)) = (node.mesh(), worlds.get(&id)) else {
                return;
            };
            match &mesh.geometry {
                Geometry::Triangles(_) => list
                    .meshes
                    .push((id, InstanceData::new(*world, &mesh.material))),
                Geometry::Sphere { radius, .. } => {
                    let instance = InstanceData::new(
                        *world * Mat4::from_scale(Vec3::splat(*radius)),
                        &mesh.material,
                    );
                    if mesh.material.wireframe {
                        list.outlines.push(instance);
                    } else if mesh.material.blending == Blending::Additive {
                        list.glows.push(instance);
                    } else {
                        list.spheres.push(instance);
                    }
                }
            }
        });
        list
    }

    pub fn instance_count(&self) -> usize {
        self.meshes.len() + self.spheres.len() + self.glows.len() + self.outlines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_common::{Color, Transform};
    use hotspot_scene::Mesh;

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let (vertices, indices) = sphere_mesh(16, 8);
        assert_eq!(vertices.len(), 17 * 9);
        // two triangles per quad minus one per quad on each pole row
        assert_eq!(indices.len(), 3 * (2 * 16 * 8 - 2 * 16));
        for v in &vertices {
            assert!((Vec3::from_array(v.position).length() - 1.0).abs() < 1e-5);
        }
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn wireframe_dedups_shared_edges() {
        // Two triangles sharing the edge 1-2.
        let lines = wireframe_indices(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(lines.len(), 2 * 5);
        assert_eq!(&lines[..4], [0, 1, 0, 2]);
    }

    #[test]
    fn mesh_vertices_carry_normals() {
        let cube = TriangleMesh::cuboid(Vec3::ONE);
        let vertices = mesh_vertices(&cube);
        assert_eq!(vertices.len(), cube.positions().len());
        for v in vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
            // outward: normal points away from the centre
            assert!(n.dot(Vec3::from_array(v.position)) > 0.0);
        }
    }

    #[test]
    fn draw_list_buckets_by_material() {
        let mut scene = Scene::new();
        let root = scene.root();
        let color = Color(0x47B1E9);
        let sphere = |material| Mesh {
            geometry: Geometry::sphere(0.1, 32),
            material,
        };
        scene
            .add_mesh(
                root,
                "model",
                Transform::default(),
                Mesh {
                    geometry: Geometry::Triangles(TriangleMesh::cuboid(Vec3::ONE)),
                    material: Material::default(),
                },
            )
            .unwrap();
        let fill_mat = Material::basic(color).with_opacity(0.8).additive();
        scene
            .add_mesh(root, "fill", Transform::from_position(Vec3::Y), sphere(fill_mat))
            .unwrap();
        scene
            .add_mesh(
                root,
                "outline",
                Transform::default(),
                sphere(Material::basic(color).wireframe()),
            )
            .unwrap();
        scene
            .add_mesh(root, "ball", Transform::default(), sphere(Material::default()))
            .unwrap();

        let list = DrawList::build(&scene);
        assert_eq!(list.meshes.len(), 1);
        assert_eq!(list.glows.len(), 1);
        assert_eq!(list.outlines.len(), 1);
        assert_eq!(list.spheres.len(), 1);
        assert_eq!(list.instance_count(), 4);

        let glow = list.glows[0];
        assert_eq!(glow.color, color.with_alpha(0.8));
        // radius folded into the instance matrix, translation kept
        assert!((glow.model_0[0] - 0.1).abs() < 1e-6);
        assert_eq!(glow.model_3, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn hidden_group_hides_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_group(root, "markers", Transform::default()).unwrap();
        scene
            .add_mesh(
                group,
                "fill",
                Transform::default(),
                Mesh {
                    geometry: Geometry::sphere(0.1, 8),
                    material: Material::default(),
                },
            )
            .unwrap();
        assert_eq!(DrawList::build(&scene).instance_count(), 1);
        scene.set_visible(group, false).unwrap();
        assert_eq!(DrawList::build(&scene).instance_count(), 0);
    }
}
