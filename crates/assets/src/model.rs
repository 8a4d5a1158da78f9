use crate::{AssetError, AssetId};
use glam::{Quat, Vec3};
use gltf::Gltf;
use gltf::buffer::Data;
use gltf::mesh::Mode;
use hotspot_common::{Color, Transform};
use hotspot_scene::{Geometry, Material, Mesh, NodeId, Scene, TriangleMesh};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

/// One drawable piece of a model node.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrimitive {
    pub name: String,
    pub mesh: TriangleMesh,
    pub material: Material,
}

/// A node of the model hierarchy. Children index into [`ModelAsset::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    pub primitives: Vec<ModelPrimitive>,
    pub children: Vec<usize>,
}

/// A loaded model, independent of any scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    /// Content hash of the glTF file.
    pub id: AssetId,
    pub name: String,
    pub nodes: Vec<ModelNode>,
    /// Top-level nodes of the default scene.
    pub roots: Vec<usize>,
}

/// Load a `.gltf` or `.glb` file and every buffer it references.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<ModelAsset, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();
    let model = parse_gltf(&bytes, path.parent(), name)?;
    tracing::info!(
        "loaded model {} ({}): {} nodes, {} triangles",
        path.display(),
        model.id,
        model.nodes.len(),
        model.triangle_count()
    );
    Ok(model)
}

/// Parse glTF JSON or binary glTF. Relative buffer URIs are resolved
/// against `base_dir`; without one only embedded buffers load.
pub fn parse_gltf(
    bytes: &[u8],
    base_dir: Option<&Path>,
    name: impl Into<String>,
) -> Result<ModelAsset, AssetError> {
    let Gltf { document, blob } = Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)?;

    let nodes = document
        .nodes()
        .map(|node| {
            let primitives = match node.mesh() {
                Some(mesh) => read_mesh(&mesh, &buffers)?,
                None => Vec::new(),
            };
            let (translation, rotation, scale) = node.transform().decomposed();
            Ok(ModelNode {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node{}", node.index())),
                transform: Transform {
                    position: Vec3::from_array(translation),
                    rotation: Quat::from_array(rotation),
                    scale: Vec3::from_array(scale),
                },
                primitives,
                children: node.children().map(|c| c.index()).collect(),
            })
        })
        .collect::<Result<Vec<_>, AssetError>>()?;

    let roots: Vec<usize> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => {
            // No scene list: every node that is nobody's child is a root.
            let children: BTreeSet<usize> =
                nodes.iter().flat_map(|n| n.children.iter().copied()).collect();
            (0..nodes.len()).filter(|i| !children.contains(i)).collect()
        }
    };
    check_hierarchy(&nodes, &roots)?;

    Ok(ModelAsset {
        id: content_id(bytes),
        name: name.into(),
        nodes,
        roots,
    })
}

fn content_id(bytes: &[u8]) -> AssetId {
    let digest = Sha256::digest(bytes);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[Data]) -> Result<Vec<ModelPrimitive>, AssetError> {
    let mesh_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));

    let mut out = Vec::new();
    for (p, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != Mode::Triangles {
            tracing::warn!(
                "{mesh_name}: skipping primitive {p} with mode {:?}",
                primitive.mode()
            );
            continue;
        }
        let position = primitive.get(&gltf::Semantic::Positions).ok_or_else(|| {
            AssetError::Invalid(format!("{mesh_name}: primitive {p} has no POSITION"))
        })?;
        check_accessor(&position, buffers)?;
        if let Some(indices) = primitive.indices() {
            check_accessor(&indices, buffers)?;
        }

        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| {
                AssetError::Invalid(format!("{mesh_name}: primitive {p} positions are unreadable"))
            })?
            .map(Vec3::from_array)
            .collect();
        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let triangles = TriangleMesh::new(positions, indices).ok_or_else(|| {
            AssetError::Invalid(format!(
                "{mesh_name}: primitive {p} has indices out of range or not a multiple of 3"
            ))
        })?;

        let material = primitive.material();
        let name = match material.name() {
            Some(material_name) => format!("{mesh_name}/{p}:{material_name}"),
            None => format!("{mesh_name}/{p}"),
        };
        out.push(ModelPrimitive {
            name,
            mesh: triangles,
            material: to_material(&material),
        });
    }
    Ok(out)
}

/// Every element an accessor addresses must lie inside its view, and the
/// view inside its buffer. Counts and offsets come straight from the file,
/// so all arithmetic is checked.
fn check_accessor(accessor: &gltf::Accessor<'_>, buffers: &[Data]) -> Result<(), AssetError> {
    let index = accessor.index();
    let outside = || AssetError::Invalid(format!("accessor {index} reads outside its buffer"));
    let view = accessor
        .view()
        .ok_or_else(|| AssetError::Invalid(format!("accessor {index} has no buffer view")))?;
    let buffer_len = buffers.get(view.buffer().index()).map_or(0, |data| data.0.len());
    let view_end = view.offset().checked_add(view.length()).ok_or_else(outside)?;
    if view_end > buffer_len {
        return Err(outside());
    }

    let count = accessor.count();
    if count == 0 {
        return Err(AssetError::Invalid(format!("accessor {index} is empty")));
    }
    let element = accessor.size();
    let stride = view.stride().unwrap_or(element);
    let needed = stride
        .checked_mul(count - 1)
        .and_then(|n| n.checked_add(element))
        .and_then(|n| n.checked_add(accessor.offset()))
        .ok_or_else(outside)?;
    if needed > view.length() {
        return Err(outside());
    }
    Ok(())
}

fn to_material(def: &gltf::Material<'_>) -> Material {
    let [r, g, b, a] = def.pbr_metallic_roughness().base_color_factor();
    let material = Material::basic(Color::from_rgb([r, g, b])).with_opacity(a);
    if def.double_sided() {
        material.double_sided()
    } else {
        material
    }
}

/// Reject hierarchies where a node is reachable twice (shared or cyclic).
fn check_hierarchy(nodes: &[ModelNode], roots: &[usize]) -> Result<(), AssetError> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(i) = stack.pop() {
        let node = nodes
            .get(i)
            .ok_or_else(|| AssetError::Invalid(format!("scene references missing node {i}")))?;
        if !seen.insert(i) {
            return Err(AssetError::Invalid(format!(
                "node {i} appears more than once in the hierarchy"
            )));
        }
        stack.extend(&node.children);
    }
    Ok(())
}

impl ModelAsset {
    pub fn triangle_count(&self) -> usize {
        self.primitives().map(|p| p.mesh.triangle_count()).sum()
    }

    pub fn primitives(&self) -> impl Iterator<Item = &ModelPrimitive> {
        self.nodes.iter().flat_map(|n| n.primitives.iter())
    }

    /// Add the model to `scene` under a new group scaled by `scale`, and
    /// return that group. The caller decides whether it becomes the scene's
    /// model root.
    pub fn instantiate(
        &self,
        scene: &mut Scene,
        parent: NodeId,
        scale: f32,
    ) -> Result<NodeId, AssetError> {
        let group = scene.add_group(parent, self.name.clone(), Transform::from_scale(scale))?;
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&r| (r, group)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            let id = scene.add_group(parent, node.name.clone(), node.transform)?;
            for primitive in &node.primitives {
                scene.add_mesh(
                    id,
                    primitive.name.clone(),
                    Transform::default(),
                    Mesh {
                        geometry: Geometry::Triangles(primitive.mesh.clone()),
                        material: primitive.material,
                    },
                )?;
            }
            stack.extend(node.children.iter().rev().map(|&c| (c, id)));
        }
        tracing::debug!("instantiated model {} at node {}", self.name, group.0);
        Ok(group)
    }
}
