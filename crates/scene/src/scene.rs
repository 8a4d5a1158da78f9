use crate::geometry::{Geometry, Ray};
use crate::material::Material;
use glam::{Mat4, Vec3};
use hotspot_common::{Color, HotspotId, Transform};
use std::collections::BTreeMap;

/// Identifier of a node within one scene. Allocated sequentially, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Back-reference from a marker shape to the hotspot it represents.
///
/// The tag does not own the hotspot; the overlay's hotspot list does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTag {
    pub hotspot: HotspotId,
    pub color: Color,
}

/// Renderable payload of a mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
}

/// One entry of the scene hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    tag: Option<MarkerTag>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: String, transform: Transform, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name,
            transform,
            visible: true,
            kind,
            tag: None,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tag(&self) -> Option<&MarkerTag> {
        self.tag.as_ref()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

/// A record of a structural change to the scene.
///
/// Per-frame and per-click state (scale, material, visibility) is not
/// logged, so the log only grows with the node count.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeAdded {
        id: NodeId,
        parent: NodeId,
        name: String,
    },
    ModelAttached {
        id: NodeId,
    },
    Tagged {
        id: NodeId,
        hotspot: HotspotId,
    },
}

/// Errors from scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not a mesh")]
    NotAMesh(NodeId),
}

/// One hit of a ray cast, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

/// The scene graph.
///
/// Nodes are stored in a BTreeMap for deterministic iteration. The root is a
/// group created with the scene. At most one subtree is designated as the
/// loaded model; hotspot markers are only attached once it exists.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    model: Option<NodeId>,
    next_id: u64,
    event_log: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only its root group.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node::new("scene".into(), Transform::default(), NodeKind::Group, None),
        );
        Self {
            nodes,
            root,
            model: None,
            next_id: 1,
            event_log: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Root node of the loaded model, if one has been attached.
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn add_group(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.insert(parent, name.into(), transform, NodeKind::Group)
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        mesh: Mesh,
    ) -> Result<NodeId, SceneError> {
        self.insert(parent, name.into(), transform, NodeKind::Mesh(mesh))
    }

    fn insert(
        &mut self,
        parent: NodeId,
        name: String,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeId, SceneError> {
        let id = NodeId(self.next_id);
        self.nodes
            .get_mut(&parent)
            .ok_or(SceneError::UnknownNode(parent))?
            .children
            .push(id);
        self.next_id += 1;
        self.nodes
            .insert(id, Node::new(name.clone(), transform, kind, Some(parent)));
        self.event_log.push(SceneEvent::NodeAdded { id, parent, name });
        Ok(id)
    }

    /// Designate an existing node as the root of the loaded model.
    pub fn attach_model(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::UnknownNode(id));
        }
        self.model = Some(id);
        self.event_log.push(SceneEvent::ModelAttached { id });
        tracing::debug!("model attached at node {}", id.0);
        Ok(())
    }

    /// Attach a marker tag to a node.
    pub fn tag(&mut self, id: NodeId, tag: MarkerTag) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        self.event_log.push(SceneEvent::Tagged {
            id,
            hotspot: tag.hotspot.clone(),
        });
        node.tag = Some(tag);
        Ok(())
    }

    /// Set a uniform scale, leaving position and rotation untouched.
    ///
    /// Called every frame for animated nodes, so it is not logged.
    pub fn set_scale(&mut self, id: NodeId, scale: f32) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.transform.scale = Vec3::splat(scale);
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.visible = visible;
        Ok(())
    }

    /// Mutate the material of a mesh node in place.
    pub fn update_material(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Material),
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        let NodeKind::Mesh(mesh) = &mut node.kind else {
            return Err(SceneError::NotAMesh(id));
        };
        f(&mut mesh.material);
        Ok(())
    }

    /// Depth-first, pre-order walk starting at `from`.
    pub fn traverse(&self, from: NodeId, mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            visit(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.nodes.get(&cur).ok_or(SceneError::UnknownNode(cur))?;
            matrix = node.transform.to_matrix() * matrix;
            current = node.parent;
        }
        Ok(matrix)
    }

    /// World matrices of every node, computed in one pass from the root.
    pub fn world_matrices(&self) -> BTreeMap<NodeId, Mat4> {
        let mut out = BTreeMap::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let world = parent_world * node.transform.to_matrix();
            out.insert(id, world);
            stack.extend(node.children.iter().map(|c| (*c, world)));
        }
        out
    }

    /// All nodes carrying a marker tag, in id order.
    pub fn tagged_nodes(&self) -> impl Iterator<Item = (NodeId, &MarkerTag)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.tag.as_ref().map(|tag| (*id, tag)))
    }

    /// Intersect `ray` (world space) with every mesh in the scene.
    ///
    /// Hidden meshes are still tested. Results are sorted nearest first; each
    /// mesh contributes at most its nearest hit.
    pub fn raycast(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = self
            .world_matrices()
            .into_iter()
            .filter_map(|(id, world)| {
                let mesh = self.nodes.get(&id)?.mesh()?;
                if world.determinant().abs() < f32::EPSILON * f32::EPSILON {
                    return None;
                }
                let local = ray.transformed(&world.inverse());
                let t = mesh
                    .geometry
                    .intersect(&local, !mesh.material.double_sided)?;
                Some(Intersection {
                    node: id,
                    distance: t,
                    point: ray.at(t),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
