//! Model loading: glTF 2.0 documents into scene-ready triangle meshes.
//!
//! Models are identified by a content hash of their file bytes. Loading is
//! independent of any scene; [`ModelAsset::instantiate`] places a loaded
//! model into one.
//!
//! # Scope
//! `.gltf` and `.glb` files read through the `gltf` crate: triangle-list
//! primitives with `POSITION` data, optional indices, base color factor and
//! the double-sided flag. Buffers come from the GLB blob, data URIs, or
//! files next to the document.
//!
//! # Invariants
//! - Accessor ranges are bounds-checked before any read, so a malformed
//!   file yields an `AssetError`, never a panic.

mod model;

pub use model::{ModelAsset, ModelNode, ModelPrimitive, load_gltf, parse_gltf};

use hotspot_scene::SceneError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed model ID: the first 8 bytes of the SHA-256 of the
/// glTF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid model: {0}")]
    Invalid(String),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

pub fn crate_info() -> &'static str {
    "hotspot-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use glam::Vec3;
    use hotspot_common::{Color, Transform};
    use hotspot_scene::{NodeKind, Ray, Scene};
    use serde_json::json;

    /// One triangle in the z=0 plane facing +z, plus u16 indices padded to 4 bytes.
    fn triangle_buffer() -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [[-1.0f32, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    fn triangle_doc(uri: &str, len: usize) -> serde_json::Value {
        json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "name": "root", "children": [1], "scale": [2.0, 2.0, 2.0] },
                { "name": "sole", "mesh": 0, "translation": [0.0, 0.0, -1.0] }
            ],
            "meshes": [{
                "name": "foot",
                "primitives": [{
                    "attributes": { "POSITION": 0 },
                    "indices": 1,
                    "material": 0
                }]
            }],
            "materials": [{
                "name": "skin",
                "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.5, 0.0, 1.0] },
                "doubleSided": true
            }],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "buffers": [{ "uri": uri, "byteLength": len }]
        })
    }

    fn embedded() -> Vec<u8> {
        let buffer = triangle_buffer();
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        );
        serde_json::to_vec(&triangle_doc(&uri, buffer.len())).unwrap()
    }

    #[test]
    fn parses_embedded_buffer() {
        let model = parse_gltf(&embedded(), None, "foot").unwrap();
        assert_eq!(model.roots, [0]);
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[0].transform.scale, Vec3::splat(2.0));
        assert_eq!(model.nodes[1].transform.position, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(model.triangle_count(), 1);

        let primitive = model.primitives().next().unwrap();
        assert_eq!(primitive.name, "foot/0:skin");
        assert_eq!(primitive.mesh.indices(), [0, 1, 2]);
        assert_eq!(primitive.material.color, Color(0xFF8000));
        assert!(primitive.material.double_sided);
    }

    #[test]
    fn loads_external_bin_next_to_document() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = triangle_buffer();
        std::fs::write(dir.path().join("foot.bin"), &buffer).unwrap();
        let doc = triangle_doc("foot.bin", buffer.len());
        let path = dir.path().join("scene.gltf");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let model = load_gltf(&path).unwrap();
        assert_eq!(model.name, "scene");
        assert_eq!(model.triangle_count(), 1);
    }

    /// Binary glTF container: JSON chunk then BIN chunk, each 4-byte aligned.
    fn glb(doc: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
        let mut json = serde_json::to_vec(doc).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    fn doc_bytes(doc: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(doc).unwrap()
    }

    #[test]
    fn content_id_tracks_file_bytes() {
        let a = parse_gltf(&embedded(), None, "a").unwrap();
        let b = parse_gltf(&embedded(), None, "b").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.to_string().len(), 16);

        let empty = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "empty" }]
        });
        let c = parse_gltf(&doc_bytes(&empty), None, "c").unwrap();
        assert_ne!(a.id, c.id);
        assert_eq!(c.triangle_count(), 0);
    }

    #[test]
    fn missing_bin_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        let doc = triangle_doc("missing.bin", 44);
        std::fs::write(&path, doc_bytes(&doc)).unwrap();
        assert!(matches!(load_gltf(&path), Err(AssetError::Gltf(_))));
        assert!(matches!(
            load_gltf(dir.path().join("absent.gltf")),
            Err(AssetError::Io(_))
        ));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            parse_gltf(b"{ not json", None, "x"),
            Err(AssetError::Gltf(_))
        ));

        let doc = triangle_doc("data:application/octet-stream;base64,@@@", 44);
        assert!(matches!(
            parse_gltf(&doc_bytes(&doc), None, "x"),
            Err(AssetError::Gltf(_))
        ));

        let buffer = triangle_buffer();
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        );
        let mut doc = triangle_doc(&uri, buffer.len());
        doc["accessors"][0]["count"] = json!(30);
        assert!(matches!(
            parse_gltf(&doc_bytes(&doc), None, "x"),
            Err(AssetError::Invalid(msg)) if msg.contains("outside")
        ));

        let mut doc = triangle_doc(&uri, buffer.len());
        doc["nodes"][1]["children"] = json!([0]);
        assert!(matches!(
            parse_gltf(&doc_bytes(&doc), None, "x"),
            Err(AssetError::Invalid(_) | AssetError::Gltf(_))
        ));
    }

    #[test]
    fn huge_accessor_count_is_an_error() {
        let buffer = triangle_buffer();
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        );
        for count in [(1u64 << 62) + 1, u64::MAX / 2] {
            let mut doc = triangle_doc(&uri, buffer.len());
            doc["accessors"][0]["count"] = json!(count);
            assert!(matches!(
                parse_gltf(&doc_bytes(&doc), None, "x"),
                Err(AssetError::Invalid(_) | AssetError::Gltf(_))
            ));

            let mut doc = triangle_doc(&uri, buffer.len());
            doc["accessors"][1]["count"] = json!(count);
            assert!(parse_gltf(&doc_bytes(&doc), None, "x").is_err());
        }

        let mut doc = triangle_doc(&uri, buffer.len());
        doc["bufferViews"][0]["byteOffset"] = json!(u64::MAX / 2);
        assert!(parse_gltf(&doc_bytes(&doc), None, "x").is_err());
    }

    #[test]
    fn loads_binary_gltf() {
        let buffer = triangle_buffer();
        let mut doc = triangle_doc("unused", buffer.len());
        doc["buffers"] = json!([{ "byteLength": buffer.len() }]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foot.glb");
        std::fs::write(&path, glb(&doc, &buffer)).unwrap();

        let model = load_gltf(&path).unwrap();
        assert_eq!(model.name, "foot");
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.primitives().next().unwrap().name, "foot/0:skin");
    }

    #[test]
    fn truncated_binary_gltf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.glb");
        std::fs::write(&path, b"glTF\x02\x00\x00\x00").unwrap();
        assert!(matches!(load_gltf(&path), Err(AssetError::Gltf(_))));
    }

    #[test]
    fn instantiate_places_pickable_meshes() {
        let model = parse_gltf(&embedded(), None, "foot").unwrap();
        let mut scene = Scene::new();
        let root = scene.root();
        let group = model.instantiate(&mut scene, root, 0.5).unwrap();
        scene.attach_model(group).unwrap();

        assert_eq!(scene.get(group).unwrap().transform, Transform::from_scale(0.5));
        // scene root, model group, two nodes, one primitive
        assert_eq!(scene.node_count(), 5);
        let mesh = scene.find_by_name("foot/0:skin").unwrap();
        assert!(matches!(scene.get(mesh).unwrap().kind, NodeKind::Mesh(_)));

        // 0.5 * 2.0 scale, sole sits at z = 0.5 * 2.0 * -1.0 = -1.0
        let hits = scene.raycast(&Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 4.0).abs() < 1e-5);
    }
}
