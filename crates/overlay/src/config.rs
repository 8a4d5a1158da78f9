//! Viewer configuration: model, camera, marker style and the static hotspot
//! list, loaded from YAML.
//!
//! Every field has a default, so an empty document is a valid configuration
//! that reproduces the foot viewer.

use crate::hotspot::{Hotspot, slug};
use glam::Vec3;
use hotspot_common::{Color, HotspotId, Viewport};
use hotspot_render::PerspectiveCamera;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker tint used when a hotspot has no color of its own.
pub const DEFAULT_MARKER_COLOR: Color = Color::from_hex(0x47B1E9);

/// Errors from loading or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// glTF model to load, relative to the config file's directory.
    pub model: Option<PathBuf>,
    /// Uniform scale applied to the loaded model.
    pub model_scale: f32,
    pub camera: CameraConfig,
    pub markers: MarkerStyle,
    pub hotspots: Vec<HotspotConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: Some(PathBuf::from("models/foot/scene.gltf")),
            model_scale: 0.5,
            camera: CameraConfig::default(),
            markers: MarkerStyle::default(),
            hotspots: default_hotspots(),
        }
    }
}

impl ViewerConfig {
    /// Load a configuration file. A relative `model` path is resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(model) = config.model.take() {
            config.model = Some(match path.parent() {
                Some(dir) if model.is_relative() => dir.join(model),
                _ => model,
            });
        }
        tracing::debug!(
            "loaded config {} with {} hotspots",
            path.display(),
            config.hotspots.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The hotspot list in configuration order.
    pub fn hotspots(&self) -> Vec<Hotspot> {
        self.hotspots.iter().map(HotspotConfig::to_hotspot).collect()
    }
}

/// Initial camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = PerspectiveCamera::default();
        Self {
            position: camera.position,
            target: camera.target,
            fov_degrees: camera.fov_degrees,
            near: camera.near,
            far: camera.far,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self, viewport: Viewport) -> PerspectiveCamera {
        PerspectiveCamera {
            near: self.near,
            far: self.far,
            ..PerspectiveCamera::new(self.position, self.target, self.fov_degrees, viewport)
        }
    }
}

/// Look of the marker shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub radius: f32,
    pub outline_radius: f32,
    pub segments: u32,
    pub default_color: Color,
    pub fill_opacity: f32,
    pub outline_opacity: f32,
    pub highlight_color: Color,
    pub highlight_opacity: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 0.1,
            outline_radius: 0.12,
            segments: 32,
            default_color: DEFAULT_MARKER_COLOR,
            fill_opacity: 0.8,
            outline_opacity: 0.5,
            highlight_color: Color::WHITE,
            highlight_opacity: 1.0,
        }
    }
}

/// One hotspot entry. `id` defaults to a slug of `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HotspotId>,
    pub name: String,
    #[serde(default)]
    pub info: String,
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub phase: f32,
}

impl HotspotConfig {
    pub fn to_hotspot(&self) -> Hotspot {
        Hotspot {
            id: self
                .id
                .clone()
                .unwrap_or_else(|| HotspotId::new(slug(&self.name))),
            name: self.name.clone(),
            info: self.info.clone(),
            position: self.position,
            color: self.color,
            phase: self.phase,
        }
    }
}

fn default_hotspots() -> Vec<HotspotConfig> {
    let entry = |name: &str, info: &str, position: Vec3| HotspotConfig {
        id: None,
        name: name.into(),
        info: info.into(),
        position,
        color: None,
        phase: 0.0,
    };
    vec![
        entry("Ankle", "blah blah blah", Vec3::new(0.0, -0.7, -0.3)),
        entry(
            "Ankle Conditions",
            "We treat ankle conditions such as sprains and fractures, sinus tarsi syndrome, \
             ankle arthritis, posterior tibial tendon dysfunction, tarsal coalition, total ankle \
             joint replacement, Achilles tendon ruptures, anterior tibial tendonitis, peroneal \
             tendonitis, and chronic Achilles tendinosis. The best ankle surgeon in Los Angeles \
             is here to help you!",
            Vec3::new(0.0, -0.2, 0.2),
        ),
        entry(
            "Heel Conditions",
            "We address plantar fasciitis, Achilles tendonitis, general heel pain, chronic \
             Achilles tendinosis, retrocalcaneal exostosis (heel spurs), and tarsal tunnel \
             syndrome. If you’re looking for the best foot surgeon in Los Angeles or the best \
             Achilles tendonitis treatment in Los Angeles, we have you covered!",
            Vec3::new(0.0, 0.5, -0.2),
        ),
    ]
}
