use glam::Vec3;
use hotspot_common::{Color, HotspotId};
use serde::{Deserialize, Serialize};

/// A named anchor point with descriptive text.
///
/// Immutable once created. Highlight color and pulse scale are derived per
/// frame and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: HotspotId,
    pub name: String,
    pub info: String,
    /// Anchor position in scene space. Markers hang under the scene root,
    /// so the model's scale does not apply.
    pub position: Vec3,
    /// Marker tint; the marker style's default color when absent.
    pub color: Option<Color>,
    /// Pulse animation phase offset in radians.
    pub phase: f32,
}

impl Hotspot {
    /// Create a hotspot whose id is derived from its name.
    pub fn new(name: impl Into<String>, info: impl Into<String>, position: Vec3) -> Self {
        let name = name.into();
        Self {
            id: HotspotId::new(slug(&name)),
            name,
            info: info.into(),
            position,
            color: None,
            phase: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = HotspotId::new(id);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }
}

/// Lowercase ASCII alphanumerics, with every other run of characters
/// collapsed to a single `-`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_derived_from_name() {
        let h = Hotspot::new("Ankle Conditions", "info", Vec3::ZERO);
        assert_eq!(h.id.as_str(), "ankle-conditions");
        assert!(h.color.is_none());
        assert_eq!(h.phase, 0.0);
    }

    #[test]
    fn builder_overrides() {
        let h = Hotspot::new("Heel", "", Vec3::Y)
            .with_id("heel-1")
            .with_color(Color(0xFF0000))
            .with_phase(1.5);
        assert_eq!(h.id.as_str(), "heel-1");
        assert_eq!(h.color, Some(Color(0xFF0000)));
        assert_eq!(h.phase, 1.5);
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slug("  Heel -- Conditions! "), "heel-conditions");
        assert_eq!(slug("Ankle"), "ankle");
        assert_eq!(slug("???"), "");
    }
}
