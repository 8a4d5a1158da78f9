use crate::config::MarkerStyle;
use crate::error::OverlayError;
use crate::hotspot::Hotspot;
use crate::projection::{self, check_viewport};
use glam::Vec2;
use hotspot_common::{Color, HotspotId, Transform, Viewport};
use hotspot_render::PerspectiveCamera;
use hotspot_scene::{Geometry, MarkerTag, Material, Mesh, NodeId, Scene};
use std::collections::BTreeSet;
use std::time::Duration;

/// Name of the group node holding every marker.
pub const MARKER_GROUP_NAME: &str = "hotspots";

/// Presentation layer for the active hotspot (a tooltip panel, a console,
/// a test recorder).
pub trait Presenter {
    /// Display the hotspot's name and info and become visible.
    fn show(&mut self, hotspot: &Hotspot);
    /// Become hidden.
    fn hide(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    /// Translucent filled sphere; pulses and highlights.
    Fill,
    /// Slightly larger wireframe sphere around the fill.
    Outline,
}

/// One marker shape in the scene and the base look it resets to.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerVisual {
    pub hotspot: HotspotId,
    pub kind: MarkerKind,
    pub node: NodeId,
    pub base_color: Color,
    pub base_opacity: f32,
    pub phase: f32,
}

/// Result of [`HotspotOverlay::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Markers were created under a new group node.
    Attached,
    /// No model in the scene yet; nothing was created. Retry after loading.
    Deferred,
    /// Markers already exist; nothing was created.
    AlreadyAttached,
}

/// Per-frame screen position of a hotspot, matched to UI elements by id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenAnchor {
    pub id: HotspotId,
    pub position: Vec2,
}

/// Owns the hotspot list, the marker visuals placed for it, and the
/// current selection.
#[derive(Debug, Clone)]
pub struct HotspotOverlay {
    hotspots: Vec<Hotspot>,
    style: MarkerStyle,
    group: Option<NodeId>,
    markers: Vec<MarkerVisual>,
    active: Option<HotspotId>,
}

impl HotspotOverlay {
    /// Create an overlay for a non-empty list of hotspots with unique ids.
    pub fn new(hotspots: Vec<Hotspot>, style: MarkerStyle) -> Result<Self, OverlayError> {
        if hotspots.is_empty() {
            return Err(OverlayError::EmptyHotspots);
        }
        let mut seen = BTreeSet::new();
        for h in &hotspots {
            if !seen.insert(&h.id) {
                return Err(OverlayError::DuplicateHotspot(h.id.clone()));
            }
        }
        Ok(Self {
            hotspots,
            style,
            group: None,
            markers: Vec::new(),
            active: None,
        })
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn hotspot(&self, id: &HotspotId) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| &h.id == id)
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    pub fn markers(&self) -> &[MarkerVisual] {
        &self.markers
    }

    /// Group node holding the markers, once initialized.
    pub fn group(&self) -> Option<NodeId> {
        self.group
    }

    pub fn is_initialized(&self) -> bool {
        self.group.is_some()
    }

    /// The currently selected hotspot.
    pub fn active(&self) -> Option<&Hotspot> {
        self.active.as_ref().and_then(|id| self.hotspot(id))
    }

    /// Attach a fill and an outline marker for every hotspot under a new
    /// `hotspots` group at the scene root.
    ///
    /// Does nothing until the scene has a model attached; call again once
    /// it has.
    pub fn initialize(&mut self, scene: &mut Scene) -> Result<InitStatus, OverlayError> {
        if self.group.is_some() {
            tracing::warn!("hotspot markers already attached; ignoring initialize");
            return Ok(InitStatus::AlreadyAttached);
        }
        if scene.model().is_none() {
            tracing::debug!("model not attached yet; deferring hotspot markers");
            return Ok(InitStatus::Deferred);
        }

        let group = scene.add_group(scene.root(), MARKER_GROUP_NAME, Transform::default())?;
        let style = self.style;
        let mut markers = Vec::with_capacity(self.hotspots.len() * 2);
        for hotspot in &self.hotspots {
            let color = hotspot.color.unwrap_or(style.default_color);
            let shapes = [
                (
                    MarkerKind::Fill,
                    style.radius,
                    Material::basic(color)
                        .with_opacity(style.fill_opacity)
                        .additive(),
                ),
                (
                    MarkerKind::Outline,
                    style.outline_radius,
                    Material::basic(color)
                        .with_opacity(style.outline_opacity)
                        .wireframe(),
                ),
            ];
            for (kind, radius, material) in shapes {
                let suffix = match kind {
                    MarkerKind::Fill => "fill",
                    MarkerKind::Outline => "outline",
                };
                let node = scene.add_mesh(
                    group,
                    format!("{}-{suffix}", hotspot.id),
                    Transform::from_position(hotspot.position),
                    Mesh {
                        geometry: Geometry::sphere(radius, style.segments),
                        material,
                    },
                )?;
                scene.tag(
                    node,
                    MarkerTag {
                        hotspot: hotspot.id.clone(),
                        color,
                    },
                )?;
                markers.push(MarkerVisual {
                    hotspot: hotspot.id.clone(),
                    kind,
                    node,
                    base_color: color,
                    base_opacity: material.opacity,
                    phase: hotspot.phase,
                });
            }
        }

        tracing::info!(
            "attached {} markers for {} hotspots",
            markers.len(),
            self.hotspots.len()
        );
        self.group = Some(group);
        self.markers = markers;
        Ok(InitStatus::Attached)
    }

    /// Screen position of every hotspot, in hotspot order.
    pub fn screen_anchors(
        &self,
        camera: &PerspectiveCamera,
        viewport: Viewport,
    ) -> Result<Vec<ScreenAnchor>, OverlayError> {
        self.hotspots
            .iter()
            .map(|h| {
                Ok(ScreenAnchor {
                    id: h.id.clone(),
                    position: projection::project_to_screen(h, camera, viewport)?,
                })
            })
            .collect()
    }

    /// Resolve a click at `pointer` (pixels) to a hotspot.
    ///
    /// Only the nearest surface along the camera ray counts: if it belongs
    /// to anything other than a marker, the click selects nothing even when
    /// a marker lies further along the ray.
    pub fn handle_click(
        &self,
        pointer: Vec2,
        viewport: Viewport,
        camera: &PerspectiveCamera,
        scene: &Scene,
    ) -> Result<Option<&Hotspot>, OverlayError> {
        if !self.is_initialized() {
            return Err(OverlayError::NotInitialized);
        }
        check_viewport(viewport)?;

        let ray = camera.ray_through(projection::screen_to_ndc(pointer, viewport));
        let hits = scene.raycast(&ray);
        let Some(nearest) = hits.first() else {
            tracing::debug!("click at ({:.0}, {:.0}) hit nothing", pointer.x, pointer.y);
            return Ok(None);
        };
        let Some(tag) = scene.get(nearest.node).and_then(|n| n.tag()) else {
            tracing::debug!(
                "click at ({:.0}, {:.0}) hit non-marker node {} at {:.3}",
                pointer.x,
                pointer.y,
                nearest.node.0,
                nearest.distance
            );
            return Ok(None);
        };
        let hotspot = self
            .hotspot(&tag.hotspot)
            .ok_or_else(|| OverlayError::DanglingMarker(tag.hotspot.clone()))?;
        tracing::debug!("hotspot clicked: {}", hotspot.name);
        Ok(Some(hotspot))
    }

    /// Apply a selection: show the hotspot and highlight its marker, or
    /// hide the presentation and reset every marker to its base look.
    pub fn on_selection(
        &mut self,
        selected: Option<HotspotId>,
        scene: &mut Scene,
        presenter: &mut impl Presenter,
    ) -> Result<(), OverlayError> {
        let Some(id) = selected else {
            self.reset_markers(scene)?;
            self.active = None;
            presenter.hide();
            return Ok(());
        };
        let hotspot = self
            .hotspot(&id)
            .ok_or_else(|| OverlayError::UnknownHotspot(id.clone()))?;

        self.reset_markers(scene)?;
        let style = self.style;
        for marker in self
            .markers
            .iter()
            .filter(|m| m.hotspot == id && m.kind == MarkerKind::Fill)
        {
            scene.update_material(marker.node, |m| {
                m.color = style.highlight_color;
                m.opacity = style.highlight_opacity;
            })?;
        }
        presenter.show(hotspot);
        self.active = Some(id);
        Ok(())
    }

    /// Restore every marker's base color and opacity.
    pub fn reset_markers(&self, scene: &mut Scene) -> Result<(), OverlayError> {
        for marker in &self.markers {
            scene.update_material(marker.node, |m| {
                m.color = marker.base_color;
                m.opacity = marker.base_opacity;
            })?;
        }
        Ok(())
    }

    /// Per-frame animation: scale each fill marker by its pulse.
    pub fn tick(&self, scene: &mut Scene, elapsed: Duration) -> Result<(), OverlayError> {
        for marker in self.markers.iter().filter(|m| m.kind == MarkerKind::Fill) {
            scene.set_scale(marker.node, projection::pulse_scale(elapsed, marker.phase))?;
        }
        Ok(())
    }
}
