//! One viewer instance: scene, camera, viewport and overlay bundled together.
//!
//! Nothing here is global. Several contexts can live side by side without
//! sharing state.

use crate::config::ViewerConfig;
use crate::error::OverlayError;
use crate::overlay::{HotspotOverlay, InitStatus, Presenter, ScreenAnchor};
use glam::Vec2;
use hotspot_common::{HotspotId, ViewerId, Viewport};
use hotspot_render::PerspectiveCamera;
use hotspot_scene::{NodeId, Scene};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ViewerContext {
    id: ViewerId,
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: Viewport,
    overlay: HotspotOverlay,
}

impl ViewerContext {
    pub fn new(
        overlay: HotspotOverlay,
        camera: PerspectiveCamera,
        viewport: Viewport,
    ) -> Result<Self, OverlayError> {
        crate::projection::check_viewport(viewport)?;
        Ok(Self {
            id: ViewerId::new(),
            scene: Scene::new(),
            camera,
            viewport,
            overlay,
        })
    }

    pub fn from_config(config: &ViewerConfig, viewport: Viewport) -> Result<Self, OverlayError> {
        let overlay = HotspotOverlay::new(config.hotspots(), config.markers)?;
        Self::new(overlay, config.camera.to_camera(viewport), viewport)
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resize. Invalid sizes (a minimized window) are ignored.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            tracing::debug!(
                "ignoring viewport {}x{}",
                viewport.width,
                viewport.height
            );
            return;
        }
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn overlay(&self) -> &HotspotOverlay {
        &self.overlay
    }

    /// Mark `model` as the loaded model and attach the hotspot markers.
    pub fn attach_model(&mut self, model: NodeId) -> Result<InitStatus, OverlayError> {
        self.scene.attach_model(model)?;
        self.initialize()
    }

    pub fn initialize(&mut self) -> Result<InitStatus, OverlayError> {
        self.overlay.initialize(&mut self.scene)
    }

    /// Resolve a click and apply the resulting selection. A click on nothing
    /// clears the selection.
    pub fn click(
        &mut self,
        pointer: Vec2,
        presenter: &mut impl Presenter,
    ) -> Result<Option<HotspotId>, OverlayError> {
        let span = tracing::debug_span!("click", viewer = %self.id);
        let _enter = span.enter();

        let selected = self
            .overlay
            .handle_click(pointer, self.viewport, &self.camera, &self.scene)?
            .map(|h| h.id.clone());
        self.overlay
            .on_selection(selected.clone(), &mut self.scene, presenter)?;
        Ok(selected)
    }

    /// Clear the selection.
    pub fn dismiss(&mut self, presenter: &mut impl Presenter) -> Result<(), OverlayError> {
        self.overlay.on_selection(None, &mut self.scene, presenter)
    }

    /// Advance marker animation and return this frame's screen anchors.
    /// Scene events since the previous frame are drained to the trace log.
    ///
    /// Before the markers are attached there is nothing to animate, but the
    /// anchors are still computed.
    pub fn frame(&mut self, elapsed: Duration) -> Result<Vec<ScreenAnchor>, OverlayError> {
        for event in self.scene.drain_events() {
            tracing::trace!(viewer = %self.id, "scene {event:?}");
        }
        self.overlay.tick(&mut self.scene, elapsed)?;
        self.overlay.screen_anchors(&self.camera, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::Hotspot;
    use crate::projection::project_to_screen;
    use hotspot_common::Transform;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl Presenter for Log {
        fn show(&mut self, hotspot: &Hotspot) {
            self.0.push(format!("show {}", hotspot.name));
        }

        fn hide(&mut self) {
            self.0.push("hide".into());
        }
    }

    fn loaded(config: &ViewerConfig) -> ViewerContext {
        let mut ctx = ViewerContext::from_config(config, Viewport::new(800.0, 600.0)).unwrap();
        let root = ctx.scene().root();
        let model = ctx
            .scene_mut()
            .add_group(root, "model", Transform::from_scale(config.model_scale))
            .unwrap();
        assert_eq!(ctx.attach_model(model).unwrap(), InitStatus::Attached);
        ctx
    }

    #[test]
    fn from_config_rejects_invalid_viewport() {
        let err = ViewerContext::from_config(&ViewerConfig::default(), Viewport::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, OverlayError::InvalidViewport { .. }));
    }

    #[test]
    fn click_before_model_is_not_initialized() {
        let mut ctx =
            ViewerContext::from_config(&ViewerConfig::default(), Viewport::new(800.0, 600.0))
                .unwrap();
        assert_eq!(ctx.initialize().unwrap(), InitStatus::Deferred);
        let err = ctx
            .click(Vec2::new(400.0, 300.0), &mut Log::default())
            .unwrap_err();
        assert!(matches!(err, OverlayError::NotInitialized));
    }

    #[test]
    fn click_ankle_then_sky() {
        let mut ctx = loaded(&ViewerConfig::default());
        let ankle = ctx.overlay().hotspots()[0].clone();
        let pixel = project_to_screen(&ankle, ctx.camera(), ctx.viewport()).unwrap();
        let mut log = Log::default();

        let selected = ctx.click(pixel, &mut log).unwrap();
        assert_eq!(selected, Some(HotspotId::new("ankle")));
        assert_eq!(ctx.overlay().active().unwrap().name, "Ankle");

        let selected = ctx.click(Vec2::new(5.0, 5.0), &mut log).unwrap();
        assert!(selected.is_none());
        assert!(ctx.overlay().active().is_none());
        assert_eq!(log.0, ["show Ankle", "hide"]);
    }

    #[test]
    fn frame_returns_anchor_per_hotspot() {
        let mut ctx = loaded(&ViewerConfig::default());
        let anchors = ctx.frame(Duration::from_millis(16)).unwrap();
        assert_eq!(anchors.len(), 3);
        assert!(anchors
            .iter()
            .all(|a| ctx.viewport().contains(a.position.x, a.position.y)));
    }

    #[test]
    fn repeated_clicks_do_not_grow_the_event_log() {
        let mut ctx = loaded(&ViewerConfig::default());
        let structural = ctx.scene().events().len();
        let ankle = ctx.overlay().hotspots()[0].clone();
        let pixel = project_to_screen(&ankle, ctx.camera(), ctx.viewport()).unwrap();
        let mut log = Log::default();

        for _ in 0..1_000 {
            ctx.click(Vec2::new(5.0, 5.0), &mut log).unwrap();
            ctx.click(pixel, &mut log).unwrap();
        }
        assert_eq!(ctx.scene().events().len(), structural);

        ctx.frame(Duration::from_millis(16)).unwrap();
        assert!(ctx.scene().events().is_empty());
        ctx.click(pixel, &mut log).unwrap();
        ctx.frame(Duration::from_millis(32)).unwrap();
        assert!(ctx.scene().events().is_empty());
    }

    #[test]
    fn set_viewport_updates_camera_and_ignores_zero() {
        let mut ctx = loaded(&ViewerConfig::default());
        ctx.set_viewport(Viewport::new(1000.0, 500.0));
        assert_eq!(ctx.camera().aspect, 2.0);
        ctx.set_viewport(Viewport::new(0.0, 0.0));
        assert_eq!(ctx.viewport(), Viewport::new(1000.0, 500.0));
    }

    #[test]
    fn contexts_are_independent() {
        let mut a = loaded(&ViewerConfig::default());
        let b = loaded(&ViewerConfig::default());
        assert_ne!(a.id(), b.id());

        let ankle = a.overlay().hotspots()[0].clone();
        let pixel = project_to_screen(&ankle, a.camera(), a.viewport()).unwrap();
        a.click(pixel, &mut Log::default()).unwrap();
        a.camera_mut().position.x = 1.0;

        assert!(a.overlay().active().is_some());
        assert!(b.overlay().active().is_none());
        assert_eq!(b.camera().position.x, 0.0);
    }
}
