use anyhow::{Context as _, Result};
use egui::Context as EguiContext;
use glam::Vec2;
use hotspot_assets::{AssetError, ModelAsset};
use hotspot_common::Viewport;
use hotspot_input::{Action, OrbitControls, PointerTracker};
use hotspot_overlay::{
    Hotspot, OverlayError, Presenter, ScreenAnchor, ViewerConfig, ViewerContext,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

const TOOLTIP_ACCENT: egui::Color32 = egui::Color32::from_rgb(0x47, 0xB1, 0xE9);
/// Gap between a hotspot's screen anchor and the tooltip's top-left corner.
const TOOLTIP_OFFSET: egui::Vec2 = egui::vec2(16.0, -16.0);

type LoadResult = Result<ModelAsset, AssetError>;

/// The tooltip panel: holds the shown hotspot while visible.
#[derive(Debug, Default)]
pub struct Tooltip {
    hotspot: Option<Hotspot>,
}

impl Presenter for Tooltip {
    fn show(&mut self, hotspot: &Hotspot) {
        self.hotspot = Some(hotspot.clone());
    }

    fn hide(&mut self) {
        self.hotspot = None;
    }
}

/// Everything the window drives: the viewer context plus input state.
pub struct AppState {
    pub ctx: ViewerContext,
    model_scale: f32,
    orbit: OrbitControls,
    pointer: PointerTracker,
    tooltip: Tooltip,
    anchors: Vec<ScreenAnchor>,
    model_rx: Option<Receiver<LoadResult>>,
    started: Instant,
}

impl AppState {
    pub fn new(config: &ViewerConfig, viewport: Viewport) -> Result<Self> {
        let ctx = ViewerContext::from_config(config, viewport)?;
        let model_rx = match &config.model {
            Some(path) => Some(spawn_loader(path.clone())?),
            None => {
                tracing::warn!("no model configured; hotspot markers will not be attached");
                None
            }
        };
        Ok(Self {
            ctx,
            model_scale: config.model_scale,
            orbit: OrbitControls::new(config.camera.target),
            pointer: PointerTracker::new(),
            tooltip: Tooltip::default(),
            anchors: Vec::new(),
            model_rx,
            started: Instant::now(),
        })
    }

    /// Per-frame work: pick up a finished model load, advance the orbit and
    /// the marker pulse, refresh screen anchors.
    pub fn update(&mut self) {
        self.poll_model();
        self.orbit.update(self.ctx.camera_mut());
        match self.ctx.frame(self.started.elapsed()) {
            Ok(anchors) => self.anchors = anchors,
            Err(e) => tracing::error!("frame update failed: {e}"),
        }
    }

    fn poll_model(&mut self) {
        let Some(rx) = &self.model_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("model loader exited without a result");
                self.model_rx = None;
                return;
            }
        };
        self.model_rx = None;
        match result {
            Ok(model) => {
                if let Err(e) = self.attach(&model) {
                    tracing::error!("failed to attach model: {e:#}");
                }
            }
            // No retry: the overlay stays uninitialized.
            Err(e) => tracing::error!("failed to load model: {e}"),
        }
    }

    fn attach(&mut self, model: &ModelAsset) -> Result<()> {
        let root = self.ctx.scene().root();
        let group = model.instantiate(self.ctx.scene_mut(), root, self.model_scale)?;
        let status = self.ctx.attach_model(group)?;
        tracing::info!("model {} attached ({status:?})", model.name);
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.ctx.set_viewport(viewport);
    }

    pub fn pointer_moved(&mut self, to: Vec2) {
        let action = self.pointer.moved(to);
        self.apply(action);
    }

    pub fn pointer_pressed(&mut self) {
        self.pointer.press();
    }

    pub fn pointer_released(&mut self) {
        let action = self.pointer.release();
        self.apply(action);
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Orbit(delta) => {
                self.orbit
                    .rotate(delta.x, delta.y, self.ctx.viewport().height);
            }
            Action::Pick(at) => match self.ctx.click(at, &mut self.tooltip) {
                Ok(_) => {}
                Err(OverlayError::NotInitialized) => {
                    tracing::debug!("click ignored: model still loading");
                }
                Err(e) => tracing::error!("click failed: {e}"),
            },
            Action::Dismiss => {
                if let Err(e) = self.ctx.dismiss(&mut self.tooltip) {
                    tracing::error!("dismiss failed: {e}");
                }
            }
            Action::Noop => {}
        }
    }

    /// Draw the tooltip next to the active hotspot. `pixels_per_point`
    /// converts physical anchor pixels to egui points.
    pub fn draw_ui(&self, ui_ctx: &EguiContext, pixels_per_point: f32) {
        if self.model_rx.is_some() {
            egui::Area::new(egui::Id::new("loading"))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ui_ctx, |ui| {
                    ui.label("Loading model...");
                });
        }

        let Some(hotspot) = &self.tooltip.hotspot else {
            return;
        };
        let Some(anchor) = self.anchors.iter().find(|a| a.id == hotspot.id) else {
            return;
        };
        let at = egui::pos2(
            anchor.position.x / pixels_per_point,
            anchor.position.y / pixels_per_point,
        );

        let mut see_all = false;
        egui::Window::new(hotspot.name.as_str())
            .id(egui::Id::new(("tooltip", hotspot.id.as_str())))
            .title_bar(false)
            .resizable(false)
            .fixed_pos(at + TOOLTIP_OFFSET)
            .default_width(280.0)
            .show(ui_ctx, |ui| {
                ui.label(
                    egui::RichText::new(&hotspot.name)
                        .size(22.0)
                        .color(TOOLTIP_ACCENT),
                );
                ui.label(hotspot.info.as_str());
                ui.add_space(6.0);
                see_all = ui.button(format!("See All {}", hotspot.name)).clicked();
            });
        if see_all {
            tracing::info!("see all requested for {}", hotspot.name);
        }
    }
}

fn spawn_loader(path: PathBuf) -> Result<Receiver<LoadResult>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            tracing::info!("loading model {}", path.display());
            // The receiver is gone only if the window closed first.
            let _ = tx.send(hotspot_assets::load_gltf(&path));
        })
        .context("failed to spawn model loader thread")?;
    Ok(rx)
}
