use hotspot_common::HotspotId;
use hotspot_scene::SceneError;

/// Errors from overlay operations.
///
/// Everything here is a caller contract violation. A click that hits
/// nothing is not an error; it resolves to `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("hotspot list is empty")]
    EmptyHotspots,
    #[error("duplicate hotspot id {0}")]
    DuplicateHotspot(HotspotId),
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
    #[error("overlay not initialized: markers have not been attached")]
    NotInitialized,
    #[error("marker tagged with hotspot {0} which the overlay does not own")]
    DanglingMarker(HotspotId),
    #[error("unknown hotspot {0}")]
    UnknownHotspot(HotspotId),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}
