//! Screen-space mapping between pixels, NDC and the scene.
//!
//! Screen Y grows downward while NDC Y grows upward, so the vertical axis is
//! flipped in both directions of the mapping.

use crate::error::OverlayError;
use crate::hotspot::Hotspot;
use glam::{Vec2, Vec3};
use hotspot_common::Viewport;
use hotspot_render::PerspectiveCamera;
use std::time::Duration;

/// Pulse angular speed in radians per millisecond.
const PULSE_RATE: f64 = 0.005;
const PULSE_BASE: f32 = 0.9;
const PULSE_AMPLITUDE: f32 = 0.2;

pub(crate) fn check_viewport(viewport: Viewport) -> Result<(), OverlayError> {
    if viewport.is_valid() {
        Ok(())
    } else {
        Err(OverlayError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

pub fn ndc_to_screen(ndc: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (ndc.y * -0.5 + 0.5) * viewport.height,
    )
}

pub fn screen_to_ndc(pixel: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        pixel.x / viewport.width * 2.0 - 1.0,
        -(pixel.y / viewport.height) * 2.0 + 1.0,
    )
}

/// Pixel position of a hotspot for the given camera and viewport.
///
/// Hotspots behind the camera still produce a coordinate; culling is the
/// caller's business.
pub fn project_to_screen(
    hotspot: &Hotspot,
    camera: &PerspectiveCamera,
    viewport: Viewport,
) -> Result<Vec2, OverlayError> {
    check_viewport(viewport)?;
    let ndc = camera.project(hotspot.position);
    Ok(ndc_to_screen(ndc.truncate(), viewport))
}

/// World point under a pixel at the given NDC depth.
pub fn unproject_from_screen(
    pixel: Vec2,
    ndc_depth: f32,
    camera: &PerspectiveCamera,
    viewport: Viewport,
) -> Result<Vec3, OverlayError> {
    check_viewport(viewport)?;
    Ok(camera.unproject(screen_to_ndc(pixel, viewport).extend(ndc_depth)))
}

/// Marker scale at `elapsed` for a marker with the given phase offset.
///
/// Oscillates between 0.7 and 1.1 roughly every 1.26 seconds.
pub fn pulse_scale(elapsed: Duration, phase: f32) -> f32 {
    let angle = elapsed.as_secs_f64() * 1000.0 * PULSE_RATE + f64::from(phase);
    PULSE_BASE + angle.sin() as f32 * PULSE_AMPLITUDE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ankle() -> Hotspot {
        Hotspot::new("Ankle", "blah blah blah", Vec3::new(0.0, -0.7, -0.3))
    }

    fn camera(viewport: Viewport) -> PerspectiveCamera {
        PerspectiveCamera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 75.0, viewport)
    }

    #[test]
    fn ndc_corners_map_to_screen_corners() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(ndc_to_screen(Vec2::new(-1.0, 1.0), vp), Vec2::ZERO);
        assert_eq!(ndc_to_screen(Vec2::new(1.0, -1.0), vp), Vec2::new(800.0, 600.0));
        assert_eq!(ndc_to_screen(Vec2::ZERO, vp), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn screen_to_ndc_inverts_ndc_to_screen() {
        let vp = Viewport::new(1280.0, 720.0);
        let ndc = Vec2::new(0.25, -0.6);
        let back = screen_to_ndc(ndc_to_screen(ndc, vp), vp);
        assert!((back - ndc).length() < 1e-6);
    }

    #[test]
    fn ankle_projects_below_center() {
        let vp = Viewport::new(800.0, 600.0);
        let p = project_to_screen(&ankle(), &camera(vp), vp).unwrap();
        assert!(vp.contains(p.x, p.y));
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!(p.y > 300.0 && p.y < 450.0);
        // f = 1 / tan(37.5deg); ndc_y = -f * 0.7 / 3.3
        let f = 1.0 / 37.5_f32.to_radians().tan();
        let expected_y = (f * 0.7 / 3.3 * 0.5 + 0.5) * 600.0;
        assert!((p.y - expected_y).abs() < 1e-2);
    }

    #[test]
    fn projection_is_deterministic() {
        let vp = Viewport::new(800.0, 600.0);
        let cam = camera(vp);
        let a = project_to_screen(&ankle(), &cam, vp).unwrap();
        let b = project_to_screen(&ankle(), &cam, vp).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn round_trip_is_colinear_with_camera_ray() {
        let vp = Viewport::new(800.0, 600.0);
        let cam = camera(vp);
        let hotspot = Hotspot::new("Heel", "", Vec3::new(0.4, 0.5, -0.2));
        let pixel = project_to_screen(&hotspot, &cam, vp).unwrap();
        for depth in [-0.5, 0.0, 0.5, 0.9] {
            let p = unproject_from_screen(pixel, depth, &cam, vp).unwrap();
            let to_original = (hotspot.position - cam.position).normalize();
            let to_unprojected = (p - cam.position).normalize();
            assert!(to_original.cross(to_unprojected).length() < 1e-4);
        }
    }

    #[test]
    fn point_behind_camera_still_projects() {
        let vp = Viewport::new(800.0, 600.0);
        let behind = Hotspot::new("Behind", "", Vec3::new(0.2, 0.1, 5.0));
        let p = project_to_screen(&behind, &camera(vp), vp).unwrap();
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn invalid_viewport_is_rejected() {
        let vp = Viewport::new(800.0, 600.0);
        let err = project_to_screen(&ankle(), &camera(vp), Viewport::new(0.0, 600.0)).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidViewport { .. }));
    }

    #[test]
    fn pulse_is_pure_and_bounded() {
        let t = Duration::from_millis(1234);
        assert_eq!(pulse_scale(t, 0.3), pulse_scale(t, 0.3));
        assert!((pulse_scale(Duration::ZERO, 0.0) - 0.9).abs() < 1e-6);
        for ms in (0..5000).step_by(37) {
            let s = pulse_scale(Duration::from_millis(ms), 0.0);
            assert!((0.7 - 1e-6..=1.1 + 1e-6).contains(&s));
        }
    }

    #[test]
    fn pulse_phase_shifts_the_wave() {
        let t = Duration::from_millis(100);
        let quarter = std::f32::consts::FRAC_PI_2;
        // 100ms * 0.005 = 0.5 rad; shifting by pi/2 turns sin into cos.
        assert!((pulse_scale(t, quarter) - (0.9 + 0.5_f32.cos() * 0.2)).abs() < 1e-5);
    }
}
