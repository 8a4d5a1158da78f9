use glam::Vec3;
use hotspot_render::PerspectiveCamera;
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle away from the poles where the up vector degenerates.
const POLE_EPSILON: f32 = 1e-3;

/// Orbit camera controller with optional damping.
///
/// Drags accumulate a spherical delta; each `update` applies a fraction of
/// it to the camera and decays the rest, giving the eased rotation the
/// viewer expects. Camera motion sits outside the overlay: the overlay only
/// reads the resulting camera.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            enable_zoom: false,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Queue a rotation for a pointer drag of `(dx, dy)` pixels. A drag the
    /// full height of the viewport turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Queue a dolly step. Ignored while zoom is disabled.
    pub fn zoom(&mut self, wheel_steps: f32) {
        if !self.enable_zoom {
            return;
        }
        self.scale *= 0.95_f32.powf(wheel_steps * self.zoom_speed);
    }

    /// True while queued motion is still being applied.
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > 1e-6 || self.delta_phi.abs() > 1e-6
    }

    /// Apply queued motion to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi = (phi + self.delta_phi * step).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance.max(f32::EPSILON), self.max_distance);

        let sin_phi = phi.sin();
        let new_position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        let moved = new_position.distance_squared(camera.position) > 1e-12;
        camera.position = new_position;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_without_input_keeps_camera() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        let before = cam.position;
        assert!(!controls.update(&mut cam));
        assert!((cam.position - before).length() < 1e-5);
    }

    #[test]
    fn drag_rotates_around_target_at_fixed_distance() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut cam = PerspectiveCamera::default();
        controls.rotate(150.0, 0.0, 600.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - 3.0).abs() < 1e-4);
        // A quarter turn to the left moves the camera from +Z to -X.
        assert!((cam.position - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-3);
        assert!(!controls.is_moving());
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        controls.rotate(60.0, 0.0, 600.0);
        controls.update(&mut cam);
        let first = cam.position;
        assert!(controls.is_moving());
        for _ in 0..500 {
            controls.update(&mut cam);
        }
        assert!(!controls.is_moving());
        assert!((first - cam.position).length() > 1e-3);
        assert!((cam.position.length() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn vertical_drag_is_clamped_at_pole() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut cam = PerspectiveCamera::default();
        controls.rotate(0.0, 10_000.0, 600.0);
        controls.update(&mut cam);
        assert!(cam.position.y > 2.99);
        assert!(cam.position.is_finite());
    }

    #[test]
    fn zoom_is_disabled_by_default() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut cam = PerspectiveCamera::default();
        controls.zoom(10.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 3.0).abs() < 1e-5);

        controls.enable_zoom = true;
        controls.zoom(10.0);
        controls.update(&mut cam);
        assert!(cam.position.length() < 3.0);
    }
}
