use glam::{Mat4, Vec2, Vec3};
use hotspot_common::Viewport;
use hotspot_scene::Ray;

/// Perspective camera looking from `position` at `target`.
///
/// Camera state lives outside the scene graph; orbit controls move it and
/// the overlay reads it to project and pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, target: Vec3, fov_degrees: f32, viewport: Viewport) -> Self {
        Self {
            position,
            target,
            fov_degrees,
            aspect: viewport.aspect(),
            ..Self::default()
        }
    }

    /// Match the aspect ratio to a resized viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            tracing::debug!(
                "camera keeps aspect {} for viewport {}x{}",
                self.aspect,
                viewport.width,
                viewport.height
            );
            return;
        }
        self.aspect = viewport.aspect();
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to normalized device coordinates.
    ///
    /// Points behind the camera still yield finite but meaningless values.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_projection().project_point3(world)
    }

    /// Normalized device coordinates back to a world point.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// Ray from the camera through a point on the screen in NDC.
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let on_screen = self.unproject(ndc.extend(0.5));
        let ray = Ray::new(self.position, on_screen - self.position);
        tracing::trace!(
            "ray through ndc ({:.3}, {:.3}): origin {} direction {}",
            ndc.x,
            ndc.y,
            ray.origin,
            ray.direction
        );
        ray
    }
}
