use glam::{Mat4, Vec3};

/// Determinant threshold below which a triangle is treated as parallel to the ray.
const DET_EPSILON: f32 = 1e-12;

/// A half-line `origin + t * direction` for `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray with a normalized direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by `m` without renormalizing the direction, so that a
    /// parameter `t` found in the transformed space is the same `t` here.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }

    /// Shortest distance from `point` to the ray's supporting line.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let to_point = point - self.origin;
        to_point.cross(self.direction).length() / self.direction.length()
    }
}

/// Smallest `t >= 0` at which the ray meets a sphere of `radius` centered at `center`.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.length_squared();
    let half_b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = half_b * half_b - a * c;
    if a == 0.0 || disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = (-half_b - sq) / a;
    let far = (-half_b + sq) / a;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

/// Möller–Trumbore ray/triangle test. Triangles wind counter-clockwise when
/// seen from the front; back faces are rejected when `cull_back` is set.
pub fn ray_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3, cull_back: bool) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if cull_back {
        if det < DET_EPSILON {
            return None;
        }
    } else if det.abs() < DET_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Indexed triangle soup with a precomputed bounding sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds_center: Vec3,
    bounds_radius: f32,
}

impl TriangleMesh {
    /// Build a mesh from positions and triangle indices. Returns `None` if the
    /// index count is not a multiple of three or an index is out of range.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Option<Self> {
        if indices.len() % 3 != 0 || indices.iter().any(|&i| i as usize >= positions.len()) {
            return None;
        }
        let (bounds_center, bounds_radius) = bounding_sphere(&positions);
        Some(Self {
            positions,
            indices,
            bounds_center,
            bounds_radius,
        })
    }

    /// Build a non-indexed mesh where every three positions form a triangle.
    /// A trailing partial triangle is ignored.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let count = (positions.len() / 3 * 3) as u32;
        let indices = (0..count).collect();
        let (bounds_center, bounds_radius) = bounding_sphere(&positions);
        Self {
            positions,
            indices,
            bounds_center,
            bounds_radius,
        }
    }

    /// Axis-aligned box centered at the origin, faces wound outward.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        #[rustfmt::skip]
        let positions = vec![
            Vec3::new(-h.x, -h.y,  h.z), Vec3::new( h.x, -h.y,  h.z),
            Vec3::new( h.x,  h.y,  h.z), Vec3::new(-h.x,  h.y,  h.z),
            Vec3::new(-h.x, -h.y, -h.z), Vec3::new( h.x, -h.y, -h.z),
            Vec3::new( h.x,  h.y, -h.z), Vec3::new(-h.x,  h.y, -h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0, // +Z
            5, 4, 7, 7, 6, 5, // -Z
            1, 5, 6, 6, 2, 1, // +X
            4, 0, 3, 3, 7, 4, // -X
            3, 2, 6, 6, 7, 3, // +Y
            4, 5, 1, 1, 0, 4, // -Y
        ];
        let (bounds_center, bounds_radius) = bounding_sphere(&positions);
        Self {
            positions,
            indices,
            bounds_center,
            bounds_radius,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    /// Area-weighted smooth normals, one per position.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let n = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect()
    }

    /// Nearest hit parameter along `ray`, in the mesh's own space.
    pub fn intersect(&self, ray: &Ray, cull_back: bool) -> Option<f32> {
        ray_sphere(ray, self.bounds_center, self.bounds_radius)?;
        self.triangles()
            .filter_map(|[a, b, c]| ray_triangle(ray, a, b, c, cull_back))
            .min_by(f32::total_cmp)
    }
}

fn bounding_sphere(positions: &[Vec3]) -> (Vec3, f32) {
    if positions.is_empty() {
        return (Vec3::ZERO, 0.0);
    }
    let (min, max) = positions
        .iter()
        .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    let center = (min + max) * 0.5;
    let radius = positions
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0_f32, f32::max);
    (center, radius)
}

/// Shape of a mesh in its local space.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Sphere centered at the local origin. Segment counts only matter for
    /// tessellation; intersection is analytic.
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Triangles(TriangleMesh),
}

impl Geometry {
    pub fn sphere(radius: f32, segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments: segments,
            height_segments: segments,
        }
    }

    /// Nearest hit parameter along a ray expressed in local space.
    pub fn intersect(&self, ray: &Ray, cull_back: bool) -> Option<f32> {
        match self {
            Self::Sphere { radius, .. } => ray_sphere(ray, Vec3::ZERO, *radius),
            Self::Triangles(mesh) => mesh.intersect(ray, cull_back),
        }
    }
}
