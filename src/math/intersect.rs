use glam::Vec3;

const EPSILON: f32 = 1e-6;

/// World-space ray with unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Ray-triangle intersection result. `t` is the ray parameter, `u`/`v` the
/// barycentric coordinates, `normal` the unnormalized face normal.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
    pub normal: Vec3,
}

/// Möller-Trumbore ray-triangle test. Hits both faces; returns `None` for
/// parallel rays and for intersections at or behind the origin.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<RayHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t <= EPSILON {
        return None;
    }

    Some(RayHit {
        t,
        u,
        v,
        normal: edge1.cross(edge2),
    })
}
