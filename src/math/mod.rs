mod intersect;
mod projection;

pub use intersect::{ray_triangle, Ray, RayHit};
pub use projection::{view_matrix, CameraState, PerspectiveProjection};
