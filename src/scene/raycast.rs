use glam::{Vec2, Vec3};

use crate::math::{ray_triangle, CameraState, Ray};
use crate::traits::SharedInstance;

struct RayTarget {
    owner: String,
    instance: SharedInstance,
}

/// Camera-ray intersection over the ray-castable scene meshes.
///
/// Targets are registered by the coordinator when their owner joins the
/// scene and dropped with `remove_owner`. Visibility does not matter here;
/// an invisible collision proxy is a legitimate target.
pub struct RayCaster {
    targets: Vec<RayTarget>,
}

impl RayCaster {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    pub fn add(&mut self, owner: &str, instance: SharedInstance) {
        self.targets.push(RayTarget {
            owner: owner.to_string(),
            instance,
        });
    }

    pub fn remove_owner(&mut self, owner: &str) {
        self.targets.retain(|target| target.owner != owner);
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Nearest world-space hit of the camera ray through a raster coordinate.
    pub fn cast(&self, raster: Vec2, camera: &CameraState) -> Option<Vec3> {
        self.cast_ray(&camera.ray_through_raster(raster))
    }

    /// Nearest world-space hit of an arbitrary ray across all targets.
    pub fn cast_ray(&self, ray: &Ray) -> Option<Vec3> {
        let mut nearest: Option<f32> = None;
        for target in &self.targets {
            let instance = target.instance.borrow();
            let transform = instance.transform;
            for tri in 0..instance.mesh.triangle_count() {
                let (a, b, c) = instance.mesh.triangle(tri);
                let hit = ray_triangle(
                    ray,
                    transform.transform_point3(a),
                    transform.transform_point3(b),
                    transform.transform_point3(c),
                );
                if let Some(hit) = hit {
                    if nearest.is_none_or(|t| hit.t < t) {
                        nearest = Some(hit.t);
                    }
                }
            }
        }
        nearest.map(|t| ray.at(t))
    }
}

impl Default for RayCaster {
    fn default() -> Self {
        Self::new()
    }
}
