use glam::{Mat4, Vec2, Vec3};

use crate::math::intersect::Ray;
use crate::types::{Pose, Viewport};

/// Perspective frustum parameters. `fov_y_deg` is the full vertical field of
/// view in degrees; the horizontal extent follows from `aspect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveProjection {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveProjection {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_deg,
            aspect,
            near,
            far,
        }
    }

    /// Half extents of the image plane at the near distance: `(right, top)`.
    pub fn near_plane_half_extents(&self) -> (f32, f32) {
        let top = self.near * (self.fov_y_deg.to_radians() / 2.0).tan();
        (top * self.aspect, top)
    }

    /// Clip-space matrix for the GPU, combining this frustum with the
    /// forward-positive view convention of [`view_matrix`].
    pub fn clip_from_view(&self) -> Mat4 {
        let flip_z = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
            * flip_z
    }
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self::new(45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// View matrix for a camera at `position` facing along unit `front`.
///
/// The basis is derived from the world up axis, so `front` must not be
/// parallel to +Y. View space is right/up/front with depth increasing in
/// front of the camera (a point ahead has positive view z).
pub fn view_matrix(position: Vec3, front: Vec3) -> Mat4 {
    let right = front.cross(Vec3::Y).normalize();
    let up = right.cross(front);
    Mat4::from_cols_array(&[
        right.x,
        up.x,
        front.x,
        0.0,
        right.y,
        up.y,
        front.y,
        0.0,
        right.z,
        up.z,
        front.z,
        0.0,
        -position.dot(right),
        -position.dot(up),
        -position.dot(front),
        1.0,
    ])
}

/// Immutable per-frame camera snapshot. The coordinator captures one after
/// the active camera refreshes its matrices, and every projection or ray
/// query in that frame reads from it.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub position: Vec3,
    pub front: Vec3,
    pub projection: PerspectiveProjection,
    pub view: Mat4,
    pub viewport: Viewport,
}

impl CameraState {
    pub fn from_pose(pose: Pose, projection: PerspectiveProjection, viewport: Viewport) -> Self {
        Self {
            position: pose.position,
            front: pose.front,
            projection,
            view: view_matrix(pose.position, pose.front),
            viewport,
        }
    }

    /// World point in view space. Depth along the camera axis is `z`.
    pub fn world_to_view(&self, world: Vec3) -> Vec3 {
        self.view.transform_point3(world)
    }

    /// Projects a world point to raster pixel coordinates, origin at the
    /// top-left of the viewport. Returns `None` when the point falls outside
    /// the frustum; the near/far and screen-edge bounds are all exclusive.
    pub fn world_to_raster(&self, world: Vec3) -> Option<Vec2> {
        let view = self.world_to_view(world);
        if view.z <= self.projection.near || view.z >= self.projection.far {
            return None;
        }

        // Perspective divide onto the near plane.
        let projected_x = self.projection.near * view.x / view.z;
        let projected_y = self.projection.near * view.y / view.z;

        let (right, top) = self.projection.near_plane_half_extents();
        if projected_x <= -right || projected_x >= right {
            return None;
        }
        if projected_y <= -top || projected_y >= top {
            return None;
        }

        // Raster y grows downward.
        let raster_x = self.viewport.width * (projected_x + right) / (2.0 * right);
        let raster_y = self.viewport.height * (top - projected_y) / (2.0 * top);
        Some(Vec2::new(raster_x, raster_y))
    }

    /// World-space ray from the camera through a raster coordinate.
    pub fn ray_through_raster(&self, raster: Vec2) -> Ray {
        let ndc_x = raster.x / self.viewport.width * 2.0 - 1.0;
        let ndc_y = -(raster.y / self.viewport.height) * 2.0 + 1.0;

        let right = self.front.cross(Vec3::Y).normalize();
        let up = right.cross(self.front);
        let (half_width, half_height) = self.projection.near_plane_half_extents();

        let through = self.front * self.projection.near
            + right * (ndc_x * half_width)
            + up * (ndc_y * half_height);
        Ray::new(self.position, through.normalize())
    }
}
