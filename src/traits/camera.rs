use crate::math::CameraState;
use crate::scene::SceneCoordinator;
use crate::types::Viewport;

/// Camera behavior behind a [`SceneParticipant`](super::SceneParticipant).
///
/// Each frame the coordinator pushes the current aspect ratio, asks the rig
/// to refresh its matrices, then takes the snapshot every projection query
/// in that frame reads from.
pub trait CameraRig {
    fn set_aspect_ratio(&mut self, aspect: f32);

    /// Recompute the view matrix from the current pose.
    fn update_matrices(&mut self);

    /// Immutable snapshot for the renderer and projection queries.
    fn state(&self, viewport: Viewport) -> CameraState;

    /// Called when this camera becomes the active one.
    fn on_active(&mut self, _coordinator: &mut SceneCoordinator) {}
}
