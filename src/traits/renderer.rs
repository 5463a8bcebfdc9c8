use crate::math::CameraState;
use crate::traits::participant::{SharedInstance, SharedLight};
use crate::types::Viewport;

/// Everything the renderer needs for one frame: the camera snapshot plus
/// shared handles to the scene's meshes and lights.
pub struct SceneView {
    pub viewport: Viewport,
    pub camera: CameraState,
    pub meshes: Vec<SharedInstance>,
    pub lights: Vec<SharedLight>,
}

/// Presentation backend driven by the coordinator, once per frame.
///
/// Render failures are the backend's problem; the scene tick never aborts
/// because a frame could not be presented.
pub trait SceneRenderer {
    fn resize(&mut self, viewport: Viewport);

    fn render(&mut self, view: &SceneView);
}
