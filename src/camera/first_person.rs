use glam::{Mat4, Vec3};

use crate::input::{InputHandle, Key};
use crate::math::{view_matrix, CameraState, PerspectiveProjection};
use crate::scene::SceneCoordinator;
use crate::traits::{CameraRig, Message, SceneParticipant};
use crate::types::Viewport;

/// Pitch keeps strictly inside this many degrees either side of level.
const PITCH_LIMIT_DEG: f32 = 85.0;

/// Distance moved per frame while a movement key is down.
const MOVE_STEP: f32 = 0.1;

/// Free-walk camera: WASD to move, drag to look around.
///
/// Orientation is yaw/pitch angles rather than a stored front vector, so
/// the pitch clamp is exact and the camera can never roll.
pub struct FirstPersonCameraManager {
    name: String,
    projection: PerspectiveProjection,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    view: Mat4,
    input: Option<InputHandle>,
    look_sensitivity: f32,
}

impl FirstPersonCameraManager {
    pub fn new(
        name: &str,
        position: Vec3,
        target: Vec3,
        projection: PerspectiveProjection,
    ) -> Self {
        let direction = (target - position).normalize_or_zero();
        let mut camera = Self {
            name: name.to_string(),
            projection,
            position,
            yaw: direction.z.atan2(direction.x),
            pitch: direction.y.asin(),
            view: Mat4::IDENTITY,
            input: None,
            look_sensitivity: 0.05,
        };
        camera.update_matrices();
        camera
    }

    pub fn set_look_sensitivity(&mut self, sensitivity: f32) {
        self.look_sensitivity = sensitivity;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
    }

    /// Applies a look delta in radians. Yaw is free; a pitch that would
    /// reach the limit is dropped, leaving the yaw part applied.
    fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx;
        let candidate = self.pitch - dy;
        if candidate.to_degrees().abs() < PITCH_LIMIT_DEG {
            self.pitch = candidate;
        }
    }

    fn apply_movement(&mut self, input: &InputHandle) {
        let front = self.front();
        let right = front.cross(Vec3::Y).normalize();
        if input.is_down(Key::W) {
            self.position += front * MOVE_STEP;
        }
        if input.is_down(Key::S) {
            self.position -= front * MOVE_STEP;
        }
        if input.is_down(Key::A) {
            self.position -= right * MOVE_STEP;
        }
        if input.is_down(Key::D) {
            self.position += right * MOVE_STEP;
        }
    }
}

impl SceneParticipant for FirstPersonCameraManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_frame(&mut self, _coordinator: &mut SceneCoordinator) {
        let Some(input) = self.input.clone() else {
            return;
        };
        let drag = input.take_drag_delta();
        if drag != glam::Vec2::ZERO {
            self.apply_look(drag.x, drag.y);
        }
        self.apply_movement(&input);
    }

    fn on_message(&mut self, _coordinator: &mut SceneCoordinator, _sender: &str, message: Message) {
        if let Message::InputHandle(handle) = message {
            handle.set_cursor_sensitivity(self.look_sensitivity);
            self.input = Some(handle);
        }
    }

    fn as_camera_mut(&mut self) -> Option<&mut dyn CameraRig> {
        Some(self)
    }
}

impl CameraRig for FirstPersonCameraManager {
    fn set_aspect_ratio(&mut self, aspect: f32) {
        self.projection.aspect = aspect;
    }

    fn update_matrices(&mut self) {
        self.view = view_matrix(self.position, self.front());
    }

    fn state(&self, viewport: Viewport) -> CameraState {
        CameraState {
            position: self.position,
            front: self.front(),
            projection: self.projection,
            view: self.view,
            viewport,
        }
    }

    fn on_active(&mut self, coordinator: &mut SceneCoordinator) {
        if let Some(input) = &self.input {
            input.set_cursor_sensitivity(self.look_sensitivity);
        } else {
            let name = self.name.clone();
            coordinator.broadcast_to(&name, "Input", Message::InputHandleRequest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> FirstPersonCameraManager {
        FirstPersonCameraManager::new(
            "Walker",
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -10.0),
            PerspectiveProjection::default(),
        )
    }

    #[test]
    fn initial_front_points_at_the_target() {
        let camera = camera();
        assert!((camera.front() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn pitch_stops_short_of_the_poles() {
        let mut camera = camera();
        for _ in 0..100 {
            camera.apply_look(0.0, 0.3);
        }
        assert!(
            camera.pitch.to_degrees().abs() < PITCH_LIMIT_DEG,
            "Pitch {} must stay inside the limit",
            camera.pitch.to_degrees()
        );

        // Rejected pitch steps still leave yaw free.
        let pitch_before = camera.pitch;
        camera.apply_look(0.5, 10.0);
        assert_eq!(camera.pitch, pitch_before);
    }

    #[test]
    fn movement_follows_the_look_direction() {
        let mut camera = camera();
        let handle = InputHandle::new();
        handle.press(Key::W);
        camera.input = Some(handle.clone());
        camera.apply_movement(&handle);
        assert!(
            (camera.position - Vec3::new(0.0, 0.0, -MOVE_STEP)).length() < 1e-5,
            "W should step along front, got {:?}",
            camera.position
        );

        handle.release(Key::W);
        handle.press(Key::D);
        camera.apply_movement(&handle);
        assert!(
            (camera.position.x - MOVE_STEP).abs() < 1e-5,
            "D should strafe along right, got {:?}",
            camera.position
        );
    }
}
