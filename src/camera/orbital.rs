use glam::{Vec2, Vec3};
use log::debug;

use crate::input::InputHandle;
use crate::math::{view_matrix, CameraState, PerspectiveProjection};
use crate::scene::{MoveConstraint, OrbitController, SceneCoordinator};
use crate::traits::{CameraRig, Message, SceneParticipant};
use crate::types::{Pose, Viewport};

/// Linear glide toward a fixed target, advanced once per frame. The
/// direction is locked when the tween is armed; the final step lands exactly
/// on the target, so a distance D at step s finishes in ceil(D / s) ticks.
struct ZoomTween {
    target: Vec3,
    direction: Vec3,
    step: f32,
}

impl ZoomTween {
    fn new(from: Vec3, target: Vec3, step: f32) -> Self {
        Self {
            target,
            direction: (target - from).normalize_or_zero(),
            step,
        }
    }

    /// Moves `position` one step; true once it sits on the target.
    fn advance(&self, position: &mut Vec3) -> bool {
        let remaining = (self.target - *position).length();
        if remaining <= self.step {
            *position = self.target;
            return true;
        }
        *position += self.direction * self.step;
        false
    }
}

/// Distance covered per zoom tick, world units.
const ZOOM_STEP: f32 = 0.1;

/// Camera that circles a pivot point.
///
/// Dragging pans it around the pivot, yaw and pitch independently; the
/// pitch orbiter usually carries a constraint that keeps the camera out of
/// the floor and the product volume. A double-click on empty canvas toggles
/// a slow automatic orbit. A `ZoomToPoint` message glides the camera toward
/// the sent point, and the next one glides it back out.
pub struct OrbitalCameraManager {
    name: String,
    projection: PerspectiveProjection,
    pose: Pose,
    view: glam::Mat4,
    yaw_axis: Vec3,
    orbit_speed_dps: f32,
    yaw_orbiter: OrbitController,
    pitch_orbiter: OrbitController,
    input: Option<InputHandle>,
    drag_sensitivity: f32,
    zoom_origin: Option<Vec3>,
    tween: Option<ZoomTween>,
    zoomed: bool,
}

impl OrbitalCameraManager {
    pub fn new(
        name: &str,
        position: Vec3,
        pivot: Vec3,
        projection: PerspectiveProjection,
        yaw_axis: Vec3,
        orbit_speed_dps: f32,
    ) -> Self {
        let pose = Pose::looking_at(position, pivot);
        Self {
            name: name.to_string(),
            projection,
            pose,
            view: view_matrix(pose.position, pose.front),
            yaw_axis,
            orbit_speed_dps,
            yaw_orbiter: OrbitController::new(pivot),
            pitch_orbiter: OrbitController::new(pivot),
            input: None,
            drag_sensitivity: 0.5,
            zoom_origin: None,
            tween: None,
            zoomed: false,
        }
    }

    pub fn set_yaw_constraint(&mut self, constraint: MoveConstraint) {
        self.yaw_orbiter.set_constraint(Some(constraint));
    }

    pub fn set_pitch_constraint(&mut self, constraint: MoveConstraint) {
        self.pitch_orbiter.set_constraint(Some(constraint));
    }

    pub fn set_drag_sensitivity(&mut self, sensitivity: f32) {
        self.drag_sensitivity = sensitivity;
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn is_zooming(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_auto_orbiting(&self) -> bool {
        self.yaw_orbiter.is_auto_orbiting()
    }

    pub fn set_auto_orbit(&mut self, enabled: bool) {
        if enabled {
            self.yaw_orbiter
                .start_auto(self.yaw_axis, self.orbit_speed_dps);
        } else {
            self.yaw_orbiter.stop_auto();
        }
    }

    /// Arms the glide toward `point`, or back to the pre-zoom position when
    /// already in. Ignored while a glide is running.
    fn toggle_zoom(&mut self, point: Vec3) {
        if self.tween.is_some() {
            return;
        }
        if self.zoomed {
            let Some(origin) = self.zoom_origin.take() else {
                return;
            };
            self.tween = Some(ZoomTween::new(self.pose.position, origin, ZOOM_STEP));
            self.zoomed = false;
        } else {
            self.zoom_origin = Some(self.pose.position);
            // Stop one unit short of the point, along the view direction.
            let target = point - self.pose.front;
            self.tween = Some(ZoomTween::new(self.pose.position, target, ZOOM_STEP));
            self.zoomed = true;
        }
    }

    fn apply_drag(&mut self, delta: Vec2) {
        if delta.x != 0.0 {
            self.yaw_orbiter
                .pan(&mut self.pose, self.yaw_axis, delta.x);
        }
        if delta.y != 0.0 {
            let right = self.pose.front.cross(Vec3::Y).normalize();
            self.pitch_orbiter.pan(&mut self.pose, right, delta.y);
        }
    }

    fn adopt_input(&mut self, handle: InputHandle) {
        handle.set_cursor_sensitivity(self.drag_sensitivity);
        self.input = Some(handle);
    }
}

impl SceneParticipant for OrbitalCameraManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_frame(&mut self, coordinator: &mut SceneCoordinator) {
        if let Some(tween) = self.tween.as_ref() {
            if tween.advance(&mut self.pose.position) {
                self.tween = None;
            }
            return;
        }

        let Some(input) = self.input.clone() else {
            return;
        };

        if !self.zoomed {
            let drag = input.take_drag_delta();
            if drag != Vec2::ZERO {
                self.apply_drag(drag);
            }
            if input.take_double_click().is_some() {
                let enable = !self.is_auto_orbiting();
                debug!("auto orbit {}", if enable { "on" } else { "off" });
                self.set_auto_orbit(enable);
            }
        } else {
            // Consume stale gestures so leaving the zoom starts clean.
            input.take_drag_delta();
            input.take_double_click();
        }

        self.yaw_orbiter
            .tick(&mut self.pose, coordinator.frame_delta());
    }

    fn on_message(&mut self, _coordinator: &mut SceneCoordinator, _sender: &str, message: Message) {
        match message {
            Message::InputHandle(handle) => self.adopt_input(handle),
            Message::ZoomToPoint(point) => self.toggle_zoom(point),
            Message::SetAutoOrbit(enabled) => self.set_auto_orbit(enabled),
            _ => {}
        }
    }

    fn as_camera_mut(&mut self) -> Option<&mut dyn CameraRig> {
        Some(self)
    }
}

impl CameraRig for OrbitalCameraManager {
    fn set_aspect_ratio(&mut self, aspect: f32) {
        self.projection.aspect = aspect;
    }

    fn update_matrices(&mut self) {
        self.view = view_matrix(self.pose.position, self.pose.front);
    }

    fn state(&self, viewport: Viewport) -> CameraState {
        CameraState {
            position: self.pose.position,
            front: self.pose.front,
            projection: self.projection,
            view: self.view,
            viewport,
        }
    }

    fn on_active(&mut self, coordinator: &mut SceneCoordinator) {
        if let Some(input) = &self.input {
            input.set_cursor_sensitivity(self.drag_sensitivity);
        } else {
            let name = self.name.clone();
            coordinator.broadcast_to(&name, "Input", Message::InputHandleRequest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_tween_finishes_in_ceil_distance_over_step_ticks() {
        let start = Vec3::ZERO;
        let target = Vec3::new(0.953, 0.0, 0.0);
        let tween = ZoomTween::new(start, target, 0.1);

        let mut position = start;
        let mut ticks = 0;
        while !tween.advance(&mut position) {
            ticks += 1;
            assert!(ticks < 100, "Tween failed to terminate");
        }
        ticks += 1;

        assert_eq!(ticks, 10, "0.953 units at 0.1 per tick is 10 ticks");
        assert_eq!(position, target, "Final step must land exactly on target");
    }

    #[test]
    fn zoom_tween_never_overshoots() {
        let start = Vec3::ZERO;
        let target = Vec3::new(0.35, 0.0, 0.0);
        let tween = ZoomTween::new(start, target, 0.1);

        let mut position = start;
        for _ in 0..20 {
            let done = tween.advance(&mut position);
            assert!(position.x <= target.x + 1e-6);
            if done {
                break;
            }
        }
        assert_eq!(position, target);
    }

    #[test]
    fn toggle_zoom_remembers_the_origin() {
        let mut camera = OrbitalCameraManager::new(
            "Camera",
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -5.0),
            PerspectiveProjection::default(),
            Vec3::NEG_Y,
            60.0,
        );
        camera.toggle_zoom(Vec3::new(0.0, 0.0, -3.0));
        assert!(camera.is_zooming());
        assert!(camera.is_zoomed());

        // Run the glide out by hand.
        while let Some(tween) = camera.tween.as_ref() {
            if tween.advance(&mut camera.pose.position) {
                camera.tween = None;
            }
        }
        // Target sits one unit short of the point along front (front is -Z).
        assert!((camera.pose.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);

        camera.toggle_zoom(Vec3::ZERO);
        while let Some(tween) = camera.tween.as_ref() {
            if tween.advance(&mut camera.pose.position) {
                camera.tween = None;
            }
        }
        assert!(
            camera.pose.position.length() < 1e-4,
            "Second toggle should glide back to the origin"
        );
        assert!(!camera.is_zoomed());
    }

    #[test]
    fn zoom_toggle_is_ignored_mid_glide() {
        let mut camera = OrbitalCameraManager::new(
            "Camera",
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -5.0),
            PerspectiveProjection::default(),
            Vec3::NEG_Y,
            60.0,
        );
        camera.toggle_zoom(Vec3::new(0.0, 0.0, -3.0));
        let target_before = camera.tween.as_ref().map(|t| t.target);
        camera.toggle_zoom(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(
            camera.tween.as_ref().map(|t| t.target),
            target_before,
            "A second toggle mid-glide must not retarget"
        );
    }
}
