use glam::{Quat, Vec3};

use crate::timing::RepeatingTimer;
use crate::types::Pose;

/// Veto/clamp hook consulted before every orbit step. Receives the candidate
/// destination and the current position; returns `None` to refuse the move or
/// a (possibly substituted) destination to apply.
pub type MoveConstraint = Box<dyn FnMut(Vec3, Vec3) -> Option<Vec3>>;

/// Degrees applied per auto-orbit timer fire.
const AUTO_ORBIT_STEP_DEG: f32 = 1.0;

struct AutoOrbit {
    axis: Vec3,
    timer: RepeatingTimer,
}

/// Rotates a pose around a pivot point, keeping it looking at the pivot.
///
/// Used by the orbital camera for drag panning, and by the directional light
/// for its sun slider. An optional auto-orbit spins the pose at a fixed rate
/// of one-degree steps; manual panning is ignored while it runs.
pub struct OrbitController {
    pivot: Vec3,
    constraint: Option<MoveConstraint>,
    auto: Option<AutoOrbit>,
}

impl OrbitController {
    pub fn new(pivot: Vec3) -> Self {
        Self {
            pivot,
            constraint: None,
            auto: None,
        }
    }

    pub fn with_constraint(pivot: Vec3, constraint: MoveConstraint) -> Self {
        Self {
            pivot,
            constraint: Some(constraint),
            auto: None,
        }
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    pub fn set_pivot(&mut self, pivot: Vec3) {
        self.pivot = pivot;
    }

    pub fn set_constraint(&mut self, constraint: Option<MoveConstraint>) {
        self.constraint = constraint;
    }

    /// Manual orbit by `degrees` around `axis` through the pivot. Ignored
    /// while the auto-orbit runs.
    pub fn pan(&mut self, pose: &mut Pose, axis: Vec3, degrees: f32) {
        if self.auto.is_some() {
            return;
        }
        self.orbit(pose, axis, degrees);
    }

    /// Starts spinning at `degrees_per_second`. Idempotent; a second start
    /// keeps the original axis and rate.
    pub fn start_auto(&mut self, axis: Vec3, degrees_per_second: f32) {
        if self.auto.is_some() {
            return;
        }
        self.auto = Some(AutoOrbit {
            axis,
            timer: RepeatingTimer::from_hz(degrees_per_second / AUTO_ORBIT_STEP_DEG),
        });
    }

    pub fn stop_auto(&mut self) {
        self.auto = None;
    }

    pub fn is_auto_orbiting(&self) -> bool {
        self.auto.is_some()
    }

    /// Advances the auto-orbit, if any, by the frame delta.
    pub fn tick(&mut self, pose: &mut Pose, delta: f32) {
        let Some(auto) = self.auto.as_mut() else { return };
        if !auto.timer.tick(delta) {
            return;
        }
        let axis = auto.axis;
        self.orbit(pose, axis, AUTO_ORBIT_STEP_DEG);
    }

    fn orbit(&mut self, pose: &mut Pose, axis: Vec3, degrees: f32) {
        let rotation = Quat::from_axis_angle(axis.normalize(), degrees.to_radians());
        let candidate = self.pivot + rotation * (pose.position - self.pivot);

        let destination = match self.constraint.as_mut() {
            Some(constraint) => match constraint(candidate, pose.position) {
                Some(allowed) => allowed,
                None => return,
            },
            None => candidate,
        };

        pose.position = destination;
        pose.look_at(self.pivot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIVOT: Vec3 = Vec3::new(0.0, 0.0, -5.0);

    fn start_pose() -> Pose {
        Pose::looking_at(Vec3::ZERO, PIVOT)
    }

    #[test]
    fn quarter_turn_around_y() {
        let mut orbiter = OrbitController::new(PIVOT);
        let mut pose = start_pose();
        orbiter.pan(&mut pose, Vec3::Y, 90.0);
        assert!(
            (pose.position - Vec3::new(5.0, 0.0, -5.0)).length() < 1e-4,
            "Unexpected position {:?}",
            pose.position
        );
    }

    #[test]
    fn pose_keeps_facing_the_pivot() {
        let mut orbiter = OrbitController::new(PIVOT);
        let mut pose = start_pose();
        orbiter.pan(&mut pose, Vec3::Y, 37.0);
        let expected = (PIVOT - pose.position).normalize();
        assert!((pose.front - expected).length() < 1e-5);
    }

    #[test]
    fn full_turn_in_steps_returns_to_start() {
        let mut orbiter = OrbitController::new(PIVOT);
        let mut pose = start_pose();
        let start = pose.position;
        for _ in 0..8 {
            orbiter.pan(&mut pose, Vec3::Y, 45.0);
        }
        assert!(
            (pose.position - start).length() < 1e-3,
            "360 degrees of panning should close the loop, drifted by {}",
            (pose.position - start).length()
        );
    }

    #[test]
    fn constraint_veto_freezes_the_pose() {
        let mut orbiter = OrbitController::with_constraint(PIVOT, Box::new(|_, _| None));
        let mut pose = start_pose();
        let before = pose.position;
        orbiter.pan(&mut pose, Vec3::Y, 45.0);
        assert_eq!(pose.position, before);
    }

    #[test]
    fn constraint_substitution_wins() {
        let clamped = Vec3::new(0.0, 1.0, 0.0);
        let mut orbiter =
            OrbitController::with_constraint(PIVOT, Box::new(move |_, _| Some(clamped)));
        let mut pose = start_pose();
        orbiter.pan(&mut pose, Vec3::Y, 45.0);
        assert_eq!(pose.position, clamped);
    }

    #[test]
    fn manual_pan_is_ignored_while_auto_orbiting() {
        let mut orbiter = OrbitController::new(PIVOT);
        let mut pose = start_pose();
        orbiter.start_auto(Vec3::Y, 60.0);
        let before = pose.position;
        orbiter.pan(&mut pose, Vec3::Y, 45.0);
        assert_eq!(pose.position, before);

        orbiter.stop_auto();
        orbiter.pan(&mut pose, Vec3::Y, 45.0);
        assert!((pose.position - before).length() > 0.1);
    }

    #[test]
    fn auto_orbit_steps_one_degree_per_fire() {
        let mut orbiter = OrbitController::new(PIVOT);
        let mut pose = start_pose();
        orbiter.start_auto(Vec3::Y, 60.0);

        // 60 deg/s: a 1/60 s frame is worth exactly one 1-degree step.
        orbiter.tick(&mut pose, 1.0 / 60.0);
        let v = pose.position - PIVOT;
        let angle = v.angle_between(Vec3::new(0.0, 0.0, 5.0)).to_degrees();
        assert!((angle - 1.0).abs() < 1e-2, "Expected 1 degree, got {angle}");
    }

    #[test]
    fn start_auto_is_idempotent() {
        let mut orbiter = OrbitController::new(PIVOT);
        orbiter.start_auto(Vec3::Y, 60.0);
        orbiter.start_auto(Vec3::X, 600.0);
        let mut pose = start_pose();
        orbiter.tick(&mut pose, 1.0 / 60.0);
        // Still the original Y axis: height unchanged.
        assert!(pose.position.y.abs() < 1e-5);
    }
}
