use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use log::debug;

use crate::scene::{OrbitController, SceneCoordinator};
use crate::scenes::uv_sphere;
use crate::traits::{Drawable, Message, SceneParticipant, SharedInstance, SharedLight};
use crate::types::{LightData, LightKind, MaterialDesc, MeshInstance, Pose};

/// Scene-wide base illumination.
pub struct AmbientLight {
    name: String,
    light: SharedLight,
}

impl AmbientLight {
    pub fn new(name: impl Into<String>, color: [f32; 3], intensity: f32) -> Self {
        Self {
            name: name.into(),
            light: Rc::new(RefCell::new(LightData::ambient(color, intensity))),
        }
    }
}

impl SceneParticipant for AmbientLight {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_drawable(&self) -> bool {
        true
    }

    fn drawables(&self) -> Vec<Drawable> {
        vec![Drawable::light(self.light.clone())]
    }
}

const GIZMO_COLOR: [f32; 3] = [0.988, 0.898, 0.439];

/// Directional light aimed at a fixed target, orbitable around it via
/// [`Message::OrbitLight`]. Carries an optional unlit sun gizmo so the
/// light's position reads on screen.
pub struct DirectLight {
    name: String,
    pose: Pose,
    light: SharedLight,
    gizmo: Option<SharedInstance>,
    orbiter: OrbitController,
}

impl DirectLight {
    pub fn new(
        name: impl Into<String>,
        position: Vec3,
        target: Vec3,
        color: [f32; 3],
        intensity: f32,
    ) -> Self {
        let pose = Pose::looking_at(position, target);
        Self {
            name: name.into(),
            pose,
            light: Rc::new(RefCell::new(LightData::directional(
                pose.front, color, intensity,
            ))),
            gizmo: None,
            orbiter: OrbitController::new(target),
        }
    }

    /// Attaches an unlit sphere at the light's position.
    pub fn with_gizmo(mut self, radius: f32) -> Self {
        let mut instance = MeshInstance::at(Rc::new(uv_sphere(radius, 24, 16)), self.pose.position);
        instance.material = MaterialDesc::unlit_color(GIZMO_COLOR);
        self.gizmo = Some(Rc::new(RefCell::new(instance)));
        self
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn direction(&self) -> Vec3 {
        self.pose.front
    }

    fn sync_shared_state(&mut self) {
        self.light.borrow_mut().kind = LightKind::Directional {
            direction: self.pose.front,
        };
        if let Some(gizmo) = &self.gizmo {
            gizmo.borrow_mut().transform = Mat4::from_translation(self.pose.position);
        }
    }
}

impl SceneParticipant for DirectLight {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_drawable(&self) -> bool {
        true
    }

    fn drawables(&self) -> Vec<Drawable> {
        let mut drawables = vec![Drawable::light(self.light.clone())];
        if let Some(gizmo) = &self.gizmo {
            drawables.push(Drawable::mesh(gizmo.clone()));
        }
        drawables
    }

    fn on_message(&mut self, _coordinator: &mut SceneCoordinator, sender: &str, message: Message) {
        match message {
            Message::OrbitLight(degrees) => {
                self.orbiter.pan(&mut self.pose, Vec3::Y, degrees);
                self.sync_shared_state();
            }
            other => debug!("light '{}' ignoring {other:?} from '{sender}'", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Viewport;

    #[test]
    fn direct_light_points_at_its_target() {
        let light = DirectLight::new("Sun", Vec3::new(0.0, 150.0, 100.0), Vec3::ZERO, [1.0; 3], 1.0);
        let expected = (Vec3::ZERO - Vec3::new(0.0, 150.0, 100.0)).normalize();
        assert!((light.direction() - expected).length() < 1e-5);
    }

    #[test]
    fn orbit_message_moves_light_and_gizmo_together() {
        let mut coordinator = SceneCoordinator::new(Viewport::default());
        let mut light =
            DirectLight::new("Sun", Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO, [1.0; 3], 1.0)
                .with_gizmo(4.0);

        light.on_message(&mut coordinator, "Overlay", Message::OrbitLight(90.0));

        assert!(
            (light.position() - Vec3::new(100.0, 0.0, 0.0)).length() < 1e-3,
            "Unexpected position {:?}",
            light.position()
        );
        let expected_dir = (Vec3::ZERO - light.position()).normalize();
        assert!((light.direction() - expected_dir).length() < 1e-5);

        let gizmo = light.gizmo.as_ref().unwrap().borrow();
        let gizmo_pos = gizmo.transform.w_axis.truncate();
        assert!((gizmo_pos - light.position()).length() < 1e-4);
    }

    #[test]
    fn lights_expose_their_drawables() {
        let ambient = AmbientLight::new("Ambient", [1.0; 3], 0.8);
        assert_eq!(ambient.drawables().len(), 1);

        let sun = DirectLight::new("Sun", Vec3::Y, Vec3::ZERO, [1.0; 3], 1.0).with_gizmo(1.0);
        assert_eq!(sun.drawables().len(), 2);
    }
}
