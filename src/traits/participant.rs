use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use crate::input::InputHandle;
use crate::scene::SceneCoordinator;
use crate::traits::camera::CameraRig;
use crate::types::{LightData, MeshInstance};

/// Participants are shared between the coordinator, the composition code and
/// each other through reference-counted cells.
pub type SharedParticipant = Rc<RefCell<dyn SceneParticipant>>;

/// Mesh instances stay shared after hand-off so their owner can keep
/// animating transforms and swapping materials while the renderer and ray
/// caster read them.
pub type SharedInstance = Rc<RefCell<MeshInstance>>;

/// Lights are shared for the same reason; a directional light orbits.
pub type SharedLight = Rc<RefCell<LightData>>;

/// Payloads exchanged between participants over the coordinator.
#[derive(Debug, Clone)]
pub enum Message {
    /// A camera asking the input participant for its handle.
    InputHandleRequest,
    /// Reply carrying the shared input handle.
    InputHandle(InputHandle),
    /// Ask the receiving camera to glide toward a world-space point, or back
    /// to where it was if it is already zoomed in.
    ZoomToPoint(Vec3),
    /// Enable or disable a camera's automatic orbit.
    SetAutoOrbit(bool),
    /// Advance the receiver's animation by a signed number of seconds.
    ScrubAnimation(f32),
    /// Recolor the receiver's meshes.
    ApplyColor([f32; 3]),
    /// Orbit the receiving light around its target by degrees.
    OrbitLight(f32),
}

/// A single renderable or ray-castable item handed to the coordinator when
/// its owner joins the scene.
#[derive(Clone)]
pub enum Primitive {
    Mesh(SharedInstance),
    Light(SharedLight),
}

#[derive(Clone)]
pub struct Drawable {
    pub primitive: Primitive,
    /// Meshes with this set are registered with the ray caster. Independent
    /// of visibility, so an invisible collision proxy can still catch rays.
    pub ray_castable: bool,
}

impl Drawable {
    pub fn mesh(instance: SharedInstance) -> Self {
        Self {
            primitive: Primitive::Mesh(instance),
            ray_castable: false,
        }
    }

    pub fn ray_castable_mesh(instance: SharedInstance) -> Self {
        Self {
            primitive: Primitive::Mesh(instance),
            ray_castable: true,
        }
    }

    pub fn light(light: SharedLight) -> Self {
        Self {
            primitive: Primitive::Light(light),
            ray_castable: false,
        }
    }
}

/// A named scene object managed by the [`SceneCoordinator`].
///
/// The coordinator polls `is_ready` on drawable participants until it flips
/// true, collects `drawables` exactly once at that point, calls
/// `on_scene_start`, and from then on delivers `on_frame` every frame and
/// `on_message` whenever another participant addresses this one.
pub trait SceneParticipant {
    /// Registry key. Must be unique within a coordinator; registering the
    /// same name again replaces the earlier participant.
    fn name(&self) -> &str;

    /// Whether this participant contributes drawables once ready. Non-drawable
    /// participants skip the pending stage entirely.
    fn is_drawable(&self) -> bool {
        false
    }

    /// Readiness probe, polled once per frame while pending. Takes `&mut self`
    /// so participants can advance asset loading from inside the poll.
    fn is_ready(&mut self) -> bool {
        true
    }

    /// Drawables to hand to the renderer and ray caster. Called once, when
    /// the participant joins the active scene.
    fn drawables(&self) -> Vec<Drawable> {
        Vec::new()
    }

    /// Called exactly once when this participant joins the active scene.
    fn on_scene_start(&mut self, _coordinator: &mut SceneCoordinator) {}

    /// Called every frame for every registered participant, ready or not.
    fn on_frame(&mut self, _coordinator: &mut SceneCoordinator) {}

    /// A message from `sender` addressed to this participant.
    fn on_message(&mut self, _coordinator: &mut SceneCoordinator, _sender: &str, _message: Message) {
    }

    /// Camera access for participants that are cameras.
    fn as_camera_mut(&mut self) -> Option<&mut dyn CameraRig> {
        None
    }
}
