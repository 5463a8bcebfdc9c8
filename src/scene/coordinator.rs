use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use log::{debug, warn};

use crate::math::CameraState;
use crate::scene::RayCaster;
use crate::timing::Clock;
use crate::traits::{Message, Primitive, SceneRenderer, SceneView, SharedParticipant};
use crate::types::Viewport;

struct Notice {
    from: String,
    to: String,
    payload: Message,
}

struct SceneEntry {
    owner: String,
    primitive: Primitive,
}

/// Owner of the scene-object lifecycle.
///
/// Participants register under a unique name. Drawable ones wait in a
/// pending set until their `is_ready` poll flips true, at which point their
/// drawables join the render set and ray caster and `on_scene_start` runs
/// exactly once. Every frame tick refreshes the active camera, promotes
/// newly ready participants, renders, and then notifies every participant.
///
/// Messages between participants go through `broadcast_to`; when the
/// recipient is not registered yet, or is the one currently being called
/// into, the message waits on a notice board and is delivered later without
/// being dropped.
pub struct SceneCoordinator {
    viewport: Viewport,
    participants: Vec<(String, SharedParticipant)>,
    pending: Vec<String>,
    scene_entries: Vec<SceneEntry>,
    ray_caster: RayCaster,
    active_camera: Option<String>,
    camera_state: Option<CameraState>,
    notices: VecDeque<Notice>,
    clock: Clock,
    frame_delta: f32,
}

impl SceneCoordinator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            participants: Vec::new(),
            pending: Vec::new(),
            scene_entries: Vec::new(),
            ray_caster: RayCaster::new(),
            active_camera: None,
            camera_state: None,
            notices: VecDeque::new(),
            clock: Clock::new(),
            frame_delta: 0.0,
        }
    }

    /// Adds a participant to the registry. Ready ones join the scene on the
    /// spot; drawable-but-unready ones go to the pending set. Registering a
    /// name again replaces the earlier participant and withdraws its
    /// drawables. Queued notices addressed to this name are delivered before
    /// returning, oldest first.
    pub fn register(&mut self, participant: SharedParticipant) {
        let name = participant.borrow().name().to_string();
        if self.is_registered(&name) {
            warn!("participant '{name}' registered twice; replacing the earlier one");
            self.remove(&name);
            self.pending.retain(|n| n.as_str() != name);
            self.participants.retain(|(n, _)| n.as_str() != name);
        }
        self.participants.push((name.clone(), participant.clone()));

        let (drawable, ready) = {
            let mut guard = participant.borrow_mut();
            (guard.is_drawable(), guard.is_ready())
        };
        if drawable && !ready {
            debug!("participant '{name}' pending until ready");
            self.pending.push(name.clone());
        } else if ready {
            self.activate(&name, &participant);
        }

        self.deliver_notices_to(&name);
    }

    pub fn participant(&self, name: &str) -> Option<SharedParticipant> {
        self.participants
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, p)| p.clone())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.participants.iter().any(|(n, _)| n.as_str() == name)
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.iter().any(|n| n.as_str() == name)
    }

    /// Makes `name` the camera every subsequent frame renders through and
    /// runs its activation hook. A name that is unknown, or that belongs to
    /// a non-camera, leaves the current choice untouched.
    pub fn set_active_camera(&mut self, name: &str) {
        let Some(participant) = self.participant(name) else {
            debug!("set_active_camera: no participant named '{name}'");
            return;
        };
        let mut guard = participant.borrow_mut();
        match guard.as_camera_mut() {
            Some(rig) => {
                self.active_camera = Some(name.to_string());
                rig.on_active(self);
            }
            None => debug!("set_active_camera: participant '{name}' is not a camera"),
        }
    }

    pub fn active_camera(&self) -> Option<&str> {
        self.active_camera.as_deref()
    }

    /// Camera snapshot taken at the start of the current frame. `None` until
    /// the first frame renders.
    pub fn camera_state(&self) -> Option<CameraState> {
        self.camera_state
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Seconds the last frame took; what per-frame animation advances by.
    pub fn frame_delta(&self) -> f32 {
        self.frame_delta
    }

    /// One frame tick. Without a usable active camera (or with a degenerate
    /// viewport) the scene idles: no promotion, no rendering, no hooks.
    pub fn render_frame(&mut self, renderer: &mut dyn SceneRenderer) {
        self.frame_delta = self.clock.tick();

        let Some(camera_name) = self.active_camera.clone() else {
            return;
        };
        let Some(camera) = self.participant(&camera_name) else {
            return;
        };
        if self.viewport.is_degenerate() {
            return;
        }

        let state = {
            let mut guard = camera.borrow_mut();
            let Some(rig) = guard.as_camera_mut() else {
                debug!("active participant '{camera_name}' is not a camera; skipping frame");
                return;
            };
            rig.set_aspect_ratio(self.viewport.aspect_ratio());
            rig.update_matrices();
            let state = rig.state(self.viewport);
            self.camera_state = Some(state);
            state
        };

        self.flush_notices();
        self.promote_pending();

        renderer.render(&self.view(state));

        let participants: Vec<SharedParticipant> =
            self.participants.iter().map(|(_, p)| p.clone()).collect();
        for participant in participants {
            participant.borrow_mut().on_frame(self);
        }
    }

    /// Raster coordinate of a world point, but only while the point is the
    /// nearest surface along its own view ray. Returns `None` when the point
    /// does not project, when nothing catches the ray, or when a registered
    /// surface sits in front of it.
    pub fn raster_coord_if_nearest(&self, world: Vec3) -> Option<Vec2> {
        let camera = self.camera_state?;
        let raster = camera.world_to_raster(world)?;
        let hit = self.ray_caster.cast(raster, &camera)?;

        let query_depth = camera.world_to_view(world).z;
        let hit_depth = camera.world_to_view(hit).z;
        (query_depth <= hit_depth).then_some(raster)
    }

    /// Sends `message` to the participant named `to`. An absent or
    /// currently-borrowed recipient gets the message queued instead of
    /// dropped; see [`Self::register`] and the per-frame notice flush.
    pub fn broadcast_to(&mut self, from: &str, to: &str, message: Message) {
        if let Some(recipient) = self.participant(to) {
            match recipient.try_borrow_mut() {
                Ok(mut participant) => {
                    participant.on_message(self, from, message);
                    return;
                }
                Err(_) => debug!("recipient '{to}' is busy; queuing notice from '{from}'"),
            }
        }
        self.notices.push_back(Notice {
            from: from.to_string(),
            to: to.to_string(),
            payload: message,
        });
    }

    /// Delivers `message` to every registered participant except the sender.
    pub fn broadcast_to_all(&mut self, from: &str, message: Message) {
        let recipients: Vec<(String, SharedParticipant)> = self
            .participants
            .iter()
            .filter(|(name, _)| name.as_str() != from)
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect();
        for (name, participant) in recipients {
            match participant.try_borrow_mut() {
                Ok(mut p) => p.on_message(self, from, message.clone()),
                Err(_) => self.notices.push_back(Notice {
                    from: from.to_string(),
                    to: name,
                    payload: message.clone(),
                }),
            }
        }
    }

    /// Withdraws a participant's drawables from the render set and ray
    /// caster. The participant stays registered and keeps receiving frame
    /// and message hooks.
    pub fn remove(&mut self, name: &str) {
        self.scene_entries.retain(|entry| entry.owner != name);
        self.ray_caster.remove_owner(name);
    }

    pub fn drawable_count(&self) -> usize {
        self.scene_entries.len()
    }

    pub fn ray_target_count(&self) -> usize {
        self.ray_caster.target_count()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.len()
    }

    fn activate(&mut self, name: &str, participant: &SharedParticipant) {
        let drawables = participant.borrow().drawables();
        for drawable in drawables {
            if drawable.ray_castable {
                if let Primitive::Mesh(instance) = &drawable.primitive {
                    self.ray_caster.add(name, instance.clone());
                }
            }
            self.scene_entries.push(SceneEntry {
                owner: name.to_string(),
                primitive: drawable.primitive,
            });
        }
        participant.borrow_mut().on_scene_start(self);
    }

    fn promote_pending(&mut self) {
        let pending = self.pending.clone();
        for name in pending {
            let Some(participant) = self.participant(&name) else {
                self.pending.retain(|n| n.as_str() != name);
                continue;
            };
            if !participant.borrow_mut().is_ready() {
                continue;
            }
            self.pending.retain(|n| n.as_str() != name);
            debug!("participant '{name}' is ready, joining the scene");
            self.activate(&name, &participant);
        }
    }

    /// Retries queued notices whose recipient is now registered and free.
    /// The rest stay queued.
    fn flush_notices(&mut self) {
        let mut board = std::mem::take(&mut self.notices);
        let mut kept = VecDeque::new();
        while let Some(notice) = board.pop_front() {
            if !self.try_deliver(&notice.to, &notice.from, &notice.payload) {
                kept.push_back(notice);
            }
        }
        // Hooks may have queued fresh notices while we drained; they go
        // after the survivors to keep per-recipient FIFO order.
        kept.extend(std::mem::take(&mut self.notices));
        self.notices = kept;
    }

    /// Delivers every queued notice addressed to `name`, oldest first.
    fn deliver_notices_to(&mut self, name: &str) {
        let mut board = std::mem::take(&mut self.notices);
        let mut kept = VecDeque::new();
        while let Some(notice) = board.pop_front() {
            if notice.to != name || !self.try_deliver(&notice.to, &notice.from, &notice.payload) {
                kept.push_back(notice);
            }
        }
        kept.extend(std::mem::take(&mut self.notices));
        self.notices = kept;
    }

    fn try_deliver(&mut self, to: &str, from: &str, payload: &Message) -> bool {
        let Some(recipient) = self.participant(to) else {
            return false;
        };
        let Ok(mut participant) = recipient.try_borrow_mut() else {
            return false;
        };
        participant.on_message(self, from, payload.clone());
        true
    }

    fn view(&self, camera: CameraState) -> SceneView {
        let mut meshes = Vec::new();
        let mut lights = Vec::new();
        for entry in &self.scene_entries {
            match &entry.primitive {
                Primitive::Mesh(instance) => meshes.push(instance.clone()),
                Primitive::Light(light) => lights.push(light.clone()),
            }
        }
        SceneView {
            viewport: self.viewport,
            camera,
            meshes,
            lights,
        }
    }
}
