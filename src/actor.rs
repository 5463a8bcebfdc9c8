use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use anyhow::Result;
use futures::channel::oneshot;
use glam::{Mat4, Quat, Vec3};
use log::{debug, error, info};

use crate::loaders::{spawn_load, AnimationChannel, LoadProgress, LoadedModel, NodePlacement};
use crate::scene::{Hotspot, SceneCoordinator};
use crate::scenes::box_mesh;
use crate::traits::{Drawable, Message, SceneParticipant, SharedInstance};
use crate::types::{MaterialDesc, MeshData, MeshInstance, TextureData};

/// Keyframe playhead over the rotation tracks of a loaded model.
///
/// Time wraps around the clip, in both directions, so a slider can scrub
/// backwards past zero.
pub struct AnimationMixer {
    channels: Vec<AnimationChannel>,
    duration: f32,
    time: f32,
    playing: bool,
}

impl AnimationMixer {
    pub fn new(channels: Vec<AnimationChannel>, duration: f32) -> Self {
        Self {
            channels,
            duration,
            time: 0.0,
            playing: false,
        }
    }

    pub fn advance(&mut self, delta: f32) {
        if self.duration <= 0.0 {
            return;
        }
        self.time = (self.time + delta).rem_euclid(self.duration);
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Current rotation for a node, if any track targets it.
    pub fn sample(&self, node_index: usize) -> Option<Quat> {
        self.channels
            .iter()
            .find(|channel| channel.node_index == node_index)
            .map(|channel| channel.sample(self.time))
    }
}

/// A product model in the scene.
///
/// Loads its glTF on a background thread and reports unready until the
/// result lands, which keeps it in the coordinator's pending set; the first
/// frame after the model arrives it joins the render set. Owns the model's
/// hotspots and drives their on-screen lifecycle from the coordinator's
/// nearest-surface projection query.
pub struct MeshActor {
    name: String,
    position: Vec3,
    zoom_camera: String,
    receiver: Option<oneshot::Receiver<Result<LoadedModel>>>,
    progress: LoadProgress,
    instances: Vec<SharedInstance>,
    bindings: Vec<(SharedInstance, NodePlacement)>,
    proxy: Option<SharedInstance>,
    mixer: Option<AnimationMixer>,
    hotspots: Vec<Hotspot>,
    pending_color: Option<[f32; 3]>,
    pending_texture: Option<Rc<TextureData>>,
    ready: bool,
}

impl MeshActor {
    /// Actor whose model loads from `path` in the background.
    pub fn load(name: &str, path: PathBuf, position: Vec3) -> Self {
        let (receiver, progress) = spawn_load(path);
        Self {
            name: name.to_string(),
            position,
            zoom_camera: "Camera".to_string(),
            receiver: Some(receiver),
            progress,
            instances: Vec::new(),
            bindings: Vec::new(),
            proxy: None,
            mixer: None,
            hotspots: Vec::new(),
            pending_color: None,
            pending_texture: None,
            ready: false,
        }
    }

    /// Actor over an already-built mesh; ready from the start.
    pub fn from_mesh(name: &str, mesh: MeshData, material: MaterialDesc, position: Vec3) -> Self {
        let mut instance = MeshInstance::at(Rc::new(mesh), position);
        instance.material = material;
        Self {
            name: name.to_string(),
            position,
            zoom_camera: "Camera".to_string(),
            receiver: None,
            progress: Arc::new(AtomicU8::new(100)),
            instances: vec![Rc::new(RefCell::new(instance))],
            bindings: Vec::new(),
            proxy: None,
            mixer: None,
            hotspots: Vec::new(),
            pending_color: None,
            pending_texture: None,
            ready: true,
        }
    }

    /// Adds an invisible, ray-castable box around the model so hotspot
    /// occlusion queries have a cheap surface to hit.
    pub fn with_collision_proxy(mut self, size: Vec3, offset: Vec3) -> Self {
        let mut instance =
            MeshInstance::at(Rc::new(box_mesh(size)), self.position + offset);
        instance.visible = false;
        self.proxy = Some(Rc::new(RefCell::new(instance)));
        self
    }

    /// Names the camera that receives zoom requests from hotspot
    /// double-clicks.
    pub fn with_zoom_camera(mut self, name: &str) -> Self {
        self.zoom_camera = name.to_string();
        self
    }

    pub fn add_hotspot(&mut self, hotspot: Hotspot) {
        self.hotspots.push(hotspot);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Load progress handle for the loading screen.
    pub fn load_progress(&self) -> LoadProgress {
        self.progress.clone()
    }

    /// Whether the model is in; unlike the readiness poll this never
    /// advances loading.
    pub fn is_loaded(&self) -> bool {
        self.ready
    }

    pub fn set_animation_playing(&mut self, playing: bool) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.set_playing(playing);
        }
    }

    pub fn apply_color(&mut self, rgb: [f32; 3]) {
        self.pending_color = Some(rgb);
        for instance in &self.instances {
            let mut instance = instance.borrow_mut();
            let alpha = instance.material.base_color[3];
            instance.material.base_color = [rgb[0], rgb[1], rgb[2], alpha];
        }
    }

    pub fn apply_texture(&mut self, texture: Rc<TextureData>) {
        self.pending_texture = Some(texture.clone());
        for instance in &self.instances {
            instance.borrow_mut().material.texture = Some(texture.clone());
        }
    }

    /// Advances the mixer by `delta` seconds and reposes the louvers.
    pub fn scrub_animation(&mut self, delta: f32) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.advance(delta);
        }
        self.apply_animation();
    }

    fn poll_loader(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(None) => {}
            Ok(Some(Ok(model))) => {
                self.receiver = None;
                self.install_model(model);
            }
            Ok(Some(Err(err))) => {
                self.receiver = None;
                error!("actor '{}' failed to load its model: {err:#}", self.name);
            }
            Err(_) => {
                self.receiver = None;
                error!("actor '{}': model loader went away without a result", self.name);
            }
        }
    }

    fn install_model(&mut self, model: LoadedModel) {
        let root = Mat4::from_translation(self.position);
        let textures: Vec<Rc<TextureData>> = model.textures.into_iter().map(Rc::new).collect();

        for node in model.nodes {
            let mut instance = MeshInstance::new(Rc::new(node.mesh));
            instance.transform = root * node.placement.transform();
            instance.material = MaterialDesc {
                base_color: node.base_color,
                texture: node.texture_index.and_then(|i| textures.get(i).cloned()),
                unlit: false,
            };
            let shared = Rc::new(RefCell::new(instance));
            self.bindings.push((shared.clone(), node.placement));
            self.instances.push(shared);
        }

        if !model.channels.is_empty() {
            self.mixer = Some(AnimationMixer::new(model.channels, model.duration));
        }

        // Styling that arrived while the model was still loading.
        if let Some(color) = self.pending_color {
            self.apply_color(color);
        }
        if let Some(texture) = self.pending_texture.clone() {
            self.apply_texture(texture);
        }

        self.ready = true;
        info!(
            "actor '{}' model installed, {} mesh nodes",
            self.name,
            self.instances.len()
        );
    }

    fn apply_animation(&mut self) {
        let Some(mixer) = &self.mixer else { return };
        let root = Mat4::from_translation(self.position);
        for (instance, placement) in &self.bindings {
            if let Some(rotation) = mixer.sample(placement.node_index) {
                instance.borrow_mut().transform =
                    root * placement.transform_with_rotation(rotation);
            }
        }
    }
}

impl SceneParticipant for MeshActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_drawable(&self) -> bool {
        true
    }

    fn is_ready(&mut self) -> bool {
        if !self.ready {
            self.poll_loader();
        }
        self.ready
    }

    fn drawables(&self) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        if let Some(proxy) = &self.proxy {
            drawables.push(Drawable::ray_castable_mesh(proxy.clone()));
        }
        for instance in &self.instances {
            drawables.push(Drawable::mesh(instance.clone()));
        }
        drawables
    }

    fn on_scene_start(&mut self, _coordinator: &mut SceneCoordinator) {
        debug!("actor '{}' joined the scene", self.name);
    }

    fn on_frame(&mut self, coordinator: &mut SceneCoordinator) {
        if self.mixer.as_ref().is_some_and(AnimationMixer::is_playing) {
            let delta = coordinator.frame_delta();
            self.scrub_animation(delta);
        }

        let mut zoom_points = Vec::new();
        for hotspot in &mut self.hotspots {
            match coordinator.raster_coord_if_nearest(hotspot.world_position()) {
                Some(raster) => {
                    hotspot.set_raster_coordinates(raster);
                    hotspot.show();
                }
                None => hotspot.hide(),
            }
            if hotspot.drain_gestures().double_clicked {
                zoom_points.push(hotspot.world_position());
            }
        }
        let sender = self.name.clone();
        let recipient = self.zoom_camera.clone();
        for point in zoom_points {
            coordinator.broadcast_to(&sender, &recipient, Message::ZoomToPoint(point));
        }
    }

    fn on_message(&mut self, _coordinator: &mut SceneCoordinator, _sender: &str, message: Message) {
        match message {
            Message::ScrubAnimation(delta) => self.scrub_animation(delta),
            Message::ApplyColor(rgb) => self.apply_color(rgb),
            _ => {}
        }
    }
}

/// Fixed scenery mesh, color- and texture-swappable but never animated.
/// Ready immediately; its mesh doubles as a ray-cast surface.
pub struct StaticActor {
    name: String,
    instance: SharedInstance,
}

impl StaticActor {
    pub fn new(name: &str, mesh: MeshData, material: MaterialDesc, position: Vec3) -> Self {
        let mut instance = MeshInstance::at(Rc::new(mesh), position);
        instance.material = material;
        Self {
            name: name.to_string(),
            instance: Rc::new(RefCell::new(instance)),
        }
    }

    pub fn apply_color(&mut self, rgb: [f32; 3]) {
        let mut instance = self.instance.borrow_mut();
        let alpha = instance.material.base_color[3];
        instance.material.base_color = [rgb[0], rgb[1], rgb[2], alpha];
    }

    pub fn apply_texture(&mut self, texture: Rc<TextureData>) {
        self.instance.borrow_mut().material.texture = Some(texture);
    }
}

impl SceneParticipant for StaticActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_drawable(&self) -> bool {
        true
    }

    fn drawables(&self) -> Vec<Drawable> {
        vec![Drawable::ray_castable_mesh(self.instance.clone())]
    }
}
