use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use glam::Vec3;
use log::{info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::actor::{MeshActor, StaticActor};
use crate::camera::{FirstPersonCameraManager, OrbitalCameraManager};
use crate::config::{parse_color, CameraKind, ViewerConfig};
use crate::input::InputManager;
use crate::light::{AmbientLight, DirectLight};
use crate::math::PerspectiveProjection;
use crate::overlay::{OverlayEvent, OverlayModel, SharedVideoPanel};
use crate::renderer::ForwardRenderer;
use crate::scene::{Hotspot, SceneCoordinator};
use crate::scenes::{box_mesh, louvered_roof};
use crate::traits::{Message, SceneRenderer};
use crate::types::{MaterialDesc, Viewport};

const WINDOW_TITLE: &str = "Pergola Viewer";
const INITIAL_WINDOW_WIDTH: u32 = 1280;
const INITIAL_WINDOW_HEIGHT: u32 = 720;

const ROOF: &str = "Roof";
const ORBITAL_CAMERA: &str = "Camera";
const WALK_CAMERA: &str = "WalkCamera";
const OVERLAY_SENDER: &str = "Overlay";

fn camera_name(kind: CameraKind) -> &'static str {
    match kind {
        CameraKind::Orbital => ORBITAL_CAMERA,
        CameraKind::FirstPerson => WALK_CAMERA,
    }
}

/// Owns the window, the scene and the renderer, and routes window events
/// between them.
///
/// The scene is assembled up front; the renderer only exists once the event
/// loop delivers `resumed` and a window can be created.
pub struct App {
    coordinator: SceneCoordinator,
    input: Rc<RefCell<InputManager>>,
    roof: Rc<RefCell<MeshActor>>,
    hotspot_offset: Vec3,
    hotspot_placed: bool,
    video: SharedVideoPanel,
    overlay: Option<OverlayModel>,
    window: Option<Arc<Window>>,
    renderer: Option<ForwardRenderer>,
}

impl App {
    pub fn new(config: ViewerConfig, ui_enabled: bool) -> Result<Self> {
        let viewport = Viewport::new(INITIAL_WINDOW_WIDTH as f32, INITIAL_WINDOW_HEIGHT as f32);
        let mut coordinator = SceneCoordinator::new(viewport);

        let position = Vec3::from_array(config.model.position);
        let roof_actor = match &config.model.path {
            Some(path) => MeshActor::load(ROOF, path.clone(), position),
            None => MeshActor::from_mesh(ROOF, louvered_roof(), MaterialDesc::default(), position),
        };
        let collision_center = Vec3::from_array(config.model.collision_center);
        let roof_actor = roof_actor.with_collision_proxy(
            Vec3::from_array(config.model.collision_size),
            collision_center - position,
        );
        let progress = roof_actor.load_progress();
        let roof = Rc::new(RefCell::new(roof_actor));
        coordinator.register(roof.clone());

        let pivot = Vec3::from_array(config.camera.pivot);
        let camera_position = Vec3::from_array(config.camera.position);
        let projection = PerspectiveProjection::new(
            config.camera.fov_y_deg,
            viewport.aspect_ratio(),
            config.camera.near,
            config.camera.far,
        );
        let mut orbital = OrbitalCameraManager::new(
            ORBITAL_CAMERA,
            camera_position,
            pivot,
            projection,
            config.camera.orbit_axis(),
            config.camera.auto_orbit_dps,
        );
        orbital.set_drag_sensitivity(config.camera.orbital_sensitivity);
        coordinator.register(Rc::new(RefCell::new(orbital)));

        let mut walker =
            FirstPersonCameraManager::new(WALK_CAMERA, camera_position, pivot, projection);
        walker.set_look_sensitivity(config.camera.first_person_sensitivity);
        coordinator.register(Rc::new(RefCell::new(walker)));
        coordinator.set_active_camera(camera_name(config.camera.kind));

        let sun = DirectLight::new(
            "DirectLight",
            Vec3::from_array(config.lighting.sun_position),
            pivot,
            parse_color(&config.lighting.sun_color)?,
            config.lighting.sun_intensity,
        )
        .with_gizmo(config.lighting.sun_gizmo_radius);
        coordinator.register(Rc::new(RefCell::new(sun)));

        let floor_color = parse_color(&config.floor.color)?;
        let floor = StaticActor::new(
            "Floor",
            box_mesh(Vec3::from_array(config.floor.size)),
            MaterialDesc::color([floor_color[0], floor_color[1], floor_color[2], 1.0]),
            Vec3::from_array(config.floor.position),
        );
        coordinator.register(Rc::new(RefCell::new(floor)));

        coordinator.register(Rc::new(RefCell::new(AmbientLight::new(
            "AmbientLight",
            parse_color(&config.lighting.ambient_color)?,
            config.lighting.ambient_intensity,
        ))));

        let input = Rc::new(RefCell::new(InputManager::new("Input")));
        coordinator.register(input.clone());

        let mut overlay = OverlayModel::new(
            &config.ui,
            config.model.palette.clone(),
            progress,
            ui_enabled,
        );
        overlay.set_camera_kind(config.camera.kind);
        let video = overlay.video_panel();

        Ok(Self {
            coordinator,
            input,
            roof,
            hotspot_offset: Vec3::from_array(config.model.hotspot_offset),
            hotspot_placed: false,
            video,
            overlay: Some(overlay),
            window: None,
            renderer: None,
        })
    }

    fn redraw(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let loaded = self.roof.borrow().is_loaded();

        // The hotspot waits for the model; click opens the assembly video at
        // the click point, holding or dragging the view closes it.
        if loaded && !self.hotspot_placed {
            let anchor = self.roof.borrow().position() + self.hotspot_offset;
            let mut hotspot = Hotspot::new(anchor, "\u{2139}");

            let video = self.video.clone();
            hotspot.set_on_click(Box::new(move |raster| video.borrow_mut().show_at(raster)));
            let video = self.video.clone();
            hotspot.set_on_hold(Box::new(move |_| video.borrow_mut().hide()));
            let video = self.video.clone();
            hotspot.set_on_move(Box::new(move |_| video.borrow_mut().hide()));

            renderer.overlay_mut().add_sprite(hotspot.sprite());
            self.roof.borrow_mut().add_hotspot(hotspot);
            self.hotspot_placed = true;
        }

        renderer.overlay_mut().set_loading(!loaded);

        self.coordinator.render_frame(renderer);

        for event in renderer.overlay_mut().take_events() {
            match event {
                OverlayEvent::SelectCamera(kind) => {
                    self.coordinator.set_active_camera(camera_name(kind));
                    renderer.overlay_mut().set_camera_kind(kind);
                }
                OverlayEvent::SetAutoOrbit(enabled) => {
                    self.coordinator.broadcast_to(
                        OVERLAY_SENDER,
                        ORBITAL_CAMERA,
                        Message::SetAutoOrbit(enabled),
                    );
                    renderer.overlay_mut().set_auto_orbit(enabled);
                }
                OverlayEvent::PickColor(swatch) => match parse_color(&swatch) {
                    Ok(rgb) => {
                        self.coordinator
                            .broadcast_to(OVERLAY_SENDER, ROOF, Message::ApplyColor(rgb));
                    }
                    Err(err) => warn!("ignoring swatch '{swatch}': {err}"),
                },
                OverlayEvent::Scrub(delta) => {
                    self.coordinator
                        .broadcast_to(OVERLAY_SENDER, ROOF, Message::ScrubAnimation(delta));
                }
                OverlayEvent::ActivateAr => {
                    info!("AR viewing is not available on this platform");
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                Window::default_attributes()
                    .with_title(WINDOW_TITLE)
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        INITIAL_WINDOW_WIDTH,
                        INITIAL_WINDOW_HEIGHT,
                    )),
            ) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    eprintln!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            let Some(overlay) = self.overlay.take() else {
                return;
            };
            let renderer = match pollster::block_on(ForwardRenderer::new(window.clone(), overlay)) {
                Ok(renderer) => renderer,
                Err(e) => {
                    eprintln!("Failed to initialize renderer: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            self.window = Some(window);
            self.renderer = Some(renderer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let Some(renderer) = &mut self.renderer {
            if renderer.handle_event(&event) {
                return; // egui consumed the event
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let viewport = Viewport::new(size.width as f32, size.height as f32);
                self.coordinator.resize(viewport);
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(viewport);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            other => self.input.borrow_mut().process_event(&other),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
