use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use pergola_viewer::actor::MeshActor;
use pergola_viewer::camera::OrbitalCameraManager;
use pergola_viewer::input::InputManager;
use pergola_viewer::math::PerspectiveProjection;
use pergola_viewer::scene::{Hotspot, SceneCoordinator};
use pergola_viewer::scenes::box_mesh;
use pergola_viewer::traits::{Message, SceneRenderer, SceneView};
use pergola_viewer::types::{MaterialDesc, Viewport};

const PIVOT: Vec3 = Vec3::new(0.0, 0.0, -5.0);
const ROOF_POSITION: Vec3 = Vec3::new(2.0, -2.0, -3.0);
const ROOF_SIZE: Vec3 = Vec3::new(4.75, 0.5, 3.3);
const PROXY_OFFSET: Vec3 = Vec3::new(-2.1, 2.5, -1.65);
const HOTSPOT_OFFSET: Vec3 = Vec3::new(-2.15, 2.6, 0.08);

struct ScratchRenderer;

impl SceneRenderer for ScratchRenderer {
    fn resize(&mut self, _viewport: Viewport) {}
    fn render(&mut self, _view: &SceneView) {}
}

/// Records the first mesh's color each frame, for watching restyles land.
#[derive(Default)]
struct ColorRenderer {
    colors: Vec<[f32; 4]>,
}

impl SceneRenderer for ColorRenderer {
    fn resize(&mut self, _viewport: Viewport) {}

    fn render(&mut self, view: &SceneView) {
        if let Some(instance) = view.meshes.first() {
            self.colors.push(instance.borrow().material.base_color);
        }
    }
}

/// Records the first mesh's texture id each frame.
#[derive(Default)]
struct TextureRenderer {
    texture_ids: Vec<Option<u64>>,
}

impl SceneRenderer for TextureRenderer {
    fn resize(&mut self, _viewport: Viewport) {}

    fn render(&mut self, view: &SceneView) {
        if let Some(instance) = view.meshes.first() {
            let id = instance.borrow().material.texture.as_ref().map(|t| t.id);
            self.texture_ids.push(id);
        }
    }
}

fn frame(coordinator: &mut SceneCoordinator) {
    coordinator.render_frame(&mut ScratchRenderer);
}

/// Coordinator with input exchanged and an active orbital camera at
/// `position`, looking at the pivot, warmed up by one frame.
fn scene(position: Vec3) -> (SceneCoordinator, Rc<RefCell<OrbitalCameraManager>>) {
    let mut coordinator = SceneCoordinator::new(Viewport::new(800.0, 800.0));
    coordinator.register(Rc::new(RefCell::new(InputManager::new("Input"))));
    let rig = Rc::new(RefCell::new(OrbitalCameraManager::new(
        "Camera",
        position,
        PIVOT,
        PerspectiveProjection::new(90.0, 1.0, 0.1, 1000.0),
        Vec3::NEG_Y,
        60.0,
    )));
    coordinator.register(rig.clone());
    coordinator.set_active_camera("Camera");
    frame(&mut coordinator);
    (coordinator, rig)
}

/// Roof actor with its invisible collision box, plus the hotspot anchor
/// point on the front-left corner of the model.
fn roof() -> (MeshActor, Vec3) {
    let roof = MeshActor::from_mesh(
        "Roof",
        box_mesh(ROOF_SIZE),
        MaterialDesc::default(),
        ROOF_POSITION,
    )
    .with_collision_proxy(ROOF_SIZE, PROXY_OFFSET);
    (roof, ROOF_POSITION + HOTSPOT_OFFSET)
}

#[cfg(test)]
mod hotspot_tests {
    use super::*;

    #[test]
    fn test_hotspot_tracks_its_anchor_on_screen() {
        let (mut coordinator, _rig) = scene(Vec3::ZERO);
        let (mut roof, anchor) = roof();
        let hotspot = Hotspot::new(anchor, "\u{2139}");
        let sprite = hotspot.sprite();
        roof.add_hotspot(hotspot);
        coordinator.register(Rc::new(RefCell::new(roof)));

        frame(&mut coordinator);

        let sprite = sprite.borrow();
        assert!(sprite.visible, "Unobstructed anchor should be on screen");
        assert!((sprite.raster.x - 379.4).abs() < 1.0, "Got {}", sprite.raster);
        assert!((sprite.raster.y - 317.8).abs() < 1.0, "Got {}", sprite.raster);
    }

    #[test]
    fn test_hotspot_hides_behind_the_collision_box() {
        // From behind the pivot the collision box sits between the camera
        // and the anchor.
        let (mut coordinator, _rig) = scene(Vec3::new(0.0, 0.0, -10.0));
        let (mut roof, anchor) = roof();
        let hotspot = Hotspot::new(anchor, "\u{2139}");
        let sprite = hotspot.sprite();
        roof.add_hotspot(hotspot);
        coordinator.register(Rc::new(RefCell::new(roof)));

        frame(&mut coordinator);
        assert!(!sprite.borrow().visible, "The box occludes the anchor");
    }

    #[test]
    fn test_click_fires_the_callback_at_the_sprite_position() {
        let (mut coordinator, _rig) = scene(Vec3::ZERO);
        let (mut roof, anchor) = roof();
        let mut hotspot = Hotspot::new(anchor, "\u{2139}");
        let sprite = hotspot.sprite();

        let clicked: Rc<Cell<Option<Vec2>>> = Rc::new(Cell::new(None));
        let held = Rc::new(Cell::new(false));
        let clicked_in = clicked.clone();
        let held_in = held.clone();
        hotspot.set_on_click(Box::new(move |raster| clicked_in.set(Some(raster))));
        hotspot.set_on_hold(Box::new(move |_| held_in.set(true)));
        roof.add_hotspot(hotspot);
        coordinator.register(Rc::new(RefCell::new(roof)));

        frame(&mut coordinator);
        assert_eq!(clicked.get(), None);

        // The overlay latches the gesture; the actor drains it next frame.
        sprite.borrow_mut().clicked = true;
        frame(&mut coordinator);

        let at = clicked.get().expect("Click callback should have fired");
        assert!((at.x - 379.4).abs() < 1.0);
        assert!((at.y - 317.8).abs() < 1.0);
        assert!(!held.get(), "No hold was latched");
    }

    #[test]
    fn test_double_click_sends_the_camera_toward_the_anchor() {
        let (mut coordinator, rig) = scene(Vec3::ZERO);
        let (mut roof, anchor) = roof();
        let hotspot = Hotspot::new(anchor, "\u{2139}");
        let sprite = hotspot.sprite();
        roof.add_hotspot(hotspot);
        coordinator.register(Rc::new(RefCell::new(roof)));
        frame(&mut coordinator);

        sprite.borrow_mut().double_clicked = true;
        frame(&mut coordinator);

        assert!(rig.borrow().is_zooming(), "Zoom glide should have started");
    }
}

#[cfg(test)]
mod styling_tests {
    use super::*;
    use pergola_viewer::types::TextureData;

    #[test]
    fn test_texture_swap_lands_on_the_material() {
        let mut actor = MeshActor::from_mesh(
            "Roof",
            box_mesh(ROOF_SIZE),
            MaterialDesc::default(),
            ROOF_POSITION,
        );
        let checker = Rc::new(TextureData::new(
            2,
            2,
            vec![
                255, 255, 255, 255, 0, 0, 0, 255, //
                0, 0, 0, 255, 255, 255, 255, 255,
            ],
        ));
        actor.apply_texture(checker.clone());

        let (mut coordinator, _rig) = scene(Vec3::ZERO);
        coordinator.register(Rc::new(RefCell::new(actor)));

        let mut renderer = TextureRenderer::default();
        coordinator.render_frame(&mut renderer);
        assert_eq!(renderer.texture_ids, vec![Some(checker.id)]);
    }

    #[test]
    fn test_color_message_restyles_the_meshes() {
        let (mut coordinator, _rig) = scene(Vec3::ZERO);
        let actor = MeshActor::from_mesh(
            "Roof",
            box_mesh(ROOF_SIZE),
            MaterialDesc::color([1.0, 1.0, 1.0, 0.8]),
            ROOF_POSITION,
        );
        coordinator.register(Rc::new(RefCell::new(actor)));

        let mut renderer = ColorRenderer::default();
        coordinator.render_frame(&mut renderer);
        coordinator.broadcast_to("Overlay", "Roof", Message::ApplyColor([0.2, 0.3, 0.4]));
        coordinator.render_frame(&mut renderer);

        assert_eq!(renderer.colors.len(), 2);
        assert_eq!(renderer.colors[0], [1.0, 1.0, 1.0, 0.8]);
        assert_eq!(
            renderer.colors[1],
            [0.2, 0.3, 0.4, 0.8],
            "New color keeps the material's alpha"
        );
    }
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_actor_stays_pending_while_its_model_is_missing() {
        let (mut coordinator, _rig) = scene(Vec3::ZERO);
        let actor = MeshActor::load(
            "Roof",
            PathBuf::from("/nonexistent/louvered-roof.glb"),
            ROOF_POSITION,
        );
        coordinator.register(Rc::new(RefCell::new(actor)));

        for _ in 0..3 {
            frame(&mut coordinator);
        }

        assert!(coordinator.is_pending("Roof"), "A failed load never joins");
        assert_eq!(coordinator.drawable_count(), 0);
    }
}
