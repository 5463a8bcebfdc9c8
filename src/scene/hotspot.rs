use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use glam::{Vec2, Vec3};

/// Screen-side state of a hotspot, shared between the [`Hotspot`] and the
/// overlay pass that draws it. The overlay latches gestures into the flags;
/// the hotspot drains them once per frame.
#[derive(Debug)]
pub struct HotspotSprite {
    /// Glyph shown on the overlay button.
    pub icon: String,
    pub raster: Vec2,
    pub visible: bool,
    pub clicked: bool,
    pub double_clicked: bool,
    pub held: bool,
    /// Overlay-internal press tracking for the hold gesture.
    pub pressed_since: Option<Instant>,
    pub hold_fired: bool,
}

pub type SharedSprite = Rc<RefCell<HotspotSprite>>;

pub type GestureCallback = Box<dyn FnMut(Vec2)>;

/// Gestures drained in one frame, after callbacks have run.
#[derive(Debug, Clone, Copy, Default)]
pub struct HotspotGestures {
    pub clicked: Option<Vec2>,
    pub double_clicked: bool,
    pub held: bool,
}

/// A world-anchored interaction point.
///
/// The owning actor reprojects the world position every frame and calls
/// `show`/`hide`/`set_raster_coordinates` with the result, so the sprite
/// tracks the anchor on screen and disappears while the anchor is occluded
/// or off-screen.
pub struct Hotspot {
    world_position: Vec3,
    sprite: SharedSprite,
    on_click: Option<GestureCallback>,
    on_double_click: Option<GestureCallback>,
    on_hold: Option<GestureCallback>,
    on_move: Option<GestureCallback>,
}

impl Hotspot {
    pub fn new(world_position: Vec3, icon: &str) -> Self {
        let sprite = HotspotSprite {
            icon: icon.to_string(),
            raster: Vec2::ZERO,
            visible: false,
            clicked: false,
            double_clicked: false,
            held: false,
            pressed_since: None,
            hold_fired: false,
        };
        Self {
            world_position,
            sprite: Rc::new(RefCell::new(sprite)),
            on_click: None,
            on_double_click: None,
            on_hold: None,
            on_move: None,
        }
    }

    /// Shared handle for the overlay pass.
    pub fn sprite(&self) -> SharedSprite {
        self.sprite.clone()
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    pub fn set_world_position(&mut self, position: Vec3) {
        self.world_position = position;
    }

    pub fn set_on_click(&mut self, callback: GestureCallback) {
        self.on_click = Some(callback);
    }

    pub fn set_on_double_click(&mut self, callback: GestureCallback) {
        self.on_double_click = Some(callback);
    }

    pub fn set_on_hold(&mut self, callback: GestureCallback) {
        self.on_hold = Some(callback);
    }

    /// Fires whenever the resolved raster coordinate changes.
    pub fn set_on_move(&mut self, callback: GestureCallback) {
        self.on_move = Some(callback);
    }

    pub fn is_visible(&self) -> bool {
        self.sprite.borrow().visible
    }

    pub fn show(&mut self) {
        let mut sprite = self.sprite.borrow_mut();
        if !sprite.visible {
            sprite.visible = true;
        }
    }

    pub fn hide(&mut self) {
        let mut sprite = self.sprite.borrow_mut();
        if sprite.visible {
            sprite.visible = false;
        }
    }

    /// Moves the sprite. A changed coordinate fires the move callback, the
    /// very first placement included.
    pub fn set_raster_coordinates(&mut self, raster: Vec2) {
        let moved = {
            let mut sprite = self.sprite.borrow_mut();
            let moved = sprite.raster != raster;
            sprite.raster = raster;
            moved
        };
        if moved {
            if let Some(callback) = self.on_move.as_mut() {
                callback(raster);
            }
        }
    }

    /// Clears the sprite's gesture latches, firing the matching callbacks.
    pub fn drain_gestures(&mut self) -> HotspotGestures {
        let (raster, clicked, double_clicked, held) = {
            let mut sprite = self.sprite.borrow_mut();
            let raster = sprite.raster;
            let clicked = std::mem::take(&mut sprite.clicked);
            let double_clicked = std::mem::take(&mut sprite.double_clicked);
            let held = std::mem::take(&mut sprite.held);
            (raster, clicked, double_clicked, held)
        };

        if clicked {
            if let Some(callback) = self.on_click.as_mut() {
                callback(raster);
            }
        }
        if double_clicked {
            if let Some(callback) = self.on_double_click.as_mut() {
                callback(raster);
            }
        }
        if held {
            if let Some(callback) = self.on_hold.as_mut() {
                callback(raster);
            }
        }

        HotspotGestures {
            clicked: clicked.then_some(raster),
            double_clicked,
            held,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn show_and_hide_toggle_the_sprite() {
        let mut hotspot = Hotspot::new(Vec3::ZERO, "i");
        assert!(!hotspot.is_visible(), "Hotspots start hidden");
        hotspot.show();
        hotspot.show();
        assert!(hotspot.is_visible());
        hotspot.hide();
        assert!(!hotspot.is_visible());
    }

    #[test]
    fn move_callback_fires_only_on_change() {
        let mut hotspot = Hotspot::new(Vec3::ZERO, "i");
        let moves = Rc::new(Cell::new(0));
        let counter = moves.clone();
        hotspot.set_on_move(Box::new(move |_| counter.set(counter.get() + 1)));

        hotspot.set_raster_coordinates(Vec2::new(10.0, 10.0));
        hotspot.set_raster_coordinates(Vec2::new(10.0, 10.0));
        hotspot.set_raster_coordinates(Vec2::new(12.0, 10.0));
        assert_eq!(moves.get(), 2, "First placement and one move");
    }

    #[test]
    fn drained_gestures_fire_callbacks_and_clear() {
        let mut hotspot = Hotspot::new(Vec3::ZERO, "i");
        let clicks = Rc::new(Cell::new(None));
        let sink = clicks.clone();
        hotspot.set_on_click(Box::new(move |at| sink.set(Some(at))));

        {
            let sprite = hotspot.sprite();
            let mut sprite = sprite.borrow_mut();
            sprite.raster = Vec2::new(40.0, 60.0);
            sprite.clicked = true;
            sprite.double_clicked = true;
        }

        let gestures = hotspot.drain_gestures();
        assert_eq!(gestures.clicked, Some(Vec2::new(40.0, 60.0)));
        assert!(gestures.double_clicked);
        assert!(!gestures.held);
        assert_eq!(clicks.get(), Some(Vec2::new(40.0, 60.0)));

        let again = hotspot.drain_gestures();
        assert!(again.clicked.is_none(), "Latches drain on read");
        assert!(!again.double_clicked);
    }
}
