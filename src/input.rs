use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::time::Instant;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::scene::SceneCoordinator;
use crate::traits::{Message, SceneParticipant};

/// Keys the cameras care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
}

/// Two presses this close together, and this close on screen, make a
/// double click.
const DOUBLE_CLICK_WINDOW_SECS: f32 = 0.4;
const DOUBLE_CLICK_RADIUS: f32 = 24.0;

/// Releasing with less accumulated movement than this still counts as a
/// click; anything longer was a drag.
const CLICK_SLOP: f32 = 6.0;

#[derive(Debug)]
struct InputState {
    pressed: HashSet<Key>,
    cursor: Option<Vec2>,
    dragging: bool,
    drag_delta: Vec2,
    drag_travel: f32,
    sensitivity: f32,
    clicks: VecDeque<Vec2>,
    double_clicks: VecDeque<Vec2>,
    last_click: Option<(Instant, Vec2)>,
}

impl InputState {
    fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            cursor: None,
            dragging: false,
            drag_delta: Vec2::ZERO,
            drag_travel: 0.0,
            sensitivity: 1.0,
            clicks: VecDeque::new(),
            double_clicks: VecDeque::new(),
            last_click: None,
        }
    }
}

/// Shared view of the pointer and keyboard state.
///
/// The window loop feeds events in through the mutators; cameras poll
/// through the `take_*` accessors, which drain what they return. Handed to
/// cameras by the input participant over the notice board.
#[derive(Debug, Clone)]
pub struct InputHandle {
    state: Rc<RefCell<InputState>>,
}

impl InputHandle {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(InputState::new())),
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.state.borrow().pressed.contains(&key)
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.state.borrow().cursor
    }

    /// Pixel deltas scale by this before accumulating; each camera sets its
    /// own feel when it becomes active.
    pub fn set_cursor_sensitivity(&self, sensitivity: f32) {
        self.state.borrow_mut().sensitivity = sensitivity;
    }

    /// Accumulated drag movement since the last take, already scaled.
    pub fn take_drag_delta(&self) -> Vec2 {
        let mut state = self.state.borrow_mut();
        std::mem::replace(&mut state.drag_delta, Vec2::ZERO)
    }

    pub fn take_click(&self) -> Option<Vec2> {
        self.state.borrow_mut().clicks.pop_front()
    }

    pub fn take_double_click(&self) -> Option<Vec2> {
        self.state.borrow_mut().double_clicks.pop_front()
    }

    pub fn press(&self, key: Key) {
        self.state.borrow_mut().pressed.insert(key);
    }

    pub fn release(&self, key: Key) {
        self.state.borrow_mut().pressed.remove(&key);
    }

    pub fn begin_drag(&self) {
        let mut state = self.state.borrow_mut();
        state.dragging = true;
        state.drag_travel = 0.0;
    }

    /// Ends a drag; a short one lands on the click queues.
    pub fn end_drag(&self) {
        let mut state = self.state.borrow_mut();
        state.dragging = false;
        let Some(position) = state.cursor else { return };
        if state.drag_travel > CLICK_SLOP {
            return;
        }

        let now = Instant::now();
        let doubled = state.last_click.is_some_and(|(at, there)| {
            now.duration_since(at).as_secs_f32() < DOUBLE_CLICK_WINDOW_SECS
                && position.distance(there) < DOUBLE_CLICK_RADIUS
        });
        state.clicks.push_back(position);
        if doubled {
            state.double_clicks.push_back(position);
            state.last_click = None;
        } else {
            state.last_click = Some((now, position));
        }
    }

    pub fn move_cursor(&self, position: Vec2) {
        let mut state = self.state.borrow_mut();
        if state.dragging {
            if let Some(previous) = state.cursor {
                let delta = position - previous;
                state.drag_travel += delta.length();
                let scaled = delta * state.sensitivity;
                state.drag_delta += scaled;
            }
        }
        state.cursor = Some(position);
    }
}

impl Default for InputHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene participant owning the input handle.
///
/// Cameras do not get the handle injected; they broadcast
/// [`Message::InputHandleRequest`] when they become active and this
/// participant replies with a handle clone. The coordinator's notice board
/// makes the exchange order-independent: a camera activated before the input
/// participant registers still gets its reply.
pub struct InputManager {
    name: String,
    handle: InputHandle,
}

impl InputManager {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: InputHandle::new(),
        }
    }

    pub fn handle(&self) -> InputHandle {
        self.handle.clone()
    }

    /// Feeds one window event into the shared state.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = map_key(code) else { return };
                match event.state {
                    ElementState::Pressed => self.handle.press(key),
                    ElementState::Released => self.handle.release(key),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle
                    .move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.handle.begin_drag(),
                ElementState::Released => self.handle.end_drag(),
            },
            _ => {}
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        _ => None,
    }
}

impl SceneParticipant for InputManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_message(&mut self, coordinator: &mut SceneCoordinator, sender: &str, message: Message) {
        if let Message::InputHandleRequest = message {
            let name = self.name.clone();
            coordinator.broadcast_to(&name, sender, Message::InputHandle(self.handle.clone()));
        }
    }
}
