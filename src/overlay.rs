use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use glam::Vec2;
use log::warn;

use crate::config::{parse_color, CameraKind, UiConfig};
use crate::loaders::LoadProgress;
use crate::scene::SharedSprite;

/// How long a press must last before it counts as a hold.
const HOLD_DELAY: Duration = Duration::from_millis(500);

/// Requests raised by overlay widgets, drained by the application once per
/// frame and turned into coordinator calls or broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    SelectCamera(CameraKind),
    SetAutoOrbit(bool),
    PickColor(String),
    /// Seconds of animation to advance, already scaled from slider travel.
    Scrub(f32),
    ActivateAr,
}

/// Screen state of the video panel. Hotspot callbacks mutate it from the
/// scene side; the overlay draws it.
#[derive(Debug, Default)]
pub struct VideoPanel {
    pub visible: bool,
    pub position: Vec2,
}

pub type SharedVideoPanel = Rc<RefCell<VideoPanel>>;

impl VideoPanel {
    pub fn show_at(&mut self, position: Vec2) {
        self.visible = true;
        self.position = position;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

/// Immediate-mode UI model: loading screen while the model downloads, then
/// hotspot buttons, the louver slider, the color menu, the navigation bar
/// and the video panel.
///
/// Widgets never touch the scene directly. Gestures latch into the shared
/// sprites and everything else becomes an [`OverlayEvent`].
pub struct OverlayModel {
    enabled: bool,
    loading: bool,
    progress: LoadProgress,
    started: Instant,
    sprites: Vec<SharedSprite>,
    video: SharedVideoPanel,
    video_size: [f32; 2],
    palette: Vec<String>,
    slider_value: f32,
    slider_range: [f32; 2],
    scrub_scale: f32,
    camera_kind: CameraKind,
    auto_orbit: bool,
    events: Vec<OverlayEvent>,
}

impl OverlayModel {
    pub fn new(ui: &UiConfig, palette: Vec<String>, progress: LoadProgress, enabled: bool) -> Self {
        Self {
            enabled,
            loading: true,
            progress,
            started: Instant::now(),
            sprites: Vec::new(),
            video: Rc::new(RefCell::new(VideoPanel::default())),
            video_size: ui.video_size,
            palette,
            slider_value: ui.slider_range[0],
            slider_range: ui.slider_range,
            scrub_scale: ui.scrub_scale,
            camera_kind: CameraKind::Orbital,
            auto_orbit: false,
            events: Vec::new(),
        }
    }

    /// Handle the hotspot callbacks use to pop the panel open and shut.
    pub fn video_panel(&self) -> SharedVideoPanel {
        self.video.clone()
    }

    pub fn add_sprite(&mut self, sprite: SharedSprite) {
        self.sprites.push(sprite);
    }

    /// Flips the loading screen off once the model actor reports in.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_camera_kind(&mut self, kind: CameraKind) {
        self.camera_kind = kind;
    }

    pub fn set_auto_orbit(&mut self, on: bool) {
        self.auto_orbit = on;
    }

    pub fn take_events(&mut self) -> Vec<OverlayEvent> {
        std::mem::take(&mut self.events)
    }

    /// Draws the whole overlay for this frame.
    pub fn ui(&mut self, ctx: &egui::Context) {
        if !self.enabled {
            return;
        }
        if self.loading {
            self.loading_screen(ctx);
            return;
        }
        self.hotspot_buttons(ctx);
        self.video_window(ctx);
        self.louver_slider(ctx);
        self.color_menu(ctx);
        self.navigation_bar(ctx);
    }

    fn loading_screen(&mut self, ctx: &egui::Context) {
        let percent = self.progress.load(Ordering::Relaxed).min(100);
        // Trailing dots cycle every 100 ms, the way loading screens do.
        let dots = ".".repeat((self.started.elapsed().as_millis() / 100 % 3) as usize + 1);
        let text = if percent > 99 {
            format!("SETTING UP SCENE{dots}")
        } else {
            format!("LOADING{dots}   {percent}%")
        };
        egui::Window::new("loading")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(text)
                            .size(24.0)
                            .color(egui::Color32::WHITE),
                    );
                    ui.add_space(8.0);
                    ui.add(
                        egui::ProgressBar::new(percent as f32 / 100.0).desired_width(320.0),
                    );
                });
            });
    }

    fn hotspot_buttons(&mut self, ctx: &egui::Context) {
        for (index, sprite) in self.sprites.iter().enumerate() {
            let mut sprite = sprite.borrow_mut();
            if !sprite.visible {
                sprite.pressed_since = None;
                sprite.hold_fired = false;
                continue;
            }
            let position = egui::pos2(sprite.raster.x, sprite.raster.y);
            let response = egui::Window::new(format!("hotspot-{index}"))
                .title_bar(false)
                .resizable(false)
                .fixed_pos(position)
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    ui.button(
                        egui::RichText::new(&sprite.icon)
                            .size(22.0)
                            .color(egui::Color32::WHITE),
                    )
                })
                .and_then(|output| output.inner);
            let Some(response) = response else { continue };

            if response.double_clicked() {
                sprite.double_clicked = true;
            } else if response.clicked() {
                sprite.clicked = true;
            }
            if response.is_pointer_button_down_on() {
                let since = *sprite.pressed_since.get_or_insert_with(Instant::now);
                if !sprite.hold_fired && since.elapsed() >= HOLD_DELAY {
                    sprite.held = true;
                    sprite.hold_fired = true;
                }
            } else {
                sprite.pressed_since = None;
                sprite.hold_fired = false;
            }
        }
    }

    fn video_window(&mut self, ctx: &egui::Context) {
        let (visible, position) = {
            let video = self.video.borrow();
            (video.visible, video.position)
        };
        if !visible {
            return;
        }
        let mut close = false;
        egui::Window::new("video")
            .title_bar(false)
            .resizable(false)
            .fixed_pos(egui::pos2(position.x, position.y))
            .frame(egui::Frame::new().fill(egui::Color32::from_rgb(16, 16, 16)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Assembly video").color(egui::Color32::WHITE));
                    if ui.button("✕").clicked() {
                        close = true;
                    }
                });
                ui.add_sized(
                    [self.video_size[0], self.video_size[1]],
                    egui::Label::new(
                        egui::RichText::new("▶")
                            .size(48.0)
                            .color(egui::Color32::GRAY),
                    ),
                );
            });
        if close {
            self.video.borrow_mut().hide();
        }
    }

    fn louver_slider(&mut self, ctx: &egui::Context) {
        egui::Window::new("louvers")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("Louvers").color(egui::Color32::WHITE));
                let previous = self.slider_value;
                let response = ui.add(
                    egui::Slider::new(
                        &mut self.slider_value,
                        self.slider_range[0]..=self.slider_range[1],
                    )
                    .show_value(false),
                );
                if response.changed() && self.slider_value != previous {
                    // Travel is reported as previous minus current, scaled
                    // into seconds of animation.
                    self.events
                        .push(OverlayEvent::Scrub((previous - self.slider_value) * self.scrub_scale));
                }
            });
    }

    fn color_menu(&mut self, ctx: &egui::Context) {
        egui::Window::new("colors")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::LEFT_CENTER, egui::vec2(10.0, 0.0))
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                for hex in &self.palette {
                    let fill = match parse_color(hex) {
                        Ok([r, g, b]) => egui::Color32::from_rgb(
                            (r * 255.0) as u8,
                            (g * 255.0) as u8,
                            (b * 255.0) as u8,
                        ),
                        Err(err) => {
                            warn!("bad palette entry {hex}: {err}");
                            continue;
                        }
                    };
                    let swatch = egui::Button::new("").fill(fill).min_size(egui::vec2(28.0, 28.0));
                    if ui.add(swatch).clicked() {
                        self.events.push(OverlayEvent::PickColor(hex.clone()));
                    }
                }
            });
    }

    fn navigation_bar(&mut self, ctx: &egui::Context) {
        egui::Window::new("nav")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -10.0))
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui
                        .selectable_label(self.camera_kind == CameraKind::Orbital, "Orbit")
                        .clicked()
                    {
                        self.camera_kind = CameraKind::Orbital;
                        self.events
                            .push(OverlayEvent::SelectCamera(CameraKind::Orbital));
                    }
                    if ui
                        .selectable_label(self.camera_kind == CameraKind::FirstPerson, "Walk")
                        .clicked()
                    {
                        self.camera_kind = CameraKind::FirstPerson;
                        self.events
                            .push(OverlayEvent::SelectCamera(CameraKind::FirstPerson));
                    }
                    ui.separator();
                    if ui.selectable_label(self.auto_orbit, "Spin").clicked() {
                        self.auto_orbit = !self.auto_orbit;
                        self.events.push(OverlayEvent::SetAutoOrbit(self.auto_orbit));
                    }
                    if ui.button("View in AR").clicked() {
                        self.events.push(OverlayEvent::ActivateAr);
                    }
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OverlayModel {
        OverlayModel::new(
            &UiConfig::default(),
            vec!["#ffffff".into()],
            LoadProgress::default(),
            true,
        )
    }

    #[test]
    fn events_drain_once() {
        let mut overlay = model();
        overlay.events.push(OverlayEvent::ActivateAr);
        assert_eq!(overlay.take_events(), vec![OverlayEvent::ActivateAr]);
        assert!(overlay.take_events().is_empty());
    }

    #[test]
    fn video_panel_opens_where_asked() {
        let overlay = model();
        let panel = overlay.video_panel();
        panel.borrow_mut().show_at(Vec2::new(120.0, 80.0));
        assert!(panel.borrow().visible);
        assert_eq!(panel.borrow().position, Vec2::new(120.0, 80.0));
        panel.borrow_mut().hide();
        assert!(!panel.borrow().visible);
    }
}
