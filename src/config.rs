use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use glam::{Quat, Vec3};
use serde::Deserialize;

/// Which camera rig drives the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    Orbital,
    FirstPerson,
}

/// The product model and everything anchored to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// glTF file to load. `None` renders the built-in stand-in roof.
    pub path: Option<PathBuf>,
    pub position: [f32; 3],
    /// Invisible box that catches rays on behalf of the roof volume.
    pub collision_size: [f32; 3],
    /// World-space center of the collision box.
    pub collision_center: [f32; 3],
    /// Hotspot anchor relative to `position`.
    pub hotspot_offset: [f32; 3],
    /// Swatches offered by the color menu.
    pub palette: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            position: [2.0, -2.0, -3.0],
            collision_size: [4.75, 0.5, 3.3],
            collision_center: [-0.1, 0.5, -4.65],
            hotspot_offset: [-2.15, 2.6, 0.08],
            palette: vec![
                "#ffffff".into(),
                "#d6cfc4".into(),
                "#8a8d8f".into(),
                "#4a4e52".into(),
                "#2a2d2f".into(),
                "#7b3f00".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub kind: CameraKind,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Point the orbital camera circles and keeps looking at.
    pub pivot: [f32; 3],
    /// Degrees the orbit axis leans away from straight down, about -Z.
    pub tilt_deg: f32,
    pub auto_orbit_dps: f32,
    pub orbital_sensitivity: f32,
    pub first_person_sensitivity: f32,
}

impl CameraConfig {
    /// Yaw axis for the orbital camera: -Y leaned over by `tilt_deg`.
    pub fn orbit_axis(&self) -> Vec3 {
        Quat::from_axis_angle(Vec3::NEG_Z, self.tilt_deg.to_radians()) * Vec3::NEG_Y
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            kind: CameraKind::Orbital,
            fov_y_deg: 90.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 0.0],
            pivot: [0.0, 0.0, -5.0],
            tilt_deg: 20.0,
            auto_orbit_dps: 60.0,
            orbital_sensitivity: 0.5,
            first_person_sensitivity: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: [f32; 3],
    pub position: [f32; 3],
    pub color: String,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: [100.0, 0.1, 100.0],
            position: [0.0, -2.0, 0.0],
            color: "#44aa88".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: String,
    pub ambient_intensity: f32,
    pub sun_position: [f32; 3],
    pub sun_color: String,
    pub sun_intensity: f32,
    pub sun_gizmo_radius: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: "#ffffff".into(),
            ambient_intensity: 0.8,
            sun_position: [0.0, 150.0, 100.0],
            sun_color: "#ffffff".into(),
            sun_intensity: 0.2,
            sun_gizmo_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Seconds of animation per unit of slider travel. Negative so dragging
    /// right closes the louvers.
    pub scrub_scale: f32,
    pub slider_range: [f32; 2],
    pub video_size: [f32; 2],
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            scrub_scale: -(1.0 / 180.0),
            slider_range: [0.0, 180.0],
            video_size: [480.0, 270.0],
        }
    }
}

/// Everything the viewer needs to compose its scene, loadable from JSON
/// with every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub floor: FloorConfig,
    pub lighting: LightingConfig,
    pub ui: UiConfig,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Parses `#rrggbb` or `rgb(r, g, b)` into linear-ish RGB floats.
pub fn parse_color(text: &str) -> Result<[f32; 3]> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 {
            bail!("expected 6 hex digits in color '{text}'");
        }
        let value = u32::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex color '{text}'"))?;
        return Ok([
            ((value >> 16) & 0xff) as f32 / 255.0,
            ((value >> 8) & 0xff) as f32 / 255.0,
            (value & 0xff) as f32 / 255.0,
        ]);
    }
    if let Some(body) = text
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<&str> = body.split(',').map(str::trim).collect();
        if channels.len() != 3 {
            bail!("expected 3 channels in color '{text}'");
        }
        let mut rgb = [0.0f32; 3];
        for (slot, channel) in rgb.iter_mut().zip(&channels) {
            let byte: u32 = channel
                .parse()
                .with_context(|| format!("invalid channel in color '{text}'"))?;
            if byte > 255 {
                bail!("channel out of range in color '{text}'");
            }
            *slot = byte as f32 / 255.0;
        }
        return Ok(rgb);
    }
    bail!("unrecognized color format '{text}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_showroom_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.model.position, [2.0, -2.0, -3.0]);
        assert_eq!(config.camera.pivot, [0.0, 0.0, -5.0]);
        assert_eq!(config.camera.fov_y_deg, 90.0);
        assert!((config.ui.scrub_scale + 1.0 / 180.0).abs() < 1e-9);
    }

    #[test]
    fn orbit_axis_is_down_leaning_toward_x() {
        let axis = CameraConfig::default().orbit_axis();
        assert!((axis.length() - 1.0).abs() < 1e-6);
        // Rotating -Y about -Z by 20 degrees tips the axis toward -X.
        assert!((axis.y - (-(20.0f32.to_radians().cos()))).abs() < 1e-6);
        assert!(axis.x < 0.0);
        assert!(axis.z.abs() < 1e-6);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "camera": { "kind": "first-person" } }"#).unwrap();
        assert_eq!(config.camera.kind, CameraKind::FirstPerson);
        assert_eq!(config.camera.fov_y_deg, 90.0);
        assert_eq!(config.floor.color, "#44aa88");
    }

    #[test]
    fn color_parsing_accepts_hex_and_rgb() {
        assert_eq!(parse_color("#44aa88").unwrap(), [
            0x44 as f32 / 255.0,
            0xaa as f32 / 255.0,
            0x88 as f32 / 255.0
        ]);
        let rgb = parse_color("rgb(255, 0, 128)").unwrap();
        assert!((rgb[0] - 1.0).abs() < 1e-6);
        assert!(rgb[1].abs() < 1e-6);
        assert!((rgb[2] - 128.0 / 255.0).abs() < 1e-6);

        assert!(parse_color("#12345").is_err());
        assert!(parse_color("rgb(256, 0, 0)").is_err());
        assert!(parse_color("teal").is_err());
    }
}
