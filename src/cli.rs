// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::{CameraKind, ViewerConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "pergola-viewer")]
#[command(about = "Louvered-roof product configurator", long_about = None)]
pub struct Cli {
    /// Scene configuration file (JSON); built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// glTF model to load, overriding the config file
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Camera rig to start with, overriding the config file
    #[arg(long, value_enum)]
    pub camera: Option<CameraKind>,

    /// Disable UI elements and console output
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}

impl Cli {
    /// Folds command-line overrides into a loaded config.
    pub fn apply_to(&self, config: &mut ViewerConfig) {
        if let Some(model) = &self.model {
            config.model.path = Some(model.clone());
        }
        if let Some(camera) = self.camera {
            config.camera.kind = camera;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn overrides_beat_the_config_file() {
        let cli = Cli::parse_from([
            "pergola-viewer",
            "--model",
            "roof.glb",
            "--camera",
            "first-person",
        ]);
        let mut config = ViewerConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.model.path.as_deref(), Some(Path::new("roof.glb")));
        assert_eq!(config.camera.kind, CameraKind::FirstPerson);
    }

    #[test]
    fn absent_flags_leave_the_config_alone() {
        let cli = Cli::parse_from(["pergola-viewer"]);
        let mut config = ViewerConfig::default();
        cli.apply_to(&mut config);
        assert!(config.model.path.is_none());
        assert_eq!(config.camera.kind, CameraKind::Orbital);
        assert!(!cli.no_ui);
    }
}
