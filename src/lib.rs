pub mod actor;
pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod input;
pub mod light;
pub mod loaders;
pub mod math;
pub mod overlay;
pub mod renderer;
pub mod scene;
pub mod scenes;
pub mod timing;
pub mod traits;
pub mod types;

pub use scene::{Hotspot, OrbitController, RayCaster, SceneCoordinator};
pub use traits::{Message, SceneParticipant};
