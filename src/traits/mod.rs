pub mod camera;
pub mod participant;
pub mod renderer;

pub use camera::*;
pub use participant::*;
pub use renderer::*;
