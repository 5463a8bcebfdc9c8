mod first_person;
mod orbital;

pub use first_person::FirstPersonCameraManager;
pub use orbital::OrbitalCameraManager;
