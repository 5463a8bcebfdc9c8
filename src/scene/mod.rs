mod coordinator;
mod hotspot;
mod orbit;
mod raycast;

pub use coordinator::SceneCoordinator;
pub use hotspot::{Hotspot, HotspotGestures, HotspotSprite, SharedSprite};
pub use orbit::{MoveConstraint, OrbitController};
pub use raycast::RayCaster;
