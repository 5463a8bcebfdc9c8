pub mod gltf;

pub use gltf::{
    load_model, spawn_load, AnimationChannel, LoadProgress, LoadedModel, ModelNode, NodePlacement,
};
