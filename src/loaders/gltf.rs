use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::channel::oneshot;
use glam::{Mat4, Quat, Vec3};
use log::{debug, info, warn};

use crate::types::{MeshData, TextureData, Vertex};

/// Percentage of the load done so far, shared with the loading screen.
pub type LoadProgress = Arc<AtomicU8>;

/// Where a mesh primitive sits in the model. The local TRS stays decomposed
/// so an animation can swap the rotation and recompose.
#[derive(Debug, Clone, Copy)]
pub struct NodePlacement {
    pub node_index: usize,
    pub parent_transform: Mat4,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodePlacement {
    /// Model-space transform with the rest rotation swapped for `sampled`.
    pub fn transform_with_rotation(&self, sampled: Quat) -> Mat4 {
        self.parent_transform
            * Mat4::from_scale_rotation_translation(self.scale, sampled, self.translation)
    }

    pub fn transform(&self) -> Mat4 {
        self.transform_with_rotation(self.rotation)
    }
}

/// One mesh primitive plus its placement and material inputs.
#[derive(Debug)]
pub struct ModelNode {
    pub mesh: MeshData,
    pub base_color: [f32; 4],
    pub texture_index: Option<usize>,
    pub placement: NodePlacement,
}

/// Keyframed rotation track for one node.
#[derive(Debug)]
pub struct AnimationChannel {
    pub node_index: usize,
    pub times: Vec<f32>,
    pub rotations: Vec<Quat>,
}

impl AnimationChannel {
    /// Keyframe-interpolated rotation at `time`, clamped to the track ends.
    pub fn sample(&self, time: f32) -> Quat {
        match self.times.iter().position(|&t| t > time) {
            None => self.rotations[self.rotations.len() - 1],
            Some(0) => self.rotations[0],
            Some(next) => {
                let prev = next - 1;
                let span = self.times[next] - self.times[prev];
                let s = if span > 0.0 {
                    (time - self.times[prev]) / span
                } else {
                    0.0
                };
                self.rotations[prev].slerp(self.rotations[next], s)
            }
        }
    }
}

/// Everything extracted from one glTF file.
#[derive(Debug)]
pub struct LoadedModel {
    pub nodes: Vec<ModelNode>,
    pub textures: Vec<TextureData>,
    pub channels: Vec<AnimationChannel>,
    pub duration: f32,
}

/// Kicks the load off on a background thread. The result arrives on the
/// returned channel; the progress handle is live immediately.
pub fn spawn_load(path: PathBuf) -> (oneshot::Receiver<Result<LoadedModel>>, LoadProgress) {
    let (sender, receiver) = oneshot::channel();
    let progress: LoadProgress = Arc::new(AtomicU8::new(0));
    let thread_progress = progress.clone();
    std::thread::spawn(move || {
        let result = load_model(&path, &thread_progress);
        // A dropped receiver just means the actor went away first.
        let _ = sender.send(result);
    });
    (receiver, progress)
}

/// Loads a glTF/glb file: mesh nodes, decoded textures, rotation tracks.
pub fn load_model(path: &Path, progress: &LoadProgress) -> Result<LoadedModel> {
    info!("loading model {:?}", path);
    let (gltf, buffers, images) =
        gltf::import(path).context(format!("Failed to load glTF file: {:?}", path))?;
    progress.store(10, Ordering::Relaxed);

    let mut nodes = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            collect_nodes(&node, &buffers, Mat4::IDENTITY, &mut nodes)?;
        }
    }
    progress.store(50, Ordering::Relaxed);

    let textures: Vec<TextureData> = images.iter().map(decode_image).collect();
    progress.store(80, Ordering::Relaxed);

    let mut channels = Vec::new();
    let mut duration = 0.0f32;
    for animation in gltf.animations() {
        for channel in animation.channels() {
            if channel.target().property() != gltf::animation::Property::Rotation {
                continue;
            }
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let times: Vec<f32> = match reader.read_inputs() {
                Some(inputs) => inputs.collect(),
                None => continue,
            };
            let rotations: Vec<Quat> = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    rotations.into_f32().map(Quat::from_array).collect()
                }
                _ => continue,
            };
            if times.is_empty() || times.len() != rotations.len() {
                continue;
            }
            duration = duration.max(times[times.len() - 1]);
            channels.push(AnimationChannel {
                node_index: channel.target().node().index(),
                times,
                rotations,
            });
        }
    }
    progress.store(100, Ordering::Relaxed);

    info!(
        "model loaded: {} mesh nodes, {} textures, {} rotation tracks over {:.2}s",
        nodes.len(),
        textures.len(),
        channels.len(),
        duration
    );
    Ok(LoadedModel {
        nodes,
        textures,
        channels,
        duration,
    })
}

fn collect_nodes(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: Mat4,
    nodes: &mut Vec<ModelNode>,
) -> Result<()> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let translation = Vec3::from_array(translation);
    let rotation = Quat::from_array(rotation);
    let scale = Vec3::from_array(scale);
    let global =
        parent_transform * Mat4::from_scale_rotation_translation(scale, rotation, translation);

    if let Some(mesh) = node.mesh() {
        debug!("  mesh node {:?} ({:?})", node.index(), mesh.name());
        for primitive in mesh.primitives() {
            let pbr = primitive.material().pbr_metallic_roughness();
            let texture_index = pbr
                .base_color_texture()
                .map(|info| info.texture().source().index());
            nodes.push(ModelNode {
                mesh: read_primitive(&primitive, buffers)?,
                base_color: pbr.base_color_factor(),
                texture_index,
                placement: NodePlacement {
                    node_index: node.index(),
                    parent_transform,
                    translation,
                    rotation,
                    scale,
                },
            });
        }
    }

    for child in node.children() {
        collect_nodes(&child, buffers, global, nodes)?;
    }
    Ok(())
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Result<MeshData> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("Mesh primitive has no positions")?
        .collect();

    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(uvs) => uvs.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        // No indices - treat positions as a triangle list.
        None => (0..positions.len() as u32).collect(),
    };

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => smooth_normals(&positions, &indices),
    };

    let vertices: Vec<Vertex> = positions
        .iter()
        .zip(normals.iter())
        .zip(uvs.iter())
        .map(|((position, normal), uv)| Vertex::new(*position, *normal, *uv))
        .collect();

    Ok(MeshData::new(vertices, indices))
}

/// Area-weighted vertex normals for meshes that ship without any.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks(3) {
        if triangle.len() < 3 {
            continue;
        }
        let a = Vec3::from_array(positions[triangle[0] as usize]);
        let b = Vec3::from_array(positions[triangle[1] as usize]);
        let c = Vec3::from_array(positions[triangle[2] as usize]);
        let face = (b - a).cross(c - a);
        for &index in triangle {
            accumulated[index as usize] += face;
        }
    }
    accumulated
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

fn decode_image(image: &gltf::image::Data) -> TextureData {
    let rgba = match image.format {
        gltf::image::Format::R8G8B8A8 => image.pixels.clone(),
        gltf::image::Format::R8G8B8 => {
            // Widen RGB to RGBA.
            let mut rgba = Vec::with_capacity(image.pixels.len() / 3 * 4);
            for rgb in image.pixels.chunks(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            rgba
        }
        other => {
            warn!("unsupported texture format {other:?}, substituting white");
            vec![255; (image.width * image.height * 4) as usize]
        }
    };
    TextureData::new(image.width, image.height, rgba)
}
