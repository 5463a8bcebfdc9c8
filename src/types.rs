use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

/// Viewport dimensions in raster pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// A zero-area viewport, e.g. a minimized window
    pub fn is_degenerate(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Position plus facing direction of a scene object
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: Vec3,
    pub front: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, front: Vec3) -> Self {
        Self {
            position,
            front: front.normalize_or_zero(),
        }
    }

    /// Pose at `position` facing `target`
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, target - position)
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.front = (target - self.position).normalize_or_zero();
    }
}

/// Vertex layout shared by CPU meshes and the GPU pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

static NEXT_DATA_ID: AtomicU64 = AtomicU64::new(1);

fn next_data_id() -> u64 {
    NEXT_DATA_ID.fetch_add(1, Ordering::Relaxed)
}

/// Immutable triangle mesh shared between actors, the ray caster and the renderer
#[derive(Debug)]
pub struct MeshData {
    /// Unique per allocation, used as a GPU cache key
    pub id: u64,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            id: next_data_id(),
            vertices,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `tri` in mesh-local space
    pub fn triangle(&self, tri: usize) -> (Vec3, Vec3, Vec3) {
        let i = tri * 3;
        let v0 = self.vertices[self.indices[i] as usize].position;
        let v1 = self.vertices[self.indices[i + 1] as usize].position;
        let v2 = self.vertices[self.indices[i + 2] as usize].position;
        (
            Vec3::from_array(v0),
            Vec3::from_array(v1),
            Vec3::from_array(v2),
        )
    }
}

/// RGBA8 texture payload decoded on the CPU
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Unique per allocation, used as a GPU cache key
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id: next_data_id(),
            width,
            height,
            pixels,
        }
    }

    /// Single-pixel texture, used as the untextured fallback
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec())
    }
}

/// Material parameters attached to a mesh instance
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub base_color: [f32; 4],
    pub texture: Option<Rc<TextureData>>,
    /// Skip lighting entirely, e.g. for gizmos
    pub unlit: bool,
}

impl MaterialDesc {
    pub fn color(rgba: [f32; 4]) -> Self {
        Self {
            base_color: rgba,
            texture: None,
            unlit: false,
        }
    }

    pub fn textured(texture: Rc<TextureData>) -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            texture: Some(texture),
            unlit: false,
        }
    }

    pub fn unlit_color(rgb: [f32; 3]) -> Self {
        Self {
            base_color: [rgb[0], rgb[1], rgb[2], 1.0],
            texture: None,
            unlit: true,
        }
    }
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self::color([1.0, 1.0, 1.0, 1.0])
    }
}

/// A placed mesh: shared geometry, world transform, material, visibility
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Rc<MeshData>,
    pub transform: Mat4,
    pub material: MaterialDesc,
    /// Invisible instances are skipped by the renderer but still ray-castable
    pub visible: bool,
}

impl MeshInstance {
    pub fn new(mesh: Rc<MeshData>) -> Self {
        Self {
            mesh,
            transform: Mat4::IDENTITY,
            material: MaterialDesc::default(),
            visible: true,
        }
    }

    pub fn at(mesh: Rc<MeshData>, position: Vec3) -> Self {
        Self {
            transform: Mat4::from_translation(position),
            ..Self::new(mesh)
        }
    }
}

/// Light flavor consumed by the renderer
#[derive(Debug, Clone, Copy)]
pub enum LightKind {
    Ambient,
    Directional { direction: Vec3 },
}

/// Light parameters consumed by the renderer
#[derive(Debug, Clone, Copy)]
pub struct LightData {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl LightData {
    pub const fn ambient(color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn directional(direction: Vec3, color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional {
                direction: direction.normalize_or_zero(),
            },
            color,
            intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_aspect_ratio() {
        let viewport = Viewport::new(1920.0, 1080.0);
        assert!((viewport.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert!(!viewport.is_degenerate());
        assert!(Viewport::new(0.0, 720.0).is_degenerate());
    }

    #[test]
    fn pose_look_at_normalizes_front() {
        let mut pose = Pose::new(Vec3::ZERO, Vec3::Z);
        pose.look_at(Vec3::new(0.0, 0.0, -10.0));
        assert!((pose.front - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
        assert!((pose.front.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mesh_triangle_accessor_resolves_indices() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        let mesh = MeshData::new(vertices, vec![0, 1, 2]);

        assert_eq!(mesh.triangle_count(), 1);
        let (v0, v1, v2) = mesh.triangle(0);
        assert_eq!(v0, Vec3::ZERO);
        assert_eq!(v1, Vec3::X);
        assert_eq!(v2, Vec3::Y);
    }

    #[test]
    fn mesh_ids_are_unique() {
        let a = MeshData::new(Vec::new(), Vec::new());
        let b = MeshData::new(Vec::new(), Vec::new());
        assert_ne!(a.id, b.id);
    }
}
