use std::f32::consts::PI;

use glam::Vec3;

use crate::types::{MeshData, Vertex};

/// Axis-aligned box centered on the origin, four vertices per face so each
/// face gets flat normals and its own uv square.
pub fn box_mesh(size: Vec3) -> MeshData {
    let half = size * 0.5;
    // (normal, u axis, v axis), with u cross v matching the normal.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    const CORNERS: [(f32, f32, [f32; 2]); 4] = [
        (-1.0, -1.0, [0.0, 1.0]),
        (1.0, -1.0, [1.0, 1.0]),
        (1.0, 1.0, [1.0, 0.0]),
        (-1.0, 1.0, [0.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u_axis, v_axis) in FACES {
        let face_center = Vec3::from_array(normal) * half;
        let u_extent = Vec3::from_array(u_axis) * half;
        let v_extent = Vec3::from_array(v_axis) * half;
        let base = vertices.len() as u32;
        for (du, dv, uv) in CORNERS {
            let position = face_center + u_extent * du + v_extent * dv;
            vertices.push(Vertex::new(position.to_array(), normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData::new(vertices, indices)
}

/// Latitude/longitude sphere, used for the sun gizmo.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let polar = v * PI;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let azimuth = u * 2.0 * PI;
            let normal = Vec3::new(
                polar.sin() * azimuth.cos(),
                polar.cos(),
                polar.sin() * azimuth.sin(),
            );
            vertices.push(Vertex::new((normal * radius).to_array(), normal.to_array(), [u, v]));
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    MeshData::new(vertices, indices)
}

fn append_box(vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>, size: Vec3, center: Vec3) {
    let part = box_mesh(size);
    let base = vertices.len() as u32;
    vertices.extend(part.vertices.iter().map(|vertex| {
        let mut vertex = *vertex;
        vertex.position = [
            vertex.position[0] + center.x,
            vertex.position[1] + center.y,
            vertex.position[2] + center.z,
        ];
        vertex
    }));
    indices.extend(part.indices.iter().map(|index| index + base));
}

/// Stand-in pergola used when no model file is configured: four posts, a
/// rim, and a row of louver slats. Local origin at the foot of the posts.
pub fn louvered_roof() -> MeshData {
    const LENGTH: f32 = 4.6;
    const WIDTH: f32 = 3.2;
    const HEIGHT: f32 = 2.2;
    const POST: f32 = 0.12;
    const SLATS: u32 = 12;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for sx in [-1.0f32, 1.0] {
        for sz in [-1.0f32, 1.0] {
            append_box(
                &mut vertices,
                &mut indices,
                Vec3::new(POST, HEIGHT, POST),
                Vec3::new(
                    sx * (LENGTH - POST) / 2.0,
                    HEIGHT / 2.0,
                    sz * (WIDTH - POST) / 2.0,
                ),
            );
        }
    }

    // Rim beams around the top.
    for sz in [-1.0f32, 1.0] {
        append_box(
            &mut vertices,
            &mut indices,
            Vec3::new(LENGTH, 0.16, POST),
            Vec3::new(0.0, HEIGHT + 0.08, sz * (WIDTH - POST) / 2.0),
        );
    }
    for sx in [-1.0f32, 1.0] {
        append_box(
            &mut vertices,
            &mut indices,
            Vec3::new(POST, 0.16, WIDTH),
            Vec3::new(sx * (LENGTH - POST) / 2.0, HEIGHT + 0.08, 0.0),
        );
    }

    // Louvers spanning the short side.
    let pitch = (LENGTH - 2.0 * POST) / SLATS as f32;
    for slat in 0..SLATS {
        let x = -LENGTH / 2.0 + POST + pitch * (slat as f32 + 0.5);
        append_box(
            &mut vertices,
            &mut indices,
            Vec3::new(pitch * 0.7, 0.04, WIDTH - 2.0 * POST),
            Vec3::new(x, HEIGHT + 0.12, 0.0),
        );
    }

    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_mesh_has_six_quad_faces() {
        let mesh = box_mesh(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        for vertex in &mesh.vertices {
            let position = Vec3::from_array(vertex.position);
            let normal = Vec3::from_array(vertex.normal);
            assert!(
                position.dot(normal) > 0.0,
                "Face normals must point away from the center"
            );
        }
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = uv_sphere(2.5, 12, 8);
        for vertex in &mesh.vertices {
            let r = Vec3::from_array(vertex.position).length();
            assert!((r - 2.5).abs() < 1e-4, "Vertex off the sphere: {r}");
        }
        assert_eq!(mesh.triangle_count(), (12 * 8 * 2) as usize);
    }

    #[test]
    fn fallback_roof_is_substantial_and_grounded() {
        let mesh = louvered_roof();
        assert!(mesh.triangle_count() >= 200);
        let min_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        assert!(min_y.abs() < 1e-5, "Posts should stand on the local origin");
    }
}
