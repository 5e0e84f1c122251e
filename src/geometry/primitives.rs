use std::f32::consts::PI;

use super::{Geometry, Vertex};

fn vertex(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        normal,
        uv,
    }
}

/// Upright triangle in the XY plane, facing +Z.
#[must_use]
pub fn create_triangle(size: f32) -> Geometry {
    let h = size * 0.5;
    let n = [0.0, 0.0, 1.0];
    let vertices = [
        vertex([0.0, h, 0.0], n, [0.5, 0.0]),
        vertex([-h, -h, 0.0], n, [0.0, 1.0]),
        vertex([h, -h, 0.0], n, [1.0, 1.0]),
    ];
    Geometry::new(&vertices, None)
}

/// Quad in the XY plane, facing +Z.
#[must_use]
pub fn create_rectangle(width: f32, height: f32) -> Geometry {
    let w = width * 0.5;
    let h = height * 0.5;
    let n = [0.0, 0.0, 1.0];
    let vertices = [
        vertex([-w, -h, 0.0], n, [0.0, 1.0]),
        vertex([w, -h, 0.0], n, [1.0, 1.0]),
        vertex([w, h, 0.0], n, [1.0, 0.0]),
        vertex([-w, h, 0.0], n, [0.0, 0.0]),
    ];
    Geometry::new(&vertices, Some(vec![0, 1, 2, 0, 2, 3]))
}

/// Quad in the XZ plane, facing +Y.
#[must_use]
pub fn create_plane(width: f32, depth: f32) -> Geometry {
    let w = width * 0.5;
    let d = depth * 0.5;
    let n = [0.0, 1.0, 0.0];
    let vertices = [
        vertex([-w, 0.0, d], n, [0.0, 1.0]),
        vertex([w, 0.0, d], n, [1.0, 1.0]),
        vertex([w, 0.0, -d], n, [1.0, 0.0]),
        vertex([-w, 0.0, -d], n, [0.0, 0.0]),
    ];
    Geometry::new(&vertices, Some(vec![0, 1, 2, 0, 2, 3]))
}

/// Ellipse in the XY plane, facing +Z, built as a triangle fan.
#[must_use]
pub fn create_circle(radius_x: f32, radius_y: f32, segments: u32) -> Geometry {
    let segments = segments.max(3);
    let n = [0.0, 0.0, 1.0];

    let mut vertices = Vec::with_capacity(segments as usize + 1);
    vertices.push(vertex([0.0, 0.0, 0.0], n, [0.5, 0.5]));
    for i in 0..segments {
        let angle = i as f32 / segments as f32 * 2.0 * PI;
        let (s, c) = angle.sin_cos();
        vertices.push(vertex(
            [c * radius_x, s * radius_y, 0.0],
            n,
            [0.5 + c * 0.5, 0.5 - s * 0.5],
        ));
    }

    let indices = (0..segments)
        .flat_map(|i| [0, i + 1, (i + 1) % segments + 1])
        .collect();

    Geometry::new(&vertices, Some(indices))
}

/// Axis-aligned box centred on the origin, 4 vertices per face.
#[must_use]
pub fn create_cube(width: f32, height: f32, depth: f32) -> Geometry {
    let w = width / 2.0;
    let h = height / 2.0;
    let d = depth / 2.0;

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // Front (+Z)
        ([0.0, 0.0, 1.0], [[-w, -h, d], [w, -h, d], [w, h, d], [-w, h, d]]),
        // Back (-Z)
        ([0.0, 0.0, -1.0], [[w, -h, -d], [-w, -h, -d], [-w, h, -d], [w, h, -d]]),
        // Top (+Y)
        ([0.0, 1.0, 0.0], [[-w, h, d], [w, h, d], [w, h, -d], [-w, h, -d]]),
        // Bottom (-Y)
        ([0.0, -1.0, 0.0], [[-w, -h, -d], [w, -h, -d], [w, -h, d], [-w, -h, d]]),
        // Right (+X)
        ([1.0, 0.0, 0.0], [[w, -h, d], [w, -h, -d], [w, h, -d], [w, h, d]]),
        // Left (-X)
        ([-1.0, 0.0, 0.0], [[-w, -h, -d], [-w, -h, d], [-w, h, d], [-w, h, -d]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let vertices: Vec<Vertex> = faces
        .iter()
        .flat_map(|(normal, corners)| {
            corners
                .iter()
                .zip(uvs)
                .map(|(position, uv)| vertex(*position, *normal, uv))
        })
        .collect();

    // 0, 1, 2,  0, 2, 3 per face
    let indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    Geometry::new(&vertices, Some(indices))
}

pub struct SphereOptions {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

/// UV sphere centred on the origin.
#[must_use]
pub fn create_sphere(options: &SphereOptions) -> Geometry {
    let radius = options.radius;
    let width_segments = options.width_segments.max(3);
    let height_segments = options.height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for y in 0..=height_segments {
        let v_ratio = y as f32 / height_segments as f32;
        // Latitude: 0 at the south pole, PI at the north pole
        let theta = v_ratio * PI;
        let py = -radius * theta.cos();
        let ring_radius = radius * theta.sin();

        for x in 0..=width_segments {
            let u_ratio = x as f32 / width_segments as f32;
            let phi = u_ratio * 2.0 * PI;

            let px = -ring_radius * phi.cos();
            let pz = ring_radius * phi.sin();

            vertices.push(vertex(
                [px, py, pz],
                [px / radius, py / radius, pz / radius],
                [u_ratio, 1.0 - v_ratio],
            ));
        }
    }

    let stride = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for y in 0..height_segments {
        for x in 0..width_segments {
            let v0 = y * stride + x;
            let v1 = v0 + 1;
            let v2 = (y + 1) * stride + x;
            let v3 = v2 + 1;

            indices.extend_from_slice(&[v0, v1, v2, v1, v3, v2]);
        }
    }

    Geometry::new(&vertices, Some(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_36_indices() {
        let cube = create_cube(1.0, 1.0, 1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.draw_count(), 36);
        assert_eq!(cube.stride(), 32);
    }

    #[test]
    fn triangle_is_not_indexed() {
        let triangle = create_triangle(1.0);
        assert!(triangle.indices().is_none());
        assert_eq!(triangle.draw_count(), 3);
    }

    #[test]
    fn sphere_indices_stay_in_range() {
        let sphere = create_sphere(&SphereOptions {
            radius: 2.0,
            width_segments: 8,
            height_segments: 4,
        });
        let count = sphere.vertex_count();
        assert!(sphere.indices().unwrap().iter().all(|&i| i < count));
    }

    #[test]
    fn geometry_ids_are_unique() {
        let a = create_rectangle(1.0, 1.0);
        let b = create_rectangle(1.0, 1.0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
