//! Geometry
//!
//! CPU-side vertex/index data drawn by [`GeometryItem`](crate::pipeline::GeometryItem)s.
//! Backends upload a geometry once and cache the GPU buffers by
//! [`GeometryId`].

pub mod primitives;

use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

pub use primitives::{
    SphereOptions, create_circle, create_cube, create_plane, create_rectangle, create_sphere,
    create_triangle,
};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// Interleaved `position, normal, uv` vertex used by the primitive factory.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertex buffer bytes plus an optional `u32` index list.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: GeometryId,
    data: Vec<u8>,
    stride: u32,
    vertex_count: u32,
    indices: Option<Vec<u32>>,
}

impl Geometry {
    #[must_use]
    pub fn new(vertices: &[Vertex], indices: Option<Vec<u32>>) -> Self {
        Self::from_raw(
            bytemuck::cast_slice(vertices).to_vec(),
            std::mem::size_of::<Vertex>() as u32,
            indices,
        )
    }

    /// Geometry with a custom vertex layout. `data.len()` should be a
    /// multiple of `stride`.
    #[must_use]
    pub fn from_raw(data: Vec<u8>, stride: u32, indices: Option<Vec<u32>>) -> Self {
        let vertex_count = if stride == 0 {
            0
        } else {
            (data.len() / stride as usize) as u32
        };
        Self {
            id: GeometryId::next(),
            data,
            stride,
            vertex_count,
            indices,
        }
    }

    #[must_use]
    pub fn id(&self) -> GeometryId {
        self.id
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Number of elements a draw call consumes.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.indices
            .as_ref()
            .map_or(self.vertex_count, |indices| indices.len() as u32)
    }
}
