//! System Variables
//!
//! Frame-global values that shader variables can be bound to (viewport size,
//! camera matrices, per-draw geometry transform, time, ...).
//!
//! The values live in an explicit [`SystemVariables`] context object that the
//! host owns and hands to the engine every frame through
//! [`FrameContext`](crate::engine::FrameContext).
//!
//! | Writer         | Values                                                  |
//! |----------------|---------------------------------------------------------|
//! | Host           | time, delta time, camera, mouse position                |
//! | Frame renderer | viewport size (once per frame), geometry transform (per draw) |
//!
//! Readers are the constant-buffer packing step
//! ([`ConstantBuffer::pack`](crate::pipeline::ConstantBuffer::pack)).

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::pipeline::{GeometryItem, VariableValue};

/// A value a shader variable can be fed from automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemSemantic {
    /// Seconds since the host started counting (`f32`).
    Time,
    /// Seconds since the previous frame (`f32`).
    TimeDelta,
    /// Number of frames rendered (`i32`).
    FrameIndex,
    /// Render target size in pixels (`vec2<f32>`).
    ViewportSize,
    /// Mouse position in pixels (`vec2<f32>`).
    MousePosition,
    /// Camera view matrix (`mat4x4<f32>`).
    View,
    /// Camera projection matrix (`mat4x4<f32>`).
    Projection,
    /// `Projection * View` (`mat4x4<f32>`).
    ViewProjection,
    /// Pixel-space orthographic projection for the viewport (`mat4x4<f32>`).
    Orthographic,
    /// Model matrix of the geometry being drawn (`mat4x4<f32>`).
    GeometryTransform,
}

/// Frame-global values written by the host and the frame renderer.
#[derive(Debug, Clone)]
pub struct SystemVariables {
    time: f32,
    time_delta: f32,
    frame_index: u32,
    viewport_size: Vec2,
    mouse_position: Vec2,
    view: Mat4,
    projection: Mat4,
    geometry_transform: Mat4,
}

impl Default for SystemVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemVariables {
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            time_delta: 0.0,
            frame_index: 0,
            viewport_size: Vec2::ZERO,
            mouse_position: Vec2::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            geometry_transform: Mat4::IDENTITY,
        }
    }

    /// Advances time by `delta` seconds and bumps the frame index.
    pub fn tick(&mut self, delta: f32) {
        self.time_delta = delta;
        self.time += delta;
        self.frame_index = self.frame_index.wrapping_add(1);
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport_size = Vec2::new(width as f32, height as f32);
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse_position = Vec2::new(x, y);
    }

    pub fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }

    /// Stores the model matrix of `geometry` for the next draw.
    pub fn set_geometry_transform(&mut self, geometry: &GeometryItem) {
        self.geometry_transform = geometry.transform();
    }

    #[must_use]
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    #[must_use]
    pub fn geometry_transform(&self) -> Mat4 {
        self.geometry_transform
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Current value for `semantic`.
    #[must_use]
    pub fn value(&self, semantic: SystemSemantic) -> VariableValue {
        match semantic {
            SystemSemantic::Time => VariableValue::Float(self.time),
            SystemSemantic::TimeDelta => VariableValue::Float(self.time_delta),
            SystemSemantic::FrameIndex => VariableValue::Integer(self.frame_index as i32),
            SystemSemantic::ViewportSize => VariableValue::Float2(self.viewport_size),
            SystemSemantic::MousePosition => VariableValue::Float2(self.mouse_position),
            SystemSemantic::View => VariableValue::Float4x4(self.view),
            SystemSemantic::Projection => VariableValue::Float4x4(self.projection),
            SystemSemantic::ViewProjection => {
                VariableValue::Float4x4(self.projection * self.view)
            }
            SystemSemantic::Orthographic => VariableValue::Float4x4(Mat4::orthographic_rh(
                0.0,
                self.viewport_size.x,
                self.viewport_size.y,
                0.0,
                0.1,
                1000.0,
            )),
            SystemSemantic::GeometryTransform => VariableValue::Float4x4(self.geometry_transform),
        }
    }
}
