//! Render Backends
//!
//! [`RenderBackend`] is the seam between the engine and the GPU. The engine
//! only issues commands through this trait; it never touches device objects.
//!
//! The command set mirrors an immediate-mode graphics API: bind a render
//! target, clear it, bind shaders and constant buffers, change fixed-function
//! state, draw. Backends that record and submit work in batches (such as
//! [`WgpuBackend`]) flush the frame in [`RenderBackend::bind_window_target`].

pub mod wgpu;

use std::fmt;

use crate::errors::Result;
use crate::geometry::Geometry;
use crate::pipeline::{BlendStateDesc, DefaultState, DepthStencilDesc, InputLayout};

pub use self::wgpu::{WgpuBackend, WgpuRenderTarget, WgpuShader};

/// Programmable stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Pixel => f.write_str("pixel"),
        }
    }
}

/// Viewport rectangle in render target pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Covers the whole `width` x `height` target with the `0..1` depth range.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// GPU command interface used by the engine.
pub trait RenderBackend {
    /// A compiled (or not yet compiled) shader object of one stage.
    type Shader;
    /// An offscreen color + depth/stencil target.
    type RenderTarget;

    /// Creates an empty, uncompiled shader object.
    fn create_shader(&mut self, stage: ShaderStage) -> Self::Shader;

    /// Compiles `source` into `shader`.
    ///
    /// `input_layout` is only passed for vertex shaders of passes that
    /// declare vertex inputs. On failure the shader keeps whatever it held
    /// before.
    fn compile_shader(
        &mut self,
        shader: &mut Self::Shader,
        source: &str,
        entry_point: &str,
        input_layout: Option<&InputLayout>,
    ) -> Result<()>;

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<Self::RenderTarget>;
    fn bind_render_target(&mut self, target: &Self::RenderTarget);
    fn clear(&mut self, color: [f32; 4]);
    fn clear_depth_stencil(&mut self, depth: f32, stencil: u32);
    fn set_viewport(&mut self, viewport: Viewport);

    /// `None` unbinds the vertex input layout.
    fn set_input_layout(&mut self, layout: Option<&InputLayout>);

    /// Binds a packed uniform block to `(stage, slot)` for the following draws.
    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]);

    /// Replaces the contents of an already bound `(stage, slot)` block.
    fn update_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]);

    fn bind_shader(&mut self, shader: &Self::Shader);
    fn bind_default_state(&mut self, state: &DefaultState);
    fn set_topology(&mut self, topology: ::wgpu::PrimitiveTopology);
    fn draw(&mut self, geometry: &Geometry);
    fn bind_blend_state(&mut self, state: &BlendStateDesc);
    fn bind_depth_stencil_state(&mut self, state: &DepthStencilDesc, stencil_reference: u32);

    /// Restores the window (default) target. Ends the frame.
    fn bind_window_target(&mut self);

    /// Drops backend-side caches derived from shader objects. Called after
    /// the engine flushed its own cache.
    fn release_cached_objects(&mut self) {}
}
