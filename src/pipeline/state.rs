//! GPU State Descriptors
//!
//! Backend-facing descriptions of the fixed-function state that pipeline
//! items can change: blending, depth/stencil and rasterization. The fields
//! reuse the `wgpu` enums directly.
//!
//! [`DefaultState`] is the baseline every shader pass starts from before its
//! child items run.

/// Blend state applied by a [`BlendState`](crate::pipeline::BlendState) item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendStateDesc {
    /// `None` disables blending (source replaces destination).
    pub blend: Option<wgpu::BlendState>,
    pub write_mask: wgpu::ColorWrites,
    /// Constant used by `BlendFactor::Constant`.
    pub blend_constant: [f32; 4],
}

impl Default for BlendStateDesc {
    fn default() -> Self {
        Self {
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
            blend_constant: [0.0; 4],
        }
    }
}

impl BlendStateDesc {
    /// Classic `src_alpha, 1 - src_alpha` blending.
    #[must_use]
    pub fn alpha_blending() -> Self {
        Self {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            ..Self::default()
        }
    }

    /// Additive `one, one` blending.
    #[must_use]
    pub fn additive() -> Self {
        let component = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };
        Self {
            blend: Some(wgpu::BlendState {
                color: component,
                alpha: component,
            }),
            ..Self::default()
        }
    }
}

/// Depth/stencil state applied by a
/// [`DepthStencilState`](crate::pipeline::DepthStencilState) item.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilDesc {
    pub depth_write_enabled: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub stencil: wgpu::StencilState,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
        }
    }
}

impl DepthStencilDesc {
    /// Writes `reference` into the stencil buffer wherever geometry is drawn.
    #[must_use]
    pub fn stencil_write() -> Self {
        let face = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Always,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Replace,
        };
        Self {
            stencil: wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0xff,
            },
            ..Self::default()
        }
    }

    /// Only draws where the stencil buffer equals the reference.
    #[must_use]
    pub fn stencil_equal() -> Self {
        let face = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Equal,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Keep,
        };
        Self {
            stencil: wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0x00,
            },
            ..Self::default()
        }
    }
}

/// Rasterizer state. Not exposed as a pipeline item; only the default is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterStateDesc {
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
}

impl Default for RasterStateDesc {
    fn default() -> Self {
        Self {
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
        }
    }
}

/// Baseline GPU state bound at the start of every shader pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultState {
    pub blend: BlendStateDesc,
    pub depth_stencil: DepthStencilDesc,
    pub raster: RasterStateDesc,
    pub stencil_reference: u32,
}
