use super::context::WgpuContext;
use crate::errors::{Result, ShaderLabError};

/// Offscreen color + depth/stencil texture pair.
///
/// The color texture can be sampled or copied by the host after the frame
/// (`TEXTURE_BINDING | COPY_SRC`).
#[derive(Debug, Clone)]
pub struct WgpuRenderTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl WgpuRenderTarget {
    pub(crate) fn new(context: &WgpuContext, width: u32, height: u32) -> Result<Self> {
        let max = context.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(ShaderLabError::RenderTargetCreateFailed {
                width,
                height,
                reason: format!("size must be within 1..={max} on both axes"),
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Render Target Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: context.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let depth = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Render Target Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: context.depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Ok(Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            depth,
            width,
            height,
        })
    }

    /// Returns the target dimensions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
