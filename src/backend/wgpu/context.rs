//! wgpu Context
//!
//! The [`WgpuContext`] holds the core GPU handles (device and queue) for
//! offscreen rendering. There is no surface: the engine renders into its own
//! textures and the host decides how to present them.

use crate::errors::{Result, ShaderLabError};
use crate::settings::WgpuSettings;

/// Core wgpu context holding GPU handles.
pub struct WgpuContext {
    /// The wgpu device for GPU operations
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,
    /// Offscreen color format
    pub color_format: wgpu::TextureFormat,
    /// Offscreen depth/stencil format
    pub depth_format: wgpu::TextureFormat,
}

impl WgpuContext {
    pub async fn new(settings: &WgpuSettings) -> Result<Self> {
        let instance = match settings.backends {
            Some(backends) => wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends,
                ..wgpu::InstanceDescriptor::new_without_display_handle()
            }),
            None => wgpu::Instance::default(),
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ShaderLabError::AdapterRequestFailed(e.to_string()))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ShaderLab Device"),
                required_features: wgpu::Features::empty(),
                required_limits: settings.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            color_format: settings.color_format,
            depth_format: settings.depth_format,
        })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn new_blocking(settings: &WgpuSettings) -> Result<Self> {
        pollster::block_on(Self::new(settings))
    }

    /// Largest width/height a render target may have.
    #[inline]
    #[must_use]
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
