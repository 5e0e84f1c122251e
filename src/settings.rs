//! Engine & Backend Settings
//!
//! [`EngineSettings`] configures the backend-agnostic engine (scan throttle,
//! clear values) and can be loaded from JSON. [`WgpuSettings`] is consumed
//! once when a [`WgpuBackend`](crate::backend::WgpuBackend) is created.
//!
//! # Example
//!
//! ```rust
//! use shaderlab::settings::EngineSettings;
//!
//! let settings = EngineSettings::from_json(r#"{ "clear_color": [0.1, 0.1, 0.1, 1.0] }"#).unwrap();
//! assert_eq!(settings.scan_interval_secs, 0.5);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Runtime settings of the [`RenderEngine`](crate::engine::RenderEngine).
///
/// | Field                | Description                                    | Default        |
/// |----------------------|------------------------------------------------|----------------|
/// | `scan_interval_secs` | Full-scan period while the item count is stable | `0.5`         |
/// | `clear_color`        | Render target clear color (RGBA)               | `[0, 0, 0, 1]` |
/// | `clear_depth`        | Depth clear value                              | `1.0`          |
/// | `clear_stencil`      | Stencil clear value                            | `0`            |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// While the external item count equals the cached count, a full
    /// identity scan only runs once this many seconds have passed.
    pub scan_interval_secs: f32,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 0.5,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs_f32(self.scan_interval_secs.max(0.0))
    }
}

/// Device-level configuration for the wgpu backend.
#[derive(Debug, Clone)]
pub struct WgpuSettings {
    /// Force a specific wgpu backend set. `None` lets wgpu choose.
    pub backends: Option<wgpu::Backends>,
    /// GPU adapter selection preference.
    pub power_preference: wgpu::PowerPreference,
    /// Color format of the offscreen render target.
    pub color_format: wgpu::TextureFormat,
    /// Depth/stencil format of the offscreen render target.
    pub depth_format: wgpu::TextureFormat,
    pub required_limits: wgpu::Limits,
}

impl Default for WgpuSettings {
    fn default() -> Self {
        Self {
            backends: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            depth_format: wgpu::TextureFormat::Depth24PlusStencil8,
            required_limits: wgpu::Limits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = EngineSettings::from_json(r#"{ "clear_stencil": 3 }"#).unwrap();
        assert_eq!(settings.clear_stencil, 3);
        assert_eq!(settings.scan_interval_secs, 0.5);
        assert_eq!(settings.clear_depth, 1.0);
    }

    #[test]
    fn json_round_trip_keeps_values() {
        let settings = EngineSettings {
            scan_interval_secs: 0.25,
            ..Default::default()
        };
        let back = EngineSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
    }
}
