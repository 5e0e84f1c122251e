//! Strongly-typed pipeline cache keys.
//!
//! `wgpu` descriptor types (`BlendState`, `StencilState`, ...) do not
//! implement `Hash` / `Eq`. This module defines *mirror* types that extract
//! the fields relevant for pipeline identity and derive the correct trait
//! impls.

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::pipeline::{BlendStateDesc, DepthStencilDesc};

// ─── Hashable Mirror Types ────────────────────────────────────────────────────

/// Hashable mirror of `wgpu::BlendComponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponentKey {
    pub src_factor: wgpu::BlendFactor,
    pub dst_factor: wgpu::BlendFactor,
    pub operation: wgpu::BlendOperation,
}

impl From<wgpu::BlendComponent> for BlendComponentKey {
    fn from(b: wgpu::BlendComponent) -> Self {
        Self {
            src_factor: b.src_factor,
            dst_factor: b.dst_factor,
            operation: b.operation,
        }
    }
}

/// Hashable mirror of `wgpu::BlendState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendStateKey {
    pub color: BlendComponentKey,
    pub alpha: BlendComponentKey,
}

impl From<wgpu::BlendState> for BlendStateKey {
    fn from(b: wgpu::BlendState) -> Self {
        Self {
            color: b.color.into(),
            alpha: b.alpha.into(),
        }
    }
}

/// Hashable mirror of the color target of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetKey {
    pub format: wgpu::TextureFormat,
    pub blend: Option<BlendStateKey>,
    pub write_mask: u32, // wgpu::ColorWrites bits
}

impl ColorTargetKey {
    #[must_use]
    pub fn new(format: wgpu::TextureFormat, blend: &BlendStateDesc) -> Self {
        Self {
            format,
            blend: blend.blend.map(Into::into),
            write_mask: blend.write_mask.bits(),
        }
    }

    #[must_use]
    pub fn to_wgpu(&self) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format: self.format,
            blend: self.blend.map(|b| wgpu::BlendState {
                color: b.color.to_wgpu(),
                alpha: b.alpha.to_wgpu(),
            }),
            write_mask: wgpu::ColorWrites::from_bits_truncate(self.write_mask),
        }
    }
}

impl BlendComponentKey {
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::BlendComponent {
        wgpu::BlendComponent {
            src_factor: self.src_factor,
            dst_factor: self.dst_factor,
            operation: self.operation,
        }
    }
}

/// Hashable mirror of `wgpu::StencilFaceState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceKey {
    pub compare: wgpu::CompareFunction,
    pub fail_op: wgpu::StencilOperation,
    pub depth_fail_op: wgpu::StencilOperation,
    pub pass_op: wgpu::StencilOperation,
}

impl From<wgpu::StencilFaceState> for StencilFaceKey {
    fn from(s: wgpu::StencilFaceState) -> Self {
        Self {
            compare: s.compare,
            fail_op: s.fail_op,
            depth_fail_op: s.depth_fail_op,
            pass_op: s.pass_op,
        }
    }
}

impl StencilFaceKey {
    fn to_wgpu(self) -> wgpu::StencilFaceState {
        wgpu::StencilFaceState {
            compare: self.compare,
            fail_op: self.fail_op,
            depth_fail_op: self.depth_fail_op,
            pass_op: self.pass_op,
        }
    }
}

/// Hashable mirror of `wgpu::StencilState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilStateKey {
    pub front: StencilFaceKey,
    pub back: StencilFaceKey,
    pub read_mask: u32,
    pub write_mask: u32,
}

impl From<wgpu::StencilState> for StencilStateKey {
    fn from(s: wgpu::StencilState) -> Self {
        Self {
            front: s.front.into(),
            back: s.back.into(),
            read_mask: s.read_mask,
            write_mask: s.write_mask,
        }
    }
}

/// Hashable mirror of `wgpu::DepthStencilState` (no bias).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilKey {
    pub format: wgpu::TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub stencil: StencilStateKey,
}

impl DepthStencilKey {
    #[must_use]
    pub fn new(format: wgpu::TextureFormat, desc: &DepthStencilDesc) -> Self {
        Self {
            format,
            depth_write_enabled: desc.depth_write_enabled,
            depth_compare: desc.depth_compare,
            stencil: desc.stencil.clone().into(),
        }
    }

    #[must_use]
    pub fn to_wgpu(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: self.format,
            depth_write_enabled: Some(self.depth_write_enabled),
            depth_compare: Some(self.depth_compare),
            stencil: wgpu::StencilState {
                front: self.stencil.front.to_wgpu(),
                back: self.stencil.back.to_wgpu(),
                read_mask: self.stencil.read_mask,
                write_mask: self.stencil.write_mask,
            },
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Hashable vertex buffer layout: stride plus `(format, offset, location)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayoutKey {
    pub stride: u64,
    pub attributes: SmallVec<[(wgpu::VertexFormat, u64, u32); 4]>,
}

impl VertexLayoutKey {
    #[must_use]
    pub fn new(stride: u64, attributes: &[wgpu::VertexAttribute]) -> Self {
        Self {
            stride,
            attributes: attributes
                .iter()
                .map(|a| (a.format, a.offset, a.shader_location))
                .collect(),
        }
    }

    #[must_use]
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|&(format, offset, shader_location)| wgpu::VertexAttribute {
                format,
                offset,
                shader_location,
            })
            .collect()
    }
}

// ─── Pipeline Key ─────────────────────────────────────────────────────────────

/// Full state of one shader-pass draw pipeline.
///
/// Modules are identified by the xxh3-128 of their WGSL source plus the
/// entry point name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassPipelineKey {
    pub vertex_hash: u128,
    pub vertex_entry: String,
    pub pixel_hash: u128,
    pub pixel_entry: String,
    /// `None` when the pass has no vertex inputs.
    pub vertex_layout: Option<VertexLayoutKey>,
    /// Used slot bits of the vertex (`@group(0)`) and pixel (`@group(1)`) tables.
    pub slot_masks: (u32, u32),
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub color_target: ColorTargetKey,
    pub depth_stencil: DepthStencilKey,
}

impl PassPipelineKey {
    #[must_use]
    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: self.topology,
            strip_index_format: self
                .topology
                .is_strip()
                .then_some(wgpu::IndexFormat::Uint32),
            front_face: self.front_face,
            cull_mode: self.cull_mode,
            ..Default::default()
        }
    }
}

// ─── Convenience helpers ──────────────────────────────────────────────────────

/// Compute a `u64` hash of any `Hash`-able value using `FxHasher`.
#[inline]
pub fn fx_hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_states_hash_equal() {
        let a = DepthStencilKey::new(
            wgpu::TextureFormat::Depth24PlusStencil8,
            &DepthStencilDesc::stencil_write(),
        );
        let b = DepthStencilKey::new(
            wgpu::TextureFormat::Depth24PlusStencil8,
            &DepthStencilDesc::stencil_write(),
        );
        let c = DepthStencilKey::new(
            wgpu::TextureFormat::Depth24PlusStencil8,
            &DepthStencilDesc::stencil_equal(),
        );
        assert_eq!(fx_hash_key(&a), fx_hash_key(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn color_target_round_trips_blend() {
        let key = ColorTargetKey::new(
            wgpu::TextureFormat::Rgba8UnormSrgb,
            &BlendStateDesc::alpha_blending(),
        );
        let state = key.to_wgpu();
        assert_eq!(state.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert_eq!(state.write_mask, wgpu::ColorWrites::ALL);
    }
}
