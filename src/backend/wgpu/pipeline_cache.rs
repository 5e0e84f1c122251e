//! Render Pipeline Cache
//!
//! Owns every `wgpu::RenderPipeline` created for shader-pass draws.
//! Pipelines are addressed by the full-state [`PassPipelineKey`] hash and
//! stamped with the frame they were last drawn in; stale ones are pruned
//! after each submitted frame.
//!
//! Pipeline layouts only depend on the used slot masks of the two stages and
//! are cached separately.

use rustc_hash::FxHashMap;

use super::pipeline_key::{PassPipelineKey, fx_hash_key};
use super::retention::Retained;
use super::shader::CompiledShader;
use super::uniform_arena::UniformArena;

/// Handle to a cached `wgpu::RenderPipeline` (its key hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub(crate) u64);

#[derive(Default)]
pub struct PipelineCache {
    render_pipelines: Retained<u64, wgpu::RenderPipeline>,
    layouts: FxHashMap<(u32, u32), wgpu::PipelineLayout>,
}

impl PipelineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a render pipeline by handle. `None` once it was pruned.
    #[inline]
    #[must_use]
    pub fn get_render_pipeline(&self, id: RenderPipelineId) -> Option<&wgpu::RenderPipeline> {
        self.render_pipelines.get(&id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.render_pipelines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.render_pipelines.is_empty()
    }

    /// Clears all cached pipelines and layouts.
    pub fn clear(&mut self) {
        self.render_pipelines.clear();
        self.layouts.clear();
    }

    /// Releases pipelines not drawn with for `ttl_frames` frames.
    pub fn prune(&mut self, frame: u64, ttl_frames: u64) -> usize {
        self.render_pipelines.prune(frame, ttl_frames)
    }

    /// Look up or create the pipeline for `key`, stamping it with `frame`.
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        uniforms: &mut UniformArena,
        frame: u64,
        key: &PassPipelineKey,
        vertex: &CompiledShader,
        pixel: &CompiledShader,
    ) -> RenderPipelineId {
        let hash = fx_hash_key(key);
        let id = RenderPipelineId(hash);
        if self.render_pipelines.contains(&hash) {
            self.render_pipelines.touch(&hash, frame);
            return id;
        }

        let (vs_mask, ps_mask) = key.slot_masks;
        let layout = self
            .layouts
            .entry(key.slot_masks)
            .or_insert_with(|| {
                let vs_layout = uniforms.layout(device, vs_mask).clone();
                let ps_layout = uniforms.layout(device, ps_mask).clone();
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Shader Pass Pipeline Layout"),
                    bind_group_layouts: &[Some(&vs_layout), Some(&ps_layout)],
                    immediate_size: 0,
                })
            })
            .clone();

        let attributes = key
            .vertex_layout
            .as_ref()
            .map(super::pipeline_key::VertexLayoutKey::wgpu_attributes)
            .unwrap_or_default();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = key
            .vertex_layout
            .as_ref()
            .map(|layout| wgpu::VertexBufferLayout {
                array_stride: layout.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            })
            .into_iter()
            .collect();

        let color_targets = [Some(key.color_target.to_wgpu())];

        log::debug!(
            "Creating pipeline {hash:#018x} ({} / {}, {:?})",
            vertex.entry_point,
            pixel.entry_point,
            key.topology
        );

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shader Pass Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(&vertex.entry_point),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &pixel.module,
                entry_point: Some(&pixel.entry_point),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: key.primitive(),
            depth_stencil: Some(key.depth_stencil.to_wgpu()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.render_pipelines.insert(hash, frame, pipeline);
        id
    }
}
