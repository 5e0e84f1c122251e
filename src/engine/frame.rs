//! Per-frame traversal of the cached passes.

use super::FrameStats;
use super::cache::ShaderCache;
use crate::backend::{RenderBackend, ShaderStage};
use crate::pipeline::{DefaultState, ItemKind, PipelineSource, ShaderPass, VariableSlots};
use crate::system::SystemVariables;

/// Issues the commands of every cached pass in snapshot order.
pub(crate) fn draw_passes<B: RenderBackend>(
    backend: &mut B,
    cache: &ShaderCache<B::Shader>,
    pipeline: &dyn PipelineSource,
    system: &mut SystemVariables,
    default_state: &DefaultState,
    scratch: &mut Vec<u8>,
    stats: &mut FrameStats,
) {
    for entry in cache.iter() {
        let Some(item) = pipeline.item(entry.item()) else {
            log::trace!("Skipping cached entry {:?}: item no longer exists", entry.item());
            stats.skipped += 1;
            continue;
        };
        let Some(pass) = item.as_shader_pass() else {
            log::trace!("Skipping `{}`: not a shader pass", item.name);
            stats.skipped += 1;
            continue;
        };

        backend.set_input_layout((!pass.input_layout.is_empty()).then_some(&pass.input_layout));

        bind_slots(backend, ShaderStage::Vertex, &pass.vs_variables, system, scratch);
        bind_slots(backend, ShaderStage::Pixel, &pass.ps_variables, system, scratch);

        backend.bind_shader(entry.vertex());
        backend.bind_shader(entry.pixel());

        backend.bind_default_state(default_state);
        stats.passes += 1;

        draw_children(backend, pipeline, &item.name, pass, system, scratch, stats);
    }
}

fn draw_children<B: RenderBackend>(
    backend: &mut B,
    pipeline: &dyn PipelineSource,
    pass_name: &str,
    pass: &ShaderPass,
    system: &mut SystemVariables,
    scratch: &mut Vec<u8>,
    stats: &mut FrameStats,
) {
    for &child_id in &pass.items {
        let Some(child) = pipeline.item(child_id) else {
            log::trace!("Skipping missing child {child_id:?} of `{pass_name}`");
            continue;
        };

        match &child.kind {
            ItemKind::Geometry(geometry) => {
                system.set_geometry_transform(geometry);
                update_slots(backend, ShaderStage::Vertex, &pass.vs_variables, system, scratch);
                update_slots(backend, ShaderStage::Pixel, &pass.ps_variables, system, scratch);

                backend.set_topology(geometry.topology);
                backend.draw(&geometry.geometry);
                stats.draws += 1;
            }
            ItemKind::BlendState(blend) => {
                backend.bind_blend_state(&blend.state);
                stats.state_changes += 1;
            }
            ItemKind::DepthStencilState(depth_stencil) => {
                backend.bind_depth_stencil_state(
                    &depth_stencil.state,
                    depth_stencil.stencil_reference,
                );
                stats.state_changes += 1;
            }
            ItemKind::ShaderPass(_) => {
                log::warn!(
                    "Shader pass `{}` nested inside `{pass_name}` is ignored",
                    child.name
                );
            }
        }
    }
}

fn bind_slots<B: RenderBackend>(
    backend: &mut B,
    stage: ShaderStage,
    slots: &VariableSlots,
    system: &SystemVariables,
    scratch: &mut Vec<u8>,
) {
    for (slot, buffer) in slots.used_slots() {
        buffer.pack(system, scratch);
        backend.bind_constant_buffer(stage, slot, scratch);
    }
}

fn update_slots<B: RenderBackend>(
    backend: &mut B,
    stage: ShaderStage,
    slots: &VariableSlots,
    system: &SystemVariables,
    scratch: &mut Vec<u8>,
) {
    for (slot, buffer) in slots.used_slots() {
        buffer.pack(system, scratch);
        backend.update_constant_buffer(stage, slot, scratch);
    }
}
