//! Shader pass compilation shared by the reconciler and explicit recompiles.

use super::cache::{CacheEntry, PassState};
use crate::backend::{RenderBackend, ShaderStage};
use crate::errors::{Result, ShaderLabError};
use crate::messages::{DiagnosticsSink, Severity};
use crate::pipeline::{InputLayout, ItemId, PipelineItem, ShaderPass};
use crate::project::ProjectFiles;

/// Builds the cache entry for a newly seen top-level item.
///
/// Items that are not shader passes still get an entry so the cache keeps
/// the shape of the list; it is marked [`PassState::Failed`].
pub(crate) fn create_entry<B: RenderBackend>(
    backend: &mut B,
    id: ItemId,
    item: Option<&PipelineItem>,
    files: &dyn ProjectFiles,
    messages: &mut dyn DiagnosticsSink,
) -> CacheEntry<B::Shader> {
    let vertex = backend.create_shader(ShaderStage::Vertex);
    let pixel = backend.create_shader(ShaderStage::Pixel);
    let mut entry = CacheEntry::new(id, vertex, pixel);

    match item {
        Some(item) => match item.as_shader_pass() {
            Some(pass) => {
                entry.state = compile_pass(
                    backend,
                    &mut entry.vertex,
                    &mut entry.pixel,
                    &item.name,
                    pass,
                    files,
                    messages,
                );
            }
            None => {
                let error = ShaderLabError::NotAShaderPass(item.name.clone());
                messages.report(Severity::Error, &item.name, &error.to_string());
                entry.state = PassState::Failed;
            }
        },
        None => {
            log::warn!("Pipeline item {id:?} is listed but does not resolve");
            entry.state = PassState::Failed;
        }
    }

    entry
}

/// Loads and compiles both stages of `pass` into the given shader objects.
///
/// Both stages are always attempted. Diagnostics for `name` are cleared and,
/// on failure, one error per failing stage is reported.
pub(crate) fn compile_pass<B: RenderBackend>(
    backend: &mut B,
    vertex: &mut B::Shader,
    pixel: &mut B::Shader,
    name: &str,
    pass: &ShaderPass,
    files: &dyn ProjectFiles,
    messages: &mut dyn DiagnosticsSink,
) -> PassState {
    let input_layout = (!pass.input_layout.is_empty()).then_some(&pass.input_layout);

    let vs_result = compile_stage(
        backend,
        vertex,
        files,
        &pass.vs_path,
        &pass.vs_entry,
        input_layout,
    );
    let ps_result = compile_stage(backend, pixel, files, &pass.ps_path, &pass.ps_entry, None);

    messages.clear_group(name);
    let mut state = PassState::Ready;
    for error in [vs_result.err(), ps_result.err()].into_iter().flatten() {
        messages.report(
            Severity::Error,
            name,
            &format!("Failed to compile the shader(s): {error}"),
        );
        state = PassState::Failed;
    }
    state
}

fn compile_stage<B: RenderBackend>(
    backend: &mut B,
    shader: &mut B::Shader,
    files: &dyn ProjectFiles,
    path: &str,
    entry_point: &str,
    input_layout: Option<&InputLayout>,
) -> Result<()> {
    let source = files.load_project_file(path)?;
    backend.compile_shader(shader, &source, entry_point, input_layout)
}
