//! WGSL Shader Objects
//!
//! Sources are parsed and validated with naga before a `wgpu::ShaderModule`
//! is created, so compile errors come back as [`ShaderLabError`]s instead of
//! device errors. The reflection gathered here (resource bindings, vertex
//! inputs, color outputs) is checked again at draw time against what the
//! pass actually binds.
//!
//! # Resource Model
//!
//! | WGSL                        | Source                           |
//! |-----------------------------|----------------------------------|
//! | `@group(0) @binding(i) var<uniform>` | vertex-stage slot `i`   |
//! | `@group(1) @binding(i) var<uniform>` | pixel-stage slot `i`    |
//! | `@location(i)` vertex input | input layout element `i`         |

use std::borrow::Cow;

use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_128;

use super::retention::Retained;
use super::uniform_arena::UNIFORM_BLOCK_SIZE;
use crate::backend::ShaderStage;
use crate::errors::{Result, ShaderLabError};
use crate::pipeline::{CONSTANT_BUFFER_SLOTS, InputLayout};

/// A shader object owned by the engine's cache.
///
/// Holds the last module that compiled successfully. A failed compile keeps
/// the previous module so the pass keeps drawing with it.
#[derive(Debug)]
pub struct WgpuShader {
    stage: ShaderStage,
    compiled: Option<CompiledShader>,
}

impl WgpuShader {
    pub(crate) fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            compiled: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    #[must_use]
    pub fn compiled(&self) -> Option<&CompiledShader> {
        self.compiled.as_ref()
    }

    pub(crate) fn set_compiled(&mut self, compiled: CompiledShader) {
        self.compiled = Some(compiled);
    }
}

/// Uniform binding required by an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformRequirement {
    pub group: u32,
    pub binding: u32,
    pub size: u32,
}

/// A validated module plus the reflection the backend needs at draw time.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    /// xxh3-128 of the WGSL source.
    pub source_hash: u128,
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
    pub uniforms: SmallVec<[UniformRequirement; 4]>,
    /// `@location`s read from the vertex buffer (vertex stage only).
    pub vertex_inputs: SmallVec<[u32; 4]>,
    /// Inter-stage interface: outputs of a vertex entry point, inputs of a
    /// pixel entry point.
    pub varyings: SmallVec<[Varying; 4]>,
}

/// One `@location` of the inter-stage interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub location: u32,
    /// Printable naga type, compared verbatim when linking.
    pub ty: String,
}

impl CompiledShader {
    /// Bit `i` is set when `@group(group) @binding(i)` is used.
    #[must_use]
    pub fn binding_mask(&self, group: u32) -> u32 {
        self.uniforms
            .iter()
            .filter(|u| u.group == group)
            .fold(0, |mask, u| mask | (1 << u.binding))
    }

    /// Checks that every input of `pixel` is written by this vertex shader
    /// with the same type.
    pub fn links_with(&self, pixel: &CompiledShader) -> std::result::Result<(), String> {
        for input in &pixel.varyings {
            match self.varyings.iter().find(|o| o.location == input.location) {
                None => {
                    return Err(format!(
                        "pixel input @location({}) is not written by `{}`",
                        input.location, self.entry_point
                    ));
                }
                Some(output) if output.ty != input.ty => {
                    return Err(format!(
                        "@location({}) is {} in `{}` but {} in `{}`",
                        input.location, output.ty, self.entry_point, input.ty, pixel.entry_point
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Deduplicates `wgpu::ShaderModule`s by source hash.
///
/// Modules are stamped when compiled or drawn with, and pruned once stale.
/// Shaders that still hold a module keep it alive on their own.
#[derive(Default)]
pub struct ShaderModuleCache {
    modules: Retained<u128, wgpu::ShaderModule>,
}

impl ShaderModuleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `source` for `stage`/`entry_point` and returns the compiled
    /// shader. The module is created only once per distinct source.
    pub fn compile(
        &mut self,
        device: &wgpu::Device,
        frame: u64,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
        input_layout: Option<&InputLayout>,
    ) -> Result<CompiledShader> {
        let fail = |message: String| ShaderLabError::ShaderCompileFailed {
            stage,
            entry_point: entry_point.to_string(),
            message,
        };

        let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;
        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source)))?;

        let (index, entry) = module
            .entry_points
            .iter()
            .enumerate()
            .find(|(_, ep)| ep.name == entry_point)
            .ok_or_else(|| fail(format!("entry point `{entry_point}` not found")))?;

        let expected = match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        };
        if entry.stage != expected {
            return Err(fail(format!(
                "entry point `{entry_point}` is a {:?} entry point",
                entry.stage
            )));
        }

        let uniforms = reflect_uniforms(&module, info.get_entry_point(index)).map_err(fail)?;

        let function = &entry.function;
        let mut inputs = SmallVec::<[(u32, naga::Handle<naga::Type>); 4]>::new();
        for argument in &function.arguments {
            interface_locations(&module, argument.binding.as_ref(), argument.ty, &mut inputs);
        }
        let mut outputs = SmallVec::<[(u32, naga::Handle<naga::Type>); 4]>::new();
        if let Some(result) = &function.result {
            interface_locations(&module, result.binding.as_ref(), result.ty, &mut outputs);
        }

        let (vertex_inputs, varyings) = match stage {
            ShaderStage::Vertex => {
                let vertex_inputs = check_vertex_inputs(&module, &inputs, input_layout).map_err(fail)?;
                (vertex_inputs, varyings(&module, &outputs))
            }
            ShaderStage::Pixel => {
                if let Some(&(location, _)) = outputs.iter().find(|(location, _)| *location > 0) {
                    return Err(fail(format!(
                        "fragment output @location({location}) has no color target; only @location(0) is rendered"
                    )));
                }
                (SmallVec::new(), varyings(&module, &inputs))
            }
        };

        let source_hash = xxh3_128(source.as_bytes());
        let module = self
            .modules
            .get_or_insert_with(source_hash, frame, || {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{stage} shader {entry_point}")),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string())),
                })
            })
            .clone();

        Ok(CompiledShader {
            source_hash,
            module,
            entry_point: entry_point.to_string(),
            uniforms,
            vertex_inputs,
            varyings,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }

    /// Marks the module compiled from `source_hash` as used in `frame`.
    pub fn touch(&mut self, source_hash: u128, frame: u64) {
        self.modules.touch(&source_hash, frame);
    }

    /// Releases modules not compiled or drawn with for `ttl_frames` frames.
    pub fn prune(&mut self, frame: u64, ttl_frames: u64) -> usize {
        self.modules.prune(frame, ttl_frames)
    }
}

fn reflect_uniforms(
    module: &naga::Module,
    info: &naga::valid::FunctionInfo,
) -> std::result::Result<SmallVec<[UniformRequirement; 4]>, String> {
    let mut uniforms = SmallVec::new();
    for (handle, var) in module.global_variables.iter() {
        if info[handle].is_empty() {
            continue;
        }
        let Some(binding) = &var.binding else {
            continue;
        };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        if var.space != naga::AddressSpace::Uniform {
            return Err(format!(
                "`{name}` (@group({}) @binding({})): only uniform buffers are supported",
                binding.group, binding.binding
            ));
        }
        if binding.group > 1 || binding.binding as usize >= CONSTANT_BUFFER_SLOTS {
            return Err(format!(
                "`{name}` uses @group({}) @binding({}); uniforms must use group 0 (vertex slots) or 1 (pixel slots) and binding < {CONSTANT_BUFFER_SLOTS}",
                binding.group, binding.binding
            ));
        }

        let size = module.types[var.ty].inner.size(module.to_ctx());
        if u64::from(size) > UNIFORM_BLOCK_SIZE {
            return Err(format!(
                "`{name}` is {size} bytes; uniform blocks are limited to {UNIFORM_BLOCK_SIZE} bytes"
            ));
        }

        uniforms.push(UniformRequirement {
            group: binding.group,
            binding: binding.binding,
            size,
        });
    }
    Ok(uniforms)
}

/// Collects the `@location`s of one argument or result, looking through
/// structs.
fn interface_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut SmallVec<[(u32, naga::Handle<naga::Type>); 4]>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push((*location, ty)),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        out.push((*location, member.ty));
                    }
                }
            }
        }
    }
}

fn varyings(
    module: &naga::Module,
    locations: &[(u32, naga::Handle<naga::Type>)],
) -> SmallVec<[Varying; 4]> {
    locations
        .iter()
        .map(|&(location, ty)| Varying {
            location,
            ty: format!("{:?}", module.types[ty].inner),
        })
        .collect()
}

/// Vertex inputs must be float-typed (all input layout formats are floats)
/// and covered by the input layout when one is given.
fn check_vertex_inputs(
    module: &naga::Module,
    inputs: &[(u32, naga::Handle<naga::Type>)],
    input_layout: Option<&InputLayout>,
) -> std::result::Result<SmallVec<[u32; 4]>, String> {
    let mut locations = SmallVec::new();
    for &(location, ty) in inputs {
        let is_float = match &module.types[ty].inner {
            naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => {
                scalar.kind == naga::ScalarKind::Float
            }
            _ => false,
        };
        if !is_float {
            return Err(format!(
                "vertex input @location({location}) must be f32 or a vector of f32"
            ));
        }
        if let Some(layout) = input_layout {
            let declared = layout.elements().len() as u32;
            if location >= declared {
                return Err(format!(
                    "vertex input @location({location}) is not declared by the input layout ({declared} elements)"
                ));
            }
        }
        locations.push(location);
    }
    Ok(locations)
}
