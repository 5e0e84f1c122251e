//! wgpu Backend
//!
//! [`WgpuBackend`] implements the immediate-mode [`RenderBackend`] command
//! set on top of wgpu's explicit model:
//!
//! - binds update a small CPU-side state block;
//! - `draw` validates that state against the bound shaders, resolves a
//!   cached `RenderPipeline` for it and records a [`DrawCommand`];
//! - [`RenderBackend::bind_window_target`] uploads the frame's uniform
//!   blocks, replays the commands into one render pass and submits.
//!
//! Geometry buffers, shader modules and pipelines are stamped with the frame
//! they were last used in and released after [`RETENTION_FRAMES`] idle frames,
//! so edited-away shader versions do not pile up on the device.
//!
//! Draws that would be rejected by wgpu validation (missing shaders, unbound
//! uniform slots, vertex inputs the layout does not provide, mismatched
//! stage interfaces) are skipped with a log message instead.

mod context;
mod pipeline_cache;
mod pipeline_key;
mod retention;
mod shader;
mod target;
mod uniform_arena;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use wgpu::util::DeviceExt;

pub use context::WgpuContext;
pub use pipeline_cache::{PipelineCache, RenderPipelineId};
pub use pipeline_key::PassPipelineKey;
pub use shader::{CompiledShader, ShaderModuleCache, WgpuShader};
pub use target::WgpuRenderTarget;
pub use uniform_arena::{UNIFORM_BLOCK_SIZE, UniformArena};

use self::pipeline_key::{ColorTargetKey, DepthStencilKey, VertexLayoutKey};
use self::retention::Retained;
use crate::backend::{RenderBackend, ShaderStage, Viewport};
use crate::errors::Result;
use crate::geometry::{Geometry, GeometryId};
use crate::pipeline::{
    BlendStateDesc, CONSTANT_BUFFER_SLOTS, DefaultState, DepthStencilDesc, InputLayout,
    RasterStateDesc,
};
use crate::settings::WgpuSettings;

/// Cached GPU objects unused for this many frames are released.
pub const RETENTION_FRAMES: u64 = 120;

struct GpuGeometry {
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

/// State set by the bind calls, consumed by `draw`.
#[derive(Default)]
struct BoundState {
    input_layout: Option<InputLayout>,
    vertex: Option<CompiledShader>,
    pixel: Option<CompiledShader>,
    vs_offsets: [Option<u32>; CONSTANT_BUFFER_SLOTS],
    ps_offsets: [Option<u32>; CONSTANT_BUFFER_SLOTS],
    blend: BlendStateDesc,
    depth_stencil: DepthStencilDesc,
    raster: RasterStateDesc,
    stencil_reference: u32,
    topology: wgpu::PrimitiveTopology,
    viewport: Option<Viewport>,
}

impl BoundState {
    fn offsets(&self, stage: ShaderStage) -> &[Option<u32>; CONSTANT_BUFFER_SLOTS] {
        match stage {
            ShaderStage::Vertex => &self.vs_offsets,
            ShaderStage::Pixel => &self.ps_offsets,
        }
    }

    fn offsets_mut(&mut self, stage: ShaderStage) -> &mut [Option<u32>; CONSTANT_BUFFER_SLOTS] {
        match stage {
            ShaderStage::Vertex => &mut self.vs_offsets,
            ShaderStage::Pixel => &mut self.ps_offsets,
        }
    }

    fn slot_mask(&self, stage: ShaderStage) -> u32 {
        self.offsets(stage)
            .iter()
            .enumerate()
            .filter(|(_, offset)| offset.is_some())
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }

    fn dynamic_offsets(&self, stage: ShaderStage) -> SmallVec<[u32; CONSTANT_BUFFER_SLOTS]> {
        self.offsets(stage).iter().flatten().copied().collect()
    }
}

/// One recorded draw.
struct DrawCommand {
    pipeline: RenderPipelineId,
    slot_masks: (u32, u32),
    vs_offsets: SmallVec<[u32; CONSTANT_BUFFER_SLOTS]>,
    ps_offsets: SmallVec<[u32; CONSTANT_BUFFER_SLOTS]>,
    geometry: GeometryId,
    uses_vertex_buffer: bool,
    stencil_reference: u32,
    blend_constant: [f32; 4],
    viewport: Option<Viewport>,
}

/// Commands recorded against the currently bound render target.
#[derive(Default)]
struct FrameRecording {
    color_view: Option<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,
    clear_color: Option<wgpu::Color>,
    clear_depth_stencil: Option<(f32, u32)>,
    commands: Vec<DrawCommand>,
}

impl FrameRecording {
    fn is_pending(&self) -> bool {
        self.clear_color.is_some() || self.clear_depth_stencil.is_some() || !self.commands.is_empty()
    }
}

/// Production [`RenderBackend`] backed by a headless wgpu device.
pub struct WgpuBackend {
    context: WgpuContext,
    modules: ShaderModuleCache,
    pipelines: PipelineCache,
    uniforms: UniformArena,
    geometries: Retained<GeometryId, GpuGeometry>,
    state: BoundState,
    frame: FrameRecording,
    frame_index: u64,
}

impl WgpuBackend {
    /// Creates a backend on a new headless device.
    pub fn new(settings: &WgpuSettings) -> Result<Self> {
        Ok(Self::from_context(WgpuContext::new_blocking(settings)?))
    }

    #[must_use]
    pub fn from_context(context: WgpuContext) -> Self {
        let uniforms = UniformArena::new(&context.device);
        Self {
            context,
            modules: ShaderModuleCache::new(),
            pipelines: PipelineCache::new(),
            uniforms,
            geometries: Retained::new(),
            state: BoundState::default(),
            frame: FrameRecording::default(),
            frame_index: 0,
        }
    }

    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.context
    }

    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    #[must_use]
    pub fn shader_module_count(&self) -> usize {
        self.modules.len()
    }

    /// Number of submitted frames.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn push_uniforms(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        if slot >= CONSTANT_BUFFER_SLOTS {
            log::warn!("Ignoring {stage} constant buffer for slot {slot}");
            return;
        }
        let offset = self.uniforms.push(data);
        self.state.offsets_mut(stage)[slot] = Some(offset);
    }

    /// Validates the bound state for a draw. Returns a reason on mismatch.
    fn check_draw(
        state: &BoundState,
        vertex: &CompiledShader,
        pixel: &CompiledShader,
        geometry: &Geometry,
    ) -> std::result::Result<(), String> {
        for (group, stage) in [(0, ShaderStage::Vertex), (1, ShaderStage::Pixel)] {
            let required = vertex.binding_mask(group) | pixel.binding_mask(group);
            let missing = required & !state.slot_mask(stage);
            if missing != 0 {
                return Err(format!(
                    "{stage} constant buffer slots {missing:#06b} are read but not bound"
                ));
            }
        }

        let declared = state.input_layout.as_ref().map_or(0, |l| l.elements().len());
        if let Some(location) = vertex.vertex_inputs.iter().find(|&&l| l as usize >= declared) {
            return Err(format!(
                "vertex input @location({location}) has no input layout element"
            ));
        }

        check_geometry(state.input_layout.as_ref(), geometry)?;
        vertex.links_with(pixel)
    }

    fn upload_geometry(&mut self, geometry: &Geometry) {
        let device = &self.context.device;
        self.geometries
            .get_or_insert_with(geometry.id(), self.frame_index, || GpuGeometry {
                vertex_buffer: (!geometry.data().is_empty()).then(|| {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Geometry Vertices"),
                        contents: geometry.data(),
                        usage: wgpu::BufferUsages::VERTEX,
                    })
                }),
                index_buffer: geometry.indices().map(|indices| {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Geometry Indices"),
                        contents: bytemuck::cast_slice(indices),
                        usage: wgpu::BufferUsages::INDEX,
                    })
                }),
                count: geometry.draw_count(),
            });
    }

    /// Releases cached GPU objects that have been idle for too long.
    fn prune(&mut self) {
        let frame = self.frame_index;
        let geometries = self.geometries.prune(frame, RETENTION_FRAMES);
        let pipelines = self.pipelines.prune(frame, RETENTION_FRAMES);
        let modules = self.modules.prune(frame, RETENTION_FRAMES);
        if geometries + pipelines + modules > 0 {
            log::debug!(
                "Released {geometries} geometry, {pipelines} pipeline and {modules} shader module cache entries"
            );
        }
    }

    /// Replays the recorded commands into one render pass and submits.
    fn flush(&mut self) {
        if !self.frame.is_pending() {
            return;
        }
        let frame = std::mem::take(&mut self.frame);
        self.frame.color_view.clone_from(&frame.color_view);
        self.frame.depth_view.clone_from(&frame.depth_view);
        let (Some(color_view), Some(depth_view)) = (&frame.color_view, &frame.depth_view) else {
            log::warn!("Dropping {} draw(s) recorded without a render target", frame.commands.len());
            self.uniforms.reset();
            return;
        };

        let device = &self.context.device;
        self.uniforms.upload(device, &self.context.queue);

        let mut bind_groups: FxHashMap<u32, wgpu::BindGroup> = FxHashMap::default();
        for command in &frame.commands {
            for mask in [command.slot_masks.0, command.slot_masks.1] {
                if !bind_groups.contains_key(&mask) {
                    bind_groups.insert(mask, self.uniforms.bind_group(device, mask));
                }
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ShaderLab Frame Encoder"),
        });

        {
            let (depth, stencil) = frame.clear_depth_stencil.unzip();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ShaderLab Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: frame.clear_color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: stencil.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });

            for command in &frame.commands {
                let (Some(geometry), Some(pipeline)) = (
                    self.geometries.get(&command.geometry),
                    self.pipelines.get_render_pipeline(command.pipeline),
                ) else {
                    continue;
                };
                let (Some(vs_group), Some(ps_group)) = (
                    bind_groups.get(&command.slot_masks.0),
                    bind_groups.get(&command.slot_masks.1),
                ) else {
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, vs_group, &command.vs_offsets);
                pass.set_bind_group(1, ps_group, &command.ps_offsets);
                if let Some(viewport) = command.viewport {
                    pass.set_viewport(
                        viewport.x,
                        viewport.y,
                        viewport.width,
                        viewport.height,
                        viewport.min_depth,
                        viewport.max_depth,
                    );
                }
                pass.set_stencil_reference(command.stencil_reference);
                let [r, g, b, a] = command.blend_constant.map(f64::from);
                pass.set_blend_constant(wgpu::Color { r, g, b, a });

                if command.uses_vertex_buffer {
                    let Some(vertex_buffer) = &geometry.vertex_buffer else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                }
                match &geometry.index_buffer {
                    Some(index_buffer) => {
                        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..geometry.count, 0, 0..1);
                    }
                    None => pass.draw(0..geometry.count, 0..1),
                }
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        self.uniforms.reset();
        self.frame_index += 1;
        self.prune();

        log::trace!("Submitted frame {} ({} draws)", self.frame_index, frame.commands.len());
    }
}

/// The geometry must supply every vertex the input layout reads.
fn check_geometry(
    input_layout: Option<&InputLayout>,
    geometry: &Geometry,
) -> std::result::Result<(), String> {
    let Some(layout) = input_layout.filter(|layout| !layout.is_empty()) else {
        return Ok(());
    };
    if geometry.vertex_count() == 0 {
        return Err(format!(
            "geometry has no vertex data for the input layout ({} elements)",
            layout.elements().len()
        ));
    }
    if layout.stride() > geometry.stride() || geometry.stride() % 4 != 0 {
        return Err(format!(
            "geometry stride {} does not fit the input layout ({} bytes)",
            geometry.stride(),
            layout.stride()
        ));
    }
    Ok(())
}

impl RenderBackend for WgpuBackend {
    type Shader = WgpuShader;
    type RenderTarget = WgpuRenderTarget;

    fn create_shader(&mut self, stage: ShaderStage) -> WgpuShader {
        WgpuShader::new(stage)
    }

    fn compile_shader(
        &mut self,
        shader: &mut WgpuShader,
        source: &str,
        entry_point: &str,
        input_layout: Option<&InputLayout>,
    ) -> Result<()> {
        let compiled = self.modules.compile(
            &self.context.device,
            self.frame_index,
            shader.stage(),
            source,
            entry_point,
            input_layout,
        )?;
        shader.set_compiled(compiled);
        Ok(())
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<WgpuRenderTarget> {
        WgpuRenderTarget::new(&self.context, width, height)
    }

    fn bind_render_target(&mut self, target: &WgpuRenderTarget) {
        self.flush();
        self.frame.color_view = Some(target.color_view.clone());
        self.frame.depth_view = Some(target.depth_view.clone());
    }

    fn clear(&mut self, color: [f32; 4]) {
        if !self.frame.commands.is_empty() {
            self.flush();
        }
        let [r, g, b, a] = color.map(f64::from);
        self.frame.clear_color = Some(wgpu::Color { r, g, b, a });
    }

    fn clear_depth_stencil(&mut self, depth: f32, stencil: u32) {
        if !self.frame.commands.is_empty() {
            self.flush();
        }
        self.frame.clear_depth_stencil = Some((depth, stencil));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = Some(viewport);
    }

    fn set_input_layout(&mut self, layout: Option<&InputLayout>) {
        self.state.input_layout = layout.cloned();
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        self.push_uniforms(stage, slot, data);
    }

    fn update_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        if self.state.offsets(stage).get(slot).is_some_and(Option::is_none) {
            log::trace!("Updating unbound {stage} constant buffer slot {slot}");
        }
        self.push_uniforms(stage, slot, data);
    }

    fn bind_shader(&mut self, shader: &WgpuShader) {
        let compiled = shader.compiled().cloned();
        match shader.stage() {
            ShaderStage::Vertex => self.state.vertex = compiled,
            ShaderStage::Pixel => self.state.pixel = compiled,
        }
    }

    fn bind_default_state(&mut self, state: &DefaultState) {
        self.state.blend = state.blend;
        self.state.depth_stencil = state.depth_stencil.clone();
        self.state.raster = state.raster;
        self.state.stencil_reference = state.stencil_reference;
    }

    fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.state.topology = topology;
    }

    fn draw(&mut self, geometry: &Geometry) {
        let (Some(vertex), Some(pixel)) = (&self.state.vertex, &self.state.pixel) else {
            log::trace!("Draw skipped: no compiled shaders bound");
            return;
        };
        if geometry.draw_count() == 0 {
            return;
        }
        if let Err(reason) = Self::check_draw(&self.state, vertex, pixel, geometry) {
            log::warn!("Draw skipped: {reason}");
            return;
        }

        let vertex_layout = self
            .state
            .input_layout
            .as_ref()
            .filter(|layout| !layout.is_empty())
            .map(|layout| {
                VertexLayoutKey::new(u64::from(geometry.stride()), &layout.wgpu_attributes())
            });
        let slot_masks = (
            self.state.slot_mask(ShaderStage::Vertex),
            self.state.slot_mask(ShaderStage::Pixel),
        );

        let key = PassPipelineKey {
            vertex_hash: vertex.source_hash,
            vertex_entry: vertex.entry_point.clone(),
            pixel_hash: pixel.source_hash,
            pixel_entry: pixel.entry_point.clone(),
            vertex_layout,
            slot_masks,
            topology: self.state.topology,
            cull_mode: self.state.raster.cull_mode,
            front_face: self.state.raster.front_face,
            color_target: ColorTargetKey::new(self.context.color_format, &self.state.blend),
            depth_stencil: DepthStencilKey::new(
                self.context.depth_format,
                &self.state.depth_stencil,
            ),
        };
        let pipeline = self.pipelines.get_or_create(
            &self.context.device,
            &mut self.uniforms,
            self.frame_index,
            &key,
            vertex,
            pixel,
        );
        self.modules.touch(vertex.source_hash, self.frame_index);
        self.modules.touch(pixel.source_hash, self.frame_index);

        let command = DrawCommand {
            pipeline,
            slot_masks,
            vs_offsets: self.state.dynamic_offsets(ShaderStage::Vertex),
            ps_offsets: self.state.dynamic_offsets(ShaderStage::Pixel),
            geometry: geometry.id(),
            uses_vertex_buffer: key.vertex_layout.is_some(),
            stencil_reference: self.state.stencil_reference,
            blend_constant: self.state.blend.blend_constant,
            viewport: self.state.viewport,
        };
        self.upload_geometry(geometry);
        self.frame.commands.push(command);
    }

    fn bind_blend_state(&mut self, state: &BlendStateDesc) {
        self.state.blend = *state;
    }

    fn bind_depth_stencil_state(&mut self, state: &DepthStencilDesc, stencil_reference: u32) {
        self.state.depth_stencil = state.clone();
        self.state.stencil_reference = stencil_reference;
    }

    fn bind_window_target(&mut self) {
        self.flush();
        self.frame = FrameRecording::default();
        self.state = BoundState::default();
    }

    fn release_cached_objects(&mut self) {
        self.flush();
        self.state = BoundState::default();
        let (modules, pipelines) = (self.modules.len(), self.pipelines.len());
        self.modules.clear();
        self.pipelines.clear();
        self.geometries.clear();
        log::debug!("Released {modules} shader module(s) and {pipelines} pipeline(s)");
    }
}
