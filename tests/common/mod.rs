//! Shared fixtures for the engine integration tests.
//!
//! - `RecordingBackend`: a `RenderBackend` that logs every command
//! - `MemoryFiles`: an in-memory `ProjectFiles`
//! - `Harness`: owns the collaborators of one engine and drives frames

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use shaderlab::backend::{RenderBackend, ShaderStage, Viewport};
use shaderlab::engine::{FrameContext, FrameStats, ReconcileReport, RenderEngine};
use shaderlab::errors::{Result, ShaderLabError};
use shaderlab::geometry::{Geometry, GeometryId};
use shaderlab::messages::MessageStack;
use shaderlab::pipeline::{
    BlendStateDesc, DefaultState, DepthStencilDesc, InputLayout, PipelineManager, ShaderPass,
};
use shaderlab::project::ProjectFiles;
use shaderlab::settings::EngineSettings;
use shaderlab::system::SystemVariables;
use shaderlab::utils::ManualClock;

/// WGSL-ish source that the mock compiler accepts for the default entries.
pub const GOOD_SOURCE: &str = "fn vs_main() {} fn fs_main() {}";
pub const BROKEN_SOURCE: &str = "fn vs_main() { syntax error } fn fs_main() {}";

/// One command received by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(ShaderStage),
    Compile {
        stage: ShaderStage,
        entry: String,
        with_layout: bool,
    },
    CreateRenderTarget(u32, u32),
    BindRenderTarget(u32),
    Clear([f32; 4]),
    ClearDepthStencil(f32, u32),
    SetViewport(Viewport),
    SetInputLayout(Option<usize>),
    BindConstantBuffer(ShaderStage, usize, usize),
    UpdateConstantBuffer(ShaderStage, usize, usize),
    BindShader(ShaderStage, u64),
    BindDefaultState,
    SetTopology(wgpu::PrimitiveTopology),
    Draw(GeometryId),
    BindBlendState,
    BindDepthStencilState(u32),
    BindWindowTarget,
    /// Carries the number of shaders already dropped when it was issued.
    ReleaseCachedObjects(usize),
}

#[derive(Debug)]
pub struct MockShader {
    pub id: u64,
    pub stage: ShaderStage,
    pub compiled: Option<String>,
    drops: Rc<RefCell<Vec<u64>>>,
}

impl Drop for MockShader {
    fn drop(&mut self) {
        self.drops.borrow_mut().push(self.id);
    }
}

#[derive(Debug)]
pub struct MockTarget {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub compiles: usize,
    pub targets_created: u32,
    pub fail_targets: bool,
    pub dropped_shaders: Rc<RefCell<Vec<u64>>>,
    next_shader: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded after the last `BindRenderTarget`.
    pub fn last_frame(&self) -> &[Call] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, Call::BindRenderTarget(_)))
            .unwrap_or(0);
        &self.calls[start..]
    }

    pub fn dropped(&self) -> Vec<u64> {
        self.dropped_shaders.borrow().clone()
    }
}

impl RenderBackend for RecordingBackend {
    type Shader = MockShader;
    type RenderTarget = MockTarget;

    fn create_shader(&mut self, stage: ShaderStage) -> MockShader {
        self.calls.push(Call::CreateShader(stage));
        self.next_shader += 1;
        MockShader {
            id: self.next_shader,
            stage,
            compiled: None,
            drops: Rc::clone(&self.dropped_shaders),
        }
    }

    fn compile_shader(
        &mut self,
        shader: &mut MockShader,
        source: &str,
        entry_point: &str,
        input_layout: Option<&InputLayout>,
    ) -> Result<()> {
        self.calls.push(Call::Compile {
            stage: shader.stage,
            entry: entry_point.to_string(),
            with_layout: input_layout.is_some(),
        });
        self.compiles += 1;

        let fail = |message: &str| ShaderLabError::ShaderCompileFailed {
            stage: shader.stage,
            entry_point: entry_point.to_string(),
            message: message.to_string(),
        };
        if source.contains("syntax error") {
            return Err(fail("syntax error"));
        }
        if !source.contains(entry_point) {
            return Err(fail("entry point not found"));
        }
        shader.compiled = Some(source.to_string());
        Ok(())
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<MockTarget> {
        self.calls.push(Call::CreateRenderTarget(width, height));
        if self.fail_targets || width == 0 || height == 0 {
            return Err(ShaderLabError::RenderTargetCreateFailed {
                width,
                height,
                reason: "mock failure".to_string(),
            });
        }
        self.targets_created += 1;
        Ok(MockTarget {
            id: self.targets_created,
            width,
            height,
        })
    }

    fn bind_render_target(&mut self, target: &MockTarget) {
        self.calls.push(Call::BindRenderTarget(target.id));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(Call::Clear(color));
    }

    fn clear_depth_stencil(&mut self, depth: f32, stencil: u32) {
        self.calls.push(Call::ClearDepthStencil(depth, stencil));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn set_input_layout(&mut self, layout: Option<&InputLayout>) {
        self.calls
            .push(Call::SetInputLayout(layout.map(|l| l.elements().len())));
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        self.calls
            .push(Call::BindConstantBuffer(stage, slot, data.len()));
    }

    fn update_constant_buffer(&mut self, stage: ShaderStage, slot: usize, data: &[u8]) {
        self.calls
            .push(Call::UpdateConstantBuffer(stage, slot, data.len()));
    }

    fn bind_shader(&mut self, shader: &MockShader) {
        self.calls.push(Call::BindShader(shader.stage, shader.id));
    }

    fn bind_default_state(&mut self, _state: &DefaultState) {
        self.calls.push(Call::BindDefaultState);
    }

    fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.calls.push(Call::SetTopology(topology));
    }

    fn draw(&mut self, geometry: &Geometry) {
        self.calls.push(Call::Draw(geometry.id()));
    }

    fn bind_blend_state(&mut self, _state: &BlendStateDesc) {
        self.calls.push(Call::BindBlendState);
    }

    fn bind_depth_stencil_state(&mut self, _state: &DepthStencilDesc, stencil_reference: u32) {
        self.calls.push(Call::BindDepthStencilState(stencil_reference));
    }

    fn bind_window_target(&mut self) {
        self.calls.push(Call::BindWindowTarget);
    }

    fn release_cached_objects(&mut self) {
        let dropped = self.dropped_shaders.borrow().len();
        self.calls.push(Call::ReleaseCachedObjects(dropped));
    }
}

/// In-memory project files keyed by path.
#[derive(Default)]
pub struct MemoryFiles {
    files: HashMap<String, String>,
}

impl MemoryFiles {
    pub fn set(&mut self, path: &str, source: &str) {
        self.files.insert(path.to_string(), source.to_string());
    }
}

impl ProjectFiles for MemoryFiles {
    fn load_project_file(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ShaderLabError::ProjectFile {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
    }
}

/// A pass that reads both stages from `path` with the default entries.
pub fn pass(path: &str) -> ShaderPass {
    ShaderPass::new(path, "vs_main", path, "fs_main")
}

/// Engine plus everything a frame needs, driven by a manual clock.
pub struct Harness {
    pub engine: RenderEngine<RecordingBackend>,
    pub clock: ManualClock,
    pub pipeline: PipelineManager,
    pub files: MemoryFiles,
    pub messages: MessageStack,
    pub system: SystemVariables,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new();
        let engine = RenderEngine::with_clock(
            RecordingBackend::new(),
            EngineSettings::default(),
            Box::new(clock.clone()),
        );
        let mut files = MemoryFiles::default();
        files.set("good.wgsl", GOOD_SOURCE);
        files.set("broken.wgsl", BROKEN_SOURCE);
        Self {
            engine,
            clock,
            pipeline: PipelineManager::new(),
            files,
            messages: MessageStack::new(),
            system: SystemVariables::new(),
        }
    }

    pub fn render(&mut self, width: u32, height: u32) -> Result<FrameStats> {
        let mut ctx = FrameContext::new(
            &self.pipeline,
            &self.files,
            &mut self.messages,
            &mut self.system,
        );
        self.engine.render(&mut ctx, width, height)
    }

    pub fn reconcile(&mut self) -> ReconcileReport {
        let mut ctx = FrameContext::new(
            &self.pipeline,
            &self.files,
            &mut self.messages,
            &mut self.system,
        );
        self.engine.reconcile(&mut ctx)
    }

    pub fn recompile(&mut self, name: &str) -> usize {
        let mut ctx = FrameContext::new(
            &self.pipeline,
            &self.files,
            &mut self.messages,
            &mut self.system,
        );
        self.engine.recompile(&mut ctx, name)
    }

    /// Moves the clock past the equal-length scan window.
    pub fn expire_scan_window(&mut self) {
        self.clock.advance(Duration::from_secs(1));
    }

    pub fn backend(&self) -> &RecordingBackend {
        self.engine.backend()
    }

    pub fn backend_mut(&mut self) -> &mut RecordingBackend {
        self.engine.backend_mut()
    }

    /// Cached item names in snapshot order.
    pub fn cached_names(&self) -> Vec<String> {
        self.engine
            .cache()
            .items()
            .map(|id| {
                self.pipeline
                    .get(id)
                    .map_or_else(|| "<removed>".to_string(), |item| item.name.clone())
            })
            .collect()
    }

    pub fn pipeline_names(&self) -> Vec<String> {
        self.pipeline
            .list()
            .iter()
            .filter_map(|&id| self.pipeline.get(id))
            .map(|item| item.name.clone())
            .collect()
    }
}
