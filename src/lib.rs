#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # ShaderLab
//!
//! Pipeline cache reconciler and frame renderer for live shader prototyping.
//!
//! A host application edits an ordered list of pipeline items (shader
//! passes with geometry and state children). Every frame the
//! [`RenderEngine`] brings its compiled-shader cache in line with that list
//! and replays it into an offscreen render target through a
//! [`RenderBackend`].
//!
//! ```rust,ignore
//! use shaderlab::prelude::*;
//!
//! let mut pipeline = PipelineManager::new();
//! pipeline.add_pass("Simple", ShaderPass::new("simple.wgsl", "vs_main", "simple.wgsl", "fs_main"));
//!
//! let backend = WgpuBackend::new(&WgpuSettings::default())?;
//! let mut engine = RenderEngine::new(backend, EngineSettings::default());
//! let project = ProjectDirectory::new("shaders");
//! let mut messages = MessageStack::new();
//! let mut system = SystemVariables::new();
//!
//! let mut ctx = FrameContext::new(&pipeline, &project, &mut messages, &mut system);
//! engine.render(&mut ctx, 800, 600)?;
//! ```

pub mod backend;
pub mod engine;
pub mod errors;
pub mod geometry;
pub mod messages;
pub mod pipeline;
pub mod project;
pub mod settings;
pub mod system;
pub mod utils;

pub use backend::{RenderBackend, ShaderStage, Viewport, WgpuBackend};
pub use engine::{FrameContext, FrameStats, PassState, RenderEngine};
pub use errors::{Result, ShaderLabError};
pub use geometry::Geometry;
pub use messages::{DiagnosticsSink, MessageStack, Severity};
pub use pipeline::{PipelineManager, PipelineSource, ShaderPass};
pub use project::{ProjectDirectory, ProjectFiles};
pub use settings::{EngineSettings, WgpuSettings};
pub use system::{SystemSemantic, SystemVariables};

/// Common imports for host applications.
pub mod prelude {
    pub use crate::backend::{RenderBackend, WgpuBackend};
    pub use crate::engine::{FrameContext, RenderEngine};
    pub use crate::geometry::{Geometry, primitives::*};
    pub use crate::messages::MessageStack;
    pub use crate::pipeline::{
        BlendState, ConstantBuffer, DepthStencilState, GeometryItem, InputFormat, InputLayout,
        ItemKind, PipelineManager, ShaderPass, ShaderVariable, VariableSlots, VariableValue,
    };
    pub use crate::project::ProjectDirectory;
    pub use crate::settings::{EngineSettings, WgpuSettings};
    pub use crate::system::{SystemSemantic, SystemVariables};
}
