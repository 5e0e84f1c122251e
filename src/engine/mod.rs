//! Render Engine
//!
//! [`RenderEngine`] turns the user's pipeline list into GPU commands once
//! per frame:
//!
//! 1. (Re)create the offscreen render target when the viewport size changes.
//! 2. Publish the viewport size to the [`SystemVariables`] context.
//! 3. Reconcile the compiled-shader cache with the pipeline list
//!    (see [`reconciler`]).
//! 4. Clear the target and walk every cached pass in order, binding its
//!    shaders and constant buffers and running its child items.
//! 5. Restore the window target.
//!
//! The engine is backend-agnostic; all GPU work goes through a
//! [`RenderBackend`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut engine = RenderEngine::new(backend, EngineSettings::default());
//! let mut ctx = FrameContext::new(&pipeline, &project, &mut messages, &mut system);
//! let stats = engine.render(&mut ctx, 1280, 720)?;
//! ```

pub mod cache;
mod compile;
mod frame;
pub mod reconciler;

use crate::backend::{RenderBackend, Viewport};
use crate::errors::Result;
use crate::messages::DiagnosticsSink;
use crate::pipeline::{DefaultState, PipelineSource};
use crate::project::ProjectFiles;
use crate::settings::EngineSettings;
use crate::system::SystemVariables;
use crate::utils::time::{Clock, SystemClock};

pub use cache::{CacheEntry, PassState, ShaderCache};
pub use reconciler::{ReconcileReport, Reconciler};

/// Collaborators the engine needs for one call.
///
/// The pipeline list is read without synchronization and must not change
/// while the call runs.
pub struct FrameContext<'a> {
    pub pipeline: &'a dyn PipelineSource,
    pub files: &'a dyn ProjectFiles,
    pub messages: &'a mut dyn DiagnosticsSink,
    pub system: &'a mut SystemVariables,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        pipeline: &'a dyn PipelineSource,
        files: &'a dyn ProjectFiles,
        messages: &'a mut dyn DiagnosticsSink,
        system: &'a mut SystemVariables,
    ) -> Self {
        Self {
            pipeline,
            files,
            messages,
            system,
        }
    }
}

/// Counters for one rendered frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub reconcile: ReconcileReport,
    /// Shader passes that were bound.
    pub passes: usize,
    pub draws: usize,
    /// Blend and depth/stencil state changes.
    pub state_changes: usize,
    /// Cached entries skipped because they no longer resolve to a pass.
    pub skipped: usize,
}

/// Pipeline cache reconciler and frame renderer.
pub struct RenderEngine<B: RenderBackend> {
    backend: B,
    settings: EngineSettings,
    cache: ShaderCache<B::Shader>,
    reconciler: Reconciler,
    render_target: Option<B::RenderTarget>,
    last_size: (u32, u32),
    default_state: DefaultState,
    scratch: Vec<u8>,
}

impl<B: RenderBackend> RenderEngine<B> {
    #[must_use]
    pub fn new(backend: B, settings: EngineSettings) -> Self {
        Self::with_clock(backend, settings, Box::new(SystemClock::new()))
    }

    /// Uses `clock` to time the reconcile throttle.
    #[must_use]
    pub fn with_clock(backend: B, settings: EngineSettings, clock: Box<dyn Clock>) -> Self {
        let reconciler = Reconciler::new(clock, settings.scan_interval());
        Self {
            backend,
            settings,
            cache: ShaderCache::new(),
            reconciler,
            render_target: None,
            last_size: (0, 0),
            default_state: DefaultState::default(),
            scratch: Vec::with_capacity(256),
        }
    }

    /// Renders one frame into the offscreen target.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderLabError::RenderTargetCreateFailed`](crate::errors::ShaderLabError::RenderTargetCreateFailed)
    /// when the target cannot be recreated for a new size. The previous size
    /// is kept so the next call retries. Shader compile failures are not
    /// errors; they are reported to `ctx.messages`.
    pub fn render(
        &mut self,
        ctx: &mut FrameContext<'_>,
        width: u32,
        height: u32,
    ) -> Result<FrameStats> {
        self.sync_render_target(width, height)?;

        ctx.system.set_viewport_size(width, height);

        let mut stats = FrameStats {
            reconcile: self.reconcile(ctx),
            ..FrameStats::default()
        };

        let Some(target) = &self.render_target else {
            log::trace!("No render target yet ({width}x{height}), frame skipped");
            return Ok(stats);
        };

        self.backend.bind_render_target(target);
        self.backend.clear(self.settings.clear_color);
        self.backend
            .clear_depth_stencil(self.settings.clear_depth, self.settings.clear_stencil);
        self.backend.set_viewport(Viewport::full(width, height));

        frame::draw_passes(
            &mut self.backend,
            &self.cache,
            ctx.pipeline,
            ctx.system,
            &self.default_state,
            &mut self.scratch,
            &mut stats,
        );

        self.backend.bind_window_target();
        Ok(stats)
    }

    /// Throttled cache reconcile. Called by [`render`](Self::render).
    pub fn reconcile(&mut self, ctx: &mut FrameContext<'_>) -> ReconcileReport {
        self.reconciler.reconcile(
            &mut self.backend,
            &mut self.cache,
            ctx.pipeline,
            ctx.files,
            ctx.messages,
        )
    }

    /// Recompiles every cached shader pass named `name`, in place.
    ///
    /// Ignores the reconcile throttle. Returns the number of passes that were
    /// recompiled.
    pub fn recompile(&mut self, ctx: &mut FrameContext<'_>, name: &str) -> usize {
        let mut count = 0;
        for index in 0..self.cache.len() {
            let Some(entry) = self.cache.entry_at_mut(index) else {
                continue;
            };
            let Some(item) = ctx.pipeline.item(entry.item) else {
                continue;
            };
            if item.name != name {
                continue;
            }
            let Some(pass) = item.as_shader_pass() else {
                continue;
            };

            entry.state = compile::compile_pass(
                &mut self.backend,
                &mut entry.vertex,
                &mut entry.pixel,
                &item.name,
                pass,
                ctx.files,
                ctx.messages,
            );
            count += 1;
        }
        log::debug!("Recompiled {count} shader pass(es) named `{name}`");
        count
    }

    /// Drops every cached shader object, then lets the backend release what
    /// it derived from them. Runs on drop; safe to call again.
    pub fn flush_cache(&mut self) {
        let count = self.cache.len();
        self.cache.clear();
        if count > 0 {
            log::info!("Flushed {count} cached shader pass(es)");
            self.backend.release_cached_objects();
        }
    }

    fn sync_render_target(&mut self, width: u32, height: u32) -> Result<()> {
        if self.last_size == (width, height) {
            return Ok(());
        }
        let target = self.backend.create_render_target(width, height)?;
        log::info!("Render target recreated at {width}x{height}");
        self.render_target = Some(target);
        self.last_size = (width, height);
        Ok(())
    }

    #[must_use]
    pub fn cache(&self) -> &ShaderCache<B::Shader> {
        &self.cache
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn render_target(&self) -> Option<&B::RenderTarget> {
        self.render_target.as_ref()
    }

    /// Size of the current render target.
    #[must_use]
    pub fn last_size(&self) -> (u32, u32) {
        self.last_size
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.reconciler.set_scan_interval(settings.scan_interval());
        self.settings = settings;
    }
}

impl<B: RenderBackend> Drop for RenderEngine<B> {
    fn drop(&mut self) {
        self.flush_cache();
    }
}
