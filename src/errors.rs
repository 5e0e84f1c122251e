//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ShaderLabError`] covers all failure modes including:
//! - GPU initialization failures
//! - Render target (re)creation failures
//! - Shader compilation failures
//! - Project file I/O
//! - Pipeline list misuse (bad parents, out-of-range moves)
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ShaderLabError>`.
//!
//! Shader compilation failures are *not* fatal to a frame: the engine turns
//! them into grouped diagnostics (see [`crate::messages`]) and keeps rendering.
//! Render target failures are propagated to the caller of
//! [`RenderEngine::render`](crate::engine::RenderEngine::render).

use thiserror::Error;

use crate::backend::ShaderStage;

/// The main error type for the shader lab.
#[derive(Error, Debug)]
pub enum ShaderLabError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The render target texture/view pair could not be (re)created.
    #[error("Failed to create {width}x{height} render target: {reason}")]
    RenderTargetCreateFailed {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
        /// Backend-provided reason
        reason: String,
    },

    /// A shader stage failed to compile.
    #[error("Failed to compile the {stage} shader (entry `{entry_point}`): {message}")]
    ShaderCompileFailed {
        /// Stage that failed
        stage: ShaderStage,
        /// Entry point that was requested
        entry_point: String,
        /// Compiler output
        message: String,
    },

    // ========================================================================
    // Project Files
    // ========================================================================
    /// A project file could not be read or written.
    #[error("Project file `{path}`: {source}")]
    ProjectFile {
        /// Path as given by the caller
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    // ========================================================================
    // Pipeline List Errors
    // ========================================================================
    /// The referenced item does not exist (or was removed).
    #[error("Pipeline item not found: {0}")]
    ItemNotFound(String),

    /// The item was expected to be a shader pass.
    #[error("Pipeline item `{0}` is not a shader pass")]
    NotAShaderPass(String),

    /// Shader passes cannot be nested inside other passes.
    #[error("Pipeline item `{0}` cannot be added as a child item")]
    InvalidChild(String),

    /// Index out of bounds while editing the pipeline list.
    #[error("Index out of bounds: {context} (index: {index}, len: {len})")]
    IndexOutOfBounds {
        /// Description of what was being accessed
        context: &'static str,
        /// The invalid index
        index: usize,
        /// Length of the sequence
        len: usize,
    },

    /// A variable slot index exceeds the slot table capacity.
    #[error("Variable slot {slot} out of range (capacity: {capacity})")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Slot table capacity
        capacity: usize,
    },

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Settings JSON could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Alias for `Result<T, ShaderLabError>`.
pub type Result<T> = std::result::Result<T, ShaderLabError>;
