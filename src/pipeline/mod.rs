//! Pipeline Model
//!
//! The user-authored render sequence: an ordered list of [`PipelineItem`]s.
//! Top-level items are shader passes; each pass owns an ordered list of
//! child items (geometry draws and state changes) executed while it is bound.
//!
//! The engine never owns this list. It reads it through [`PipelineSource`]
//! once per frame, and [`PipelineManager`] is the default owner.

mod input_layout;
mod item;
mod manager;
mod state;
mod variables;

pub use input_layout::{InputElement, InputFormat, InputLayout};
pub use item::{
    BlendState, DepthStencilState, GeometryItem, ItemId, ItemKind, PipelineItem, ShaderPass,
};
pub use manager::PipelineManager;
pub use state::{BlendStateDesc, DefaultState, DepthStencilDesc, RasterStateDesc};
pub use variables::{
    CONSTANT_BUFFER_SLOTS, ConstantBuffer, ShaderVariable, VariableSlots, VariableValue,
};

/// Read access to the external render sequence.
///
/// The list is read without synchronization. Implementors must not be
/// mutated while [`RenderEngine::render`](crate::engine::RenderEngine::render)
/// or [`RenderEngine::recompile`](crate::engine::RenderEngine::recompile) runs;
/// edits happen between frames.
pub trait PipelineSource {
    /// Top-level item ids in render order.
    fn ordered_items(&self) -> &[ItemId];

    /// Resolves an id. Returns `None` for removed items.
    fn item(&self, id: ItemId) -> Option<&PipelineItem>;
}
