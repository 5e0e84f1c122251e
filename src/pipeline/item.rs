use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use slotmap::new_key_type;

use super::input_layout::InputLayout;
use super::state::{BlendStateDesc, DepthStencilDesc};
use super::variables::VariableSlots;
use crate::geometry::Geometry;

new_key_type! {
    /// Stable identity of a pipeline item.
    ///
    /// Generation-checked: a removed item's id never aliases a newer item,
    /// even if the storage slot is reused.
    pub struct ItemId;
}

/// One entry of the user-authored render sequence.
#[derive(Debug, Clone)]
pub struct PipelineItem {
    /// Display name. Not unique; used to group diagnostics and to address
    /// recompile requests.
    pub name: String,
    pub kind: ItemKind,
}

impl PipelineItem {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn as_shader_pass(&self) -> Option<&ShaderPass> {
        match &self.kind {
            ItemKind::ShaderPass(pass) => Some(pass),
            _ => None,
        }
    }

    pub fn as_shader_pass_mut(&mut self) -> Option<&mut ShaderPass> {
        match &mut self.kind {
            ItemKind::ShaderPass(pass) => Some(pass),
            _ => None,
        }
    }
}

/// Payload of a [`PipelineItem`].
#[derive(Debug, Clone)]
pub enum ItemKind {
    ShaderPass(ShaderPass),
    Geometry(GeometryItem),
    BlendState(BlendState),
    DepthStencilState(DepthStencilState),
}

impl ItemKind {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ShaderPass(_) => "ShaderPass",
            Self::Geometry(_) => "Geometry",
            Self::BlendState(_) => "BlendState",
            Self::DepthStencilState(_) => "DepthStencilState",
        }
    }
}

/// A vertex + pixel shader pair, its variables, and the child items drawn
/// while it is bound.
#[derive(Debug, Clone)]
pub struct ShaderPass {
    pub vs_path: String,
    pub vs_entry: String,
    pub ps_path: String,
    pub ps_entry: String,
    pub input_layout: InputLayout,
    pub vs_variables: VariableSlots,
    pub ps_variables: VariableSlots,
    /// Ordered child items (geometry and state changes).
    pub items: Vec<ItemId>,
}

impl ShaderPass {
    #[must_use]
    pub fn new(
        vs_path: impl Into<String>,
        vs_entry: impl Into<String>,
        ps_path: impl Into<String>,
        ps_entry: impl Into<String>,
    ) -> Self {
        Self {
            vs_path: vs_path.into(),
            vs_entry: vs_entry.into(),
            ps_path: ps_path.into(),
            ps_entry: ps_entry.into(),
            input_layout: InputLayout::default(),
            vs_variables: VariableSlots::default(),
            ps_variables: VariableSlots::default(),
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_input_layout(mut self, layout: InputLayout) -> Self {
        self.input_layout = layout;
        self
    }

    #[must_use]
    pub fn with_vs_variables(mut self, slots: VariableSlots) -> Self {
        self.vs_variables = slots;
        self
    }

    #[must_use]
    pub fn with_ps_variables(mut self, slots: VariableSlots) -> Self {
        self.ps_variables = slots;
        self
    }
}

/// A draw of one geometry with a model transform.
#[derive(Debug, Clone)]
pub struct GeometryItem {
    pub geometry: Arc<Geometry>,
    pub topology: wgpu::PrimitiveTopology,
    pub position: Vec3,
    /// Euler angles in radians, applied in Y, X, Z order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl GeometryItem {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Arc::new(geometry),
            topology: wgpu::PrimitiveTopology::TriangleList,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Model matrix: scale, then rotate, then translate.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// Changes blending for the following draws of the current pass.
#[derive(Debug, Clone, Default)]
pub struct BlendState {
    pub state: BlendStateDesc,
}

/// Changes depth/stencil testing for the following draws of the current pass.
#[derive(Debug, Clone, Default)]
pub struct DepthStencilState {
    pub state: DepthStencilDesc,
    pub stencil_reference: u32,
}
