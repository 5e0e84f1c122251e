//! Shader Variables & Slot Tables
//!
//! Each shader stage of a pass owns a fixed-capacity [`VariableSlots`] table.
//! A slot is either unused or holds a [`ConstantBuffer`]: an ordered list of
//! [`ShaderVariable`]s that packs into a single uniform block.
//!
//! # Binding Model
//!
//! Slot `i` of the vertex table maps to `@group(0) @binding(i)` and slot `i`
//! of the pixel table maps to `@group(1) @binding(i)` in WGSL.
//!
//! # Layout
//!
//! Packing follows the WGSL uniform address space rules:
//!
//! | Type            | Size | Alignment |
//! |-----------------|------|-----------|
//! | `bool` / `i32` / `f32` | 4 | 4 |
//! | `vec2<i32>` / `vec2<f32>` | 8 | 8 |
//! | `vec3<f32>`     | 12   | 16        |
//! | `vec4<f32>`     | 16   | 16        |
//! | `mat3x3<f32>`   | 48   | 16        |
//! | `mat4x4<f32>`   | 64   | 16        |
//!
//! The block size is rounded up to 16 bytes.

use glam::{IVec2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::errors::{Result, ShaderLabError};
use crate::system::{SystemSemantic, SystemVariables};

/// Number of constant buffer slots per shader stage.
///
/// Both stages together stay within wgpu's default limit of eight dynamic
/// uniform buffers per pipeline layout.
pub const CONSTANT_BUFFER_SLOTS: usize = 4;

/// CPU-side value of a shader variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableValue {
    Boolean(bool),
    Integer(i32),
    Integer2(IVec2),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Float3x3(Mat3),
    Float4x4(Mat4),
}

impl VariableValue {
    /// `(size, alignment)` in the uniform address space.
    #[must_use]
    pub fn layout(&self) -> (usize, usize) {
        match self {
            Self::Boolean(_) | Self::Integer(_) | Self::Float(_) => (4, 4),
            Self::Integer2(_) | Self::Float2(_) => (8, 8),
            Self::Float3(_) => (12, 16),
            Self::Float4(_) => (16, 16),
            Self::Float3x3(_) => (48, 16),
            Self::Float4x4(_) => (64, 16),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Boolean(v) => out.extend_from_slice(bytemuck::bytes_of(&u32::from(*v))),
            Self::Integer(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Integer2(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float2(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float3(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float4(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float3x3(m) => {
                for column in [m.x_axis, m.y_axis, m.z_axis] {
                    out.extend_from_slice(bytemuck::bytes_of(&column));
                    out.extend_from_slice(&[0u8; 4]);
                }
            }
            Self::Float4x4(m) => out.extend_from_slice(bytemuck::bytes_of(m)),
        }
    }
}

/// A named value inside a [`ConstantBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderVariable {
    pub name: String,
    pub value: VariableValue,
    /// When set, the value is taken from [`SystemVariables`] at upload time.
    pub system: Option<SystemSemantic>,
}

impl ShaderVariable {
    #[must_use]
    pub fn new(name: impl Into<String>, value: VariableValue) -> Self {
        Self {
            name: name.into(),
            value,
            system: None,
        }
    }

    /// A variable fed from the system-variable context.
    #[must_use]
    pub fn system(name: impl Into<String>, semantic: SystemSemantic) -> Self {
        Self {
            name: name.into(),
            value: SystemVariables::new().value(semantic),
            system: Some(semantic),
        }
    }

    fn resolve(&self, system: &SystemVariables) -> VariableValue {
        match self.system {
            Some(semantic) => system.value(semantic),
            None => self.value,
        }
    }
}

/// Ordered variables packed into one uniform block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantBuffer {
    variables: Vec<ShaderVariable>,
}

impl ConstantBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, variable: ShaderVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn add(&mut self, variable: ShaderVariable) {
        self.variables.push(variable);
    }

    #[must_use]
    pub fn variables(&self) -> &[ShaderVariable] {
        &self.variables
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ShaderVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ShaderVariable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    /// Packs the current values into `out` (cleared first).
    pub fn pack(&self, system: &SystemVariables, out: &mut Vec<u8>) {
        out.clear();
        for variable in &self.variables {
            let value = variable.resolve(system);
            let (_, align) = value.layout();
            out.resize(out.len().next_multiple_of(align), 0);
            value.write(out);
        }
        out.resize(out.len().next_multiple_of(16).max(16), 0);
    }

    /// Packed size in bytes.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        let mut size = 0usize;
        for variable in &self.variables {
            let (len, align) = variable.value.layout();
            size = size.next_multiple_of(align) + len;
        }
        size.next_multiple_of(16).max(16)
    }
}

/// Fixed-capacity table of optional constant buffers for one shader stage.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSlots {
    slots: [Option<ConstantBuffer>; CONSTANT_BUFFER_SLOTS],
}

impl Default for VariableSlots {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl VariableSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<&ConstantBuffer> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut ConstantBuffer> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn set_slot(&mut self, slot: usize, buffer: ConstantBuffer) -> Result<()> {
        let entry = self.slots.get_mut(slot).ok_or(ShaderLabError::SlotOutOfRange {
            slot,
            capacity: CONSTANT_BUFFER_SLOTS,
        })?;
        *entry = Some(buffer);
        Ok(())
    }

    pub fn clear_slot(&mut self, slot: usize) -> Result<Option<ConstantBuffer>> {
        let entry = self.slots.get_mut(slot).ok_or(ShaderLabError::SlotOutOfRange {
            slot,
            capacity: CONSTANT_BUFFER_SLOTS,
        })?;
        Ok(entry.take())
    }

    /// Used slots in ascending slot order.
    pub fn used_slots(&self) -> impl Iterator<Item = (usize, &ConstantBuffer)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|buffer| (i, buffer)))
    }

    /// Bit `i` is set when slot `i` is used.
    #[must_use]
    pub fn used_mask(&self) -> u32 {
        self.used_slots().fold(0, |mask, (i, _)| mask | (1 << i))
    }
}
