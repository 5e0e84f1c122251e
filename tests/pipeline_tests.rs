//! Pipeline Model Tests
//!
//! Tests for:
//! - PipelineManager editing operations and their errors
//! - VariableSlots capacity and used-slot masks
//! - Constant buffer packing with system variables
//! - Primitive geometry sizes

use glam::{Mat4, Vec3};

use shaderlab::errors::ShaderLabError;
use shaderlab::geometry::{
    SphereOptions, create_cube, create_rectangle, create_sphere, create_triangle,
};
use shaderlab::pipeline::{
    CONSTANT_BUFFER_SLOTS, ConstantBuffer, GeometryItem, InputLayout, ItemKind, PipelineManager,
    PipelineSource, ShaderPass, ShaderVariable, VariableSlots, VariableValue,
};
use shaderlab::system::{SystemSemantic, SystemVariables};

fn pass() -> ShaderPass {
    ShaderPass::new("simple.wgsl", "vs_main", "simple.wgsl", "fs_main")
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn triangle_item() -> ItemKind {
    ItemKind::Geometry(GeometryItem::new(create_triangle(1.0)))
}

// ============================================================================
// PipelineManager: Editing
// ============================================================================

#[test]
fn ordered_items_follow_inserts_and_moves() -> anyhow::Result<()> {
    let mut manager = PipelineManager::new();
    let a = manager.add_pass("A", pass());
    let c = manager.add_pass("C", pass());
    let b = manager.insert_pass(1, "B", pass())?;

    assert_eq!(manager.ordered_items(), &[a, b, c]);

    manager.move_item(a, 2)?;
    assert_eq!(manager.ordered_items(), &[b, c, a]);
    assert!(manager.move_down(b)?);
    assert_eq!(manager.position(b)?, 1);
    Ok(())
}

#[test]
fn children_are_not_part_of_the_top_level_list() {
    let mut manager = PipelineManager::new();
    let p = manager.add_pass("P", pass());
    let child = manager.add_child(p, "Tri", triangle_item()).unwrap();

    assert_eq!(manager.len(), 1);
    assert!(manager.item(child).is_some());
    assert_eq!(
        manager.get(p).unwrap().as_shader_pass().unwrap().items,
        vec![child]
    );
}

#[test]
fn rename_changes_lookup_by_name() {
    let mut manager = PipelineManager::new();
    let p = manager.add_pass("Old", pass());

    manager.rename(p, "New").unwrap();
    assert_eq!(manager.find_by_name("New"), Some(p));
    assert_eq!(manager.find_by_name("Old"), None);
}

#[test]
fn removed_ids_no_longer_resolve() {
    let mut manager = PipelineManager::new();
    let p = manager.add_pass("P", pass());
    manager.remove(p).unwrap();

    assert!(manager.item(p).is_none());
    assert!(matches!(
        manager.remove(p),
        Err(ShaderLabError::ItemNotFound(_))
    ));
}

// ============================================================================
// PipelineManager: Errors
// ============================================================================

#[test]
fn insert_past_the_end_is_rejected() {
    let mut manager = PipelineManager::new();
    manager.add_pass("A", pass());

    let result = manager.insert_pass(5, "B", pass());
    assert!(matches!(
        result,
        Err(ShaderLabError::IndexOutOfBounds { index: 5, len: 1, .. })
    ));
    assert_eq!(manager.len(), 1);
}

#[test]
fn passes_cannot_be_children() {
    let mut manager = PipelineManager::new();
    let p = manager.add_pass("P", pass());

    let result = manager.add_child(p, "Nested", ItemKind::ShaderPass(pass()));
    assert!(matches!(result, Err(ShaderLabError::InvalidChild(name)) if name == "Nested"));
}

#[test]
fn children_need_a_pass_parent() {
    let mut manager = PipelineManager::new();
    let stray = manager.add_item("Stray", triangle_item());

    let result = manager.add_child(stray, "Tri", triangle_item());
    assert!(matches!(result, Err(ShaderLabError::NotAShaderPass(_))));
}

#[test]
fn move_out_of_range_is_rejected() {
    let mut manager = PipelineManager::new();
    let a = manager.add_pass("A", pass());

    assert!(matches!(
        manager.move_item(a, 1),
        Err(ShaderLabError::IndexOutOfBounds { .. })
    ));
}

// ============================================================================
// Variable Slots
// ============================================================================

#[test]
fn slot_table_has_fixed_capacity() {
    let mut slots = VariableSlots::new();
    slots.set_slot(1, ConstantBuffer::new()).unwrap();
    slots.set_slot(3, ConstantBuffer::new()).unwrap();

    assert_eq!(slots.used_mask(), 0b1010);
    assert!(matches!(
        slots.set_slot(CONSTANT_BUFFER_SLOTS, ConstantBuffer::new()),
        Err(ShaderLabError::SlotOutOfRange { .. })
    ));

    assert!(slots.clear_slot(1).unwrap().is_some());
    assert!(!slots.is_slot_used(1));
}

#[test]
fn system_variables_are_resolved_at_pack_time() {
    let buffer = ConstantBuffer::new()
        .with(ShaderVariable::system("time", SystemSemantic::Time))
        .with(ShaderVariable::new("scale", VariableValue::Float(2.0)));

    let mut system = SystemVariables::new();
    system.tick(0.25);
    system.tick(0.25);

    let mut out = Vec::new();
    buffer.pack(&system, &mut out);

    assert_eq!(floats(&out)[..2], [0.5, 2.0]);
    assert_eq!(out.len(), buffer.byte_size());
}

#[test]
fn matrices_pack_column_major() {
    let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let buffer = ConstantBuffer::new().with(ShaderVariable::new("m", VariableValue::Float4x4(m)));

    let mut out = Vec::new();
    buffer.pack(&SystemVariables::new(), &mut out);

    assert_eq!(floats(&out)[12..15], [1.0, 2.0, 3.0]);
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn primitives_match_the_standard_input_layout() {
    let stride = InputLayout::position_normal_texcoord().stride();
    for geometry in [
        create_triangle(1.0),
        create_rectangle(1.0, 1.0),
        create_cube(1.0, 1.0, 1.0),
        create_sphere(&SphereOptions::default()),
    ] {
        assert_eq!(geometry.stride(), stride);
        assert!(geometry.draw_count() > 0);
    }
}

#[test]
fn indexed_geometry_draws_its_indices() {
    let rect = create_rectangle(2.0, 1.0);
    assert_eq!(rect.vertex_count(), 4);
    assert_eq!(rect.draw_count(), 6);

    let cube = create_cube(1.0, 1.0, 1.0);
    assert_eq!(cube.draw_count(), 36);
}
