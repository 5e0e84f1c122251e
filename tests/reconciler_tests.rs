//! Reconciler Tests
//!
//! Tests for:
//! - First scan compiles every pass in list order
//! - Idempotence of repeated scans, inside and after the scan window
//! - Insertions, removals and reorders reaching the cache
//! - Shader objects surviving inserts and reorders untouched
//! - The equal-length scan window
//! - Top-level items that are not shader passes

mod common;

use std::collections::HashMap;

use common::{Harness, pass};
use shaderlab::engine::PassState;
use shaderlab::geometry::create_triangle;
use shaderlab::messages::Severity;
use shaderlab::pipeline::{GeometryItem, ItemId, ItemKind, PipelineSource};

fn harness_with(names: &[&str]) -> Harness {
    let mut h = Harness::new();
    for name in names {
        h.pipeline.add_pass(*name, pass("good.wgsl"));
    }
    h
}

/// `(vertex, pixel)` shader object ids of every cached pass.
fn shader_ids(h: &Harness) -> HashMap<ItemId, (u64, u64)> {
    h.pipeline
        .ordered_items()
        .iter()
        .filter_map(|&id| {
            let entry = h.engine.cache().get(id)?;
            Some((id, (entry.vertex().id, entry.pixel().id)))
        })
        .collect()
}

// ============================================================================
// Initial Scan
// ============================================================================

#[test]
fn first_reconcile_compiles_every_pass_in_order() {
    let mut h = harness_with(&["A", "B", "C"]);

    let report = h.reconcile();

    assert!(report.scanned);
    assert_eq!(report.inserted, 3);
    assert_eq!(h.backend().compiles, 6);
    assert_eq!(h.cached_names(), ["A", "B", "C"]);
    assert!(
        h.engine
            .cache()
            .iter()
            .all(|entry| entry.state() == PassState::Ready)
    );
}

#[test]
fn repeated_scans_are_idempotent() {
    let mut h = harness_with(&["A", "B"]);
    h.reconcile();
    let compiles = h.backend().compiles;

    for _ in 0..3 {
        h.expire_scan_window();
        let report = h.reconcile();
        assert!(report.scanned);
        assert!(!report.changed());
    }

    assert_eq!(h.backend().compiles, compiles);
    assert_eq!(h.cached_names(), ["A", "B"]);
}

#[test]
fn scans_inside_the_window_change_nothing() {
    let mut h = harness_with(&["A", "B"]);
    h.reconcile();
    let compiles = h.backend().compiles;
    let shaders = shader_ids(&h);

    for _ in 0..3 {
        let report = h.reconcile();
        assert!(!report.scanned);
        assert!(!report.changed());
    }

    assert_eq!(h.backend().compiles, compiles);
    assert_eq!(shader_ids(&h), shaders);
    assert!(h.backend().dropped().is_empty());
}

// ============================================================================
// Insertion & Removal
// ============================================================================

#[test]
fn inserted_pass_lands_at_its_list_position() {
    let mut h = harness_with(&["A", "C"]);
    h.reconcile();
    let compiles = h.backend().compiles;
    let before = shader_ids(&h);

    let b = h.pipeline.insert_pass(1, "B", pass("good.wgsl")).unwrap();
    let report = h.reconcile();

    assert_eq!(report.inserted, 1);
    assert_eq!(h.backend().compiles, compiles + 2);
    assert_eq!(h.cached_names(), ["A", "B", "C"]);

    // Existing entries keep their shader objects.
    let mut after = shader_ids(&h);
    assert!(after.remove(&b).is_some());
    assert_eq!(after, before);
    assert!(h.backend().dropped().is_empty());
}

#[test]
fn removed_pass_releases_its_shaders() {
    let mut h = harness_with(&["A", "B", "C"]);
    h.reconcile();

    let b = h.pipeline.find_by_name("B").unwrap();
    let entry = h.engine.cache().get(b).unwrap();
    let ids = [entry.vertex().id, entry.pixel().id];

    h.pipeline.remove(b).unwrap();
    let report = h.reconcile();

    assert_eq!(report.removed, 1);
    assert_eq!(h.cached_names(), ["A", "C"]);
    let dropped = h.backend().dropped();
    assert_eq!(dropped.len(), 2);
    assert!(ids.iter().all(|id| dropped.contains(id)));
}

#[test]
fn removing_and_adding_in_one_window_is_seen_after_the_window() {
    let mut h = harness_with(&["A", "B"]);
    h.reconcile();

    let a = h.pipeline.find_by_name("A").unwrap();
    h.pipeline.remove(a).unwrap();
    h.pipeline.add_pass("D", pass("good.wgsl"));

    // Same length: the scan waits for the window.
    assert!(!h.reconcile().scanned);
    assert_eq!(h.engine.cache().len(), 2);

    h.expire_scan_window();
    let report = h.reconcile();
    assert_eq!((report.inserted, report.removed), (1, 1));
    assert_eq!(h.cached_names(), ["B", "D"]);
}

// ============================================================================
// Reordering
// ============================================================================

#[test]
fn reorder_is_applied_without_recompiling() {
    let mut h = harness_with(&["A", "B", "C", "D"]);
    h.reconcile();
    let compiles = h.backend().compiles;
    let before = shader_ids(&h);

    let d = h.pipeline.find_by_name("D").unwrap();
    h.pipeline.move_item(d, 0).unwrap();
    let b = h.pipeline.find_by_name("B").unwrap();
    h.pipeline.move_item(b, 3).unwrap();
    assert_eq!(h.pipeline_names(), ["D", "A", "C", "B"]);

    // Pure reorder keeps the length, so it is stale until the window passes.
    assert!(!h.reconcile().scanned);
    assert_eq!(h.cached_names(), ["A", "B", "C", "D"]);

    h.expire_scan_window();
    let report = h.reconcile();
    assert!(report.moved > 0);
    assert_eq!(report.inserted + report.removed, 0);
    assert_eq!(h.cached_names(), h.pipeline_names());
    assert_eq!(h.backend().compiles, compiles);

    // The same shader objects follow their items to the new positions.
    assert_eq!(shader_ids(&h), before);
    assert!(h.backend().dropped().is_empty());
}

#[test]
fn reversed_list_converges_in_one_scan() {
    let mut h = harness_with(&["A", "B", "C", "D", "E"]);
    h.reconcile();

    for name in ["E", "D", "C", "B", "A"].iter().rev() {
        let id = h.pipeline.find_by_name(name).unwrap();
        h.pipeline.move_item(id, 0).unwrap();
    }
    assert_eq!(h.pipeline_names(), ["E", "D", "C", "B", "A"]);

    h.expire_scan_window();
    h.reconcile();
    assert_eq!(h.cached_names(), ["E", "D", "C", "B", "A"]);
}

#[test]
fn mixed_edits_converge() {
    let mut h = harness_with(&["A", "B", "C"]);
    h.reconcile();

    let a = h.pipeline.find_by_name("A").unwrap();
    h.pipeline.remove(a).unwrap();
    h.pipeline.insert_pass(0, "X", pass("good.wgsl")).unwrap();
    h.pipeline.add_pass("Y", pass("good.wgsl"));
    let c = h.pipeline.find_by_name("C").unwrap();
    h.pipeline.move_item(c, 0).unwrap();

    let report = h.reconcile();
    assert_eq!((report.inserted, report.removed), (2, 1));
    assert_eq!(h.cached_names(), h.pipeline_names());
}

// ============================================================================
// Non-pass Items
// ============================================================================

#[test]
fn top_level_geometry_gets_a_failed_entry() {
    let mut h = harness_with(&["A"]);
    h.pipeline.add_item(
        "Stray",
        ItemKind::Geometry(GeometryItem::new(create_triangle(1.0))),
    );

    h.reconcile();

    let stray = h.pipeline.find_by_name("Stray").unwrap();
    assert_eq!(h.engine.cache().get(stray).unwrap().state(), PassState::Failed);
    assert_eq!(h.backend().compiles, 2);

    let reported: Vec<_> = h.messages.group("Stray").collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].severity, Severity::Error);
}

#[test]
fn non_pass_entry_is_skipped_when_rendering() {
    let mut h = harness_with(&["A"]);
    h.pipeline.add_item(
        "Stray",
        ItemKind::BlendState(shaderlab::pipeline::BlendState::default()),
    );

    let stats = h.render(64, 64).unwrap();
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.skipped, 1);
}
