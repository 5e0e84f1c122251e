//! Reconciler
//!
//! Brings the [`ShaderCache`] in line with the external item list.
//!
//! # Throttling
//!
//! When the external list has the same length as the snapshot, the list is
//! assumed unchanged and the full identity scan only runs once the scan
//! timer exceeds the scan interval (the timer then restarts). A length change
//! scans immediately and leaves the timer alone.
//!
//! A reorder that keeps the length therefore becomes visible to the cache
//! only at the next interval. Until then the renderer keeps walking the
//! previous snapshot order.
//!
//! # Scan
//!
//! 1. Insertions, in external order: a new id is inserted at its external
//!    index and compiled immediately.
//! 2. Removals, in snapshot order: entries whose id left the list are dropped.
//! 3. Moves, left to right: each mismatched position pulls the matching
//!    entry into place. Shader objects are never recompiled by a move.

use std::time::Duration;

use super::cache::ShaderCache;
use super::compile;
use crate::backend::RenderBackend;
use crate::messages::DiagnosticsSink;
use crate::pipeline::PipelineSource;
use crate::project::ProjectFiles;
use crate::utils::time::{Clock, Timer};

/// Outcome of one reconcile call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Whether a full scan ran (false when throttled).
    pub scanned: bool,
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
}

impl ReconcileReport {
    /// True when the cache was modified.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.inserted + self.removed + self.moved > 0
    }
}

/// Throttled diff between the external list and the cache snapshot.
pub struct Reconciler {
    timer: Timer,
    scan_interval: Duration,
}

impl Reconciler {
    #[must_use]
    pub fn new(clock: Box<dyn Clock>, scan_interval: Duration) -> Self {
        Self {
            timer: Timer::new(clock),
            scan_interval,
        }
    }

    pub fn set_scan_interval(&mut self, scan_interval: Duration) {
        self.scan_interval = scan_interval;
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Applies the throttling policy. Restarts the timer when an
    /// equal-length scan is due.
    pub fn should_scan(&mut self, external_len: usize, snapshot_len: usize) -> bool {
        if external_len != snapshot_len {
            return true;
        }
        if self.timer.elapsed() > self.scan_interval {
            self.timer.restart();
            true
        } else {
            log::trace!("Reconcile skipped: {external_len} items, scan window still open");
            false
        }
    }

    /// Throttled reconcile.
    pub fn reconcile<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        cache: &mut ShaderCache<B::Shader>,
        pipeline: &dyn PipelineSource,
        files: &dyn ProjectFiles,
        messages: &mut dyn DiagnosticsSink,
    ) -> ReconcileReport {
        if !self.should_scan(pipeline.ordered_items().len(), cache.len()) {
            return ReconcileReport::default();
        }
        let report = scan(backend, cache, pipeline, files, messages);
        if report.changed() {
            log::debug!(
                "Reconciled pipeline cache: {} inserted, {} removed, {} moved",
                report.inserted,
                report.removed,
                report.moved
            );
        } else {
            log::trace!("Reconcile scan found no changes");
        }
        report
    }
}

/// Unthrottled full scan.
pub fn scan<B: RenderBackend>(
    backend: &mut B,
    cache: &mut ShaderCache<B::Shader>,
    pipeline: &dyn PipelineSource,
    files: &dyn ProjectFiles,
    messages: &mut dyn DiagnosticsSink,
) -> ReconcileReport {
    let external = pipeline.ordered_items();
    let mut report = ReconcileReport {
        scanned: true,
        ..ReconcileReport::default()
    };

    // Insertions
    for (i, &id) in external.iter().enumerate() {
        if cache.contains(id) {
            continue;
        }
        let entry = compile::create_entry(backend, id, pipeline.item(id), files, messages);
        cache.insert(i, entry);
        report.inserted += 1;
    }

    // Removals
    let stale: Vec<_> = cache.items().filter(|id| !external.contains(id)).collect();
    for id in stale {
        cache.remove(id);
        report.removed += 1;
    }

    // Moves
    for (i, &id) in external.iter().enumerate() {
        if cache.item_at(i) == Some(id) {
            continue;
        }
        match cache.position(id) {
            Some(source) if source > i => {
                cache.relocate(source, i);
                report.moved += 1;
            }
            _ => {}
        }
    }

    report
}
