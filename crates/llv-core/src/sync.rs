//! Cross-category synchronization.
//!
//! Resolves element names against the three entity categories and derives a
//! phase-bisection pattern. The pattern is cosmetic — a position is
//! "synchronized" when its evenly-spaced angle plus the offset lands in the
//! front half of the circle — and is kept exactly as-is for output parity.

use crate::error::{EngineError, Result};
use crate::store::EntityStore;

/// Per-element resolution result. Categories are tested in a fixed order —
/// line, then loop, then vibe — and the first match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncStatus {
    pub element: String,
    pub kind: &'static str,
    pub synced: bool,
}

#[derive(Clone, Debug)]
pub struct SyncOutcome {
    pub statuses: Vec<SyncStatus>,
    /// One flag per requested element: true = synchronized position.
    pub pattern: Vec<bool>,
}

impl SyncOutcome {
    /// Names that resolved to no category. Non-fatal as long as at least
    /// one name resolved.
    pub fn unresolved(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|s| !s.synced)
            .map(|s| s.element.as_str())
            .collect()
    }
}

/// Phase-bisection flags for `count` evenly spaced positions.
pub fn sync_pattern(count: usize, phase_offset: f64) -> Vec<bool> {
    (0..count)
        .map(|i| {
            let angle = (i as f64 * 360.0 / count as f64 + phase_offset).rem_euclid(360.0);
            angle < 180.0
        })
        .collect()
}

/// Resolve `elements` against the store and render the sync pattern.
/// Fails only when the list is empty or zero names resolve; unresolved
/// names in a partly-valid list are reported, not fatal.
pub fn synchronize(
    store: &EntityStore,
    elements: &[String],
    phase_offset: f64,
) -> Result<SyncOutcome> {
    if elements.is_empty() {
        return Err(EngineError::NothingToSynchronize);
    }

    let statuses: Vec<SyncStatus> = elements
        .iter()
        .map(|element| {
            let kind = if store.line(element).is_some() {
                "line"
            } else if store.loop_named(element).is_some() {
                "loop"
            } else if store.vibe(element).is_some() {
                "vibe"
            } else {
                "unknown"
            };
            SyncStatus {
                element: element.clone(),
                kind,
                synced: kind != "unknown",
            }
        })
        .collect();

    if statuses.iter().all(|s| !s.synced) {
        return Err(EngineError::NothingToSynchronize);
    }

    Ok(SyncOutcome {
        pattern: sync_pattern(elements.len(), phase_offset),
        statuses,
    })
}
