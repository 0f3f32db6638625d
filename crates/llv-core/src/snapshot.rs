//! The session wire format.
//!
//! A session file is one JSON object `{timestamp, version, lines, loops,
//! vibes, contexts}` with the entity maps rendered as plain name→value
//! objects. Generators are deliberately absent: they are rebuilt from each
//! entity's `rhythm` field on load, always at cursor position 0.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{Context, Line, Loop, Vibe};
use crate::store::EntityStore;
use crate::time::now_iso8601;

pub const CURRENT_VERSION: &str = "1.0.0";

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub lines: BTreeMap<String, Line>,
    #[serde(default)]
    pub loops: BTreeMap<String, Loop>,
    #[serde(default)]
    pub vibes: BTreeMap<String, Vibe>,
    #[serde(default)]
    pub contexts: BTreeMap<String, Context>,
}

/// Outcome of a merge-mode load.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub skipped: usize,
}

impl SessionSnapshot {
    pub fn from_store(store: &EntityStore) -> Self {
        Self {
            timestamp: now_iso8601(),
            version: CURRENT_VERSION.to_string(),
            lines: store.lines.clone(),
            loops: store.loops.clone(),
            vibes: store.vibes.clone(),
            contexts: store.contexts.clone(),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.lines.len() + self.loops.len() + self.vibes.len() + self.contexts.len()
    }

    /// Replace mode: drop everything live and install the snapshot.
    /// Every loaded entity gets a fresh generator; any pre-load cursor
    /// position is gone.
    pub fn apply_replace(self, store: &mut EntityStore, rng: &mut impl Rng) {
        store.clear();
        for line in self.lines.into_values() {
            store.adopt_line(line, rng);
        }
        for lp in self.loops.into_values() {
            store.adopt_loop(lp, rng);
        }
        for vibe in self.vibes.into_values() {
            store.adopt_vibe(vibe, rng);
        }
        for context in self.contexts.into_values() {
            store.adopt_context(context);
        }
    }

    /// Merge mode: insert only entities whose name is free in their
    /// category. Existing entities keep every field and their current
    /// generator, whatever the file says.
    ///
    /// Existence is tested against each entity's own `name` field, not the
    /// file's map key — adoption inserts under `name`, so a hand-edited
    /// file whose key disagrees with it must not sneak past the check.
    pub fn apply_merge(self, store: &mut EntityStore, rng: &mut impl Rng) -> MergeStats {
        let mut stats = MergeStats::default();

        for line in self.lines.into_values() {
            if store.line(&line.name).is_some() {
                stats.skipped += 1;
            } else {
                store.adopt_line(line, rng);
                stats.inserted += 1;
            }
        }
        for lp in self.loops.into_values() {
            if store.loop_named(&lp.name).is_some() {
                stats.skipped += 1;
            } else {
                store.adopt_loop(lp, rng);
                stats.inserted += 1;
            }
        }
        for vibe in self.vibes.into_values() {
            if store.vibe(&vibe.name).is_some() {
                stats.skipped += 1;
            } else {
                store.adopt_vibe(vibe, rng);
                stats.inserted += 1;
            }
        }
        for context in self.contexts.into_values() {
            if store.context(&context.name).is_some() {
                stats.skipped += 1;
            } else {
                store.adopt_context(context);
                stats.inserted += 1;
            }
        }

        stats
    }
}

/// Serialize the store to pretty session JSON.
pub fn export_json(store: &EntityStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&SessionSnapshot::from_store(store))
}

/// Parse session JSON into a snapshot.
pub fn import_json(json: &str) -> Result<SessionSnapshot, serde_json::Error> {
    serde_json::from_str(json)
}
