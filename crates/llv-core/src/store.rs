//! The entity store: owns the four entity collections and the rhythm
//! generator registry behind a narrow create/mutate/query API.
//!
//! Callers never see the underlying maps. Every create attaches a generator
//! keyed `<category>_<name>`; every mutate appends to the entity's history
//! and advances that generator. Uniqueness is category-scoped: the same name
//! may exist simultaneously as a line and a vibe.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde_json::Value;

use crate::compose::{self, Component};
use crate::entity::{Context, Iteration, Line, Loop, Pulse, Trace, Vibe, context_rhythm_modifier};
use crate::error::{EngineError, Result};
use crate::phase::phase;
use crate::rhythm::{self, RhythmGenerator};
use crate::time::now_iso8601;

/// Side-channel record produced by `set_context`: the rhythm modifier and
/// the influence names that resolved to live entities. Diagnostic only —
/// no generator is ever modified.
#[derive(Clone, Debug)]
pub struct ContextReceipt {
    pub modifier: f64,
    pub influenced: Vec<String>,
}

#[derive(Default)]
pub struct EntityStore {
    pub(crate) lines: BTreeMap<String, Line>,
    pub(crate) loops: BTreeMap<String, Loop>,
    pub(crate) vibes: BTreeMap<String, Vibe>,
    pub(crate) contexts: BTreeMap<String, Context>,
    rhythms: HashMap<String, RhythmGenerator>,
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(EngineError::EmptyField { field })
    } else {
        Ok(())
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Creation ---

    pub fn create_line(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        rhythm: &str,
        rng: &mut impl Rng,
    ) -> Result<()> {
        require("name", name)?;
        require("from", from)?;
        require("to", to)?;
        if self.lines.contains_key(name) {
            return Err(EngineError::Duplicate {
                category: "line",
                name: name.to_string(),
            });
        }

        self.lines
            .insert(name.to_string(), Line::new(name, from, to, rhythm));
        self.rhythms
            .insert(format!("line_{name}"), rhythm::generate(rhythm, rng));
        Ok(())
    }

    pub fn create_loop(
        &mut self,
        name: &str,
        kind: &str,
        rhythm: &str,
        rng: &mut impl Rng,
    ) -> Result<()> {
        require("name", name)?;
        require("type", kind)?;
        if self.loops.contains_key(name) {
            return Err(EngineError::Duplicate {
                category: "loop",
                name: name.to_string(),
            });
        }

        self.loops
            .insert(name.to_string(), Loop::new(name, kind, rhythm));
        self.rhythms
            .insert(format!("loop_{name}"), rhythm::generate(rhythm, rng));
        Ok(())
    }

    pub fn create_vibe(
        &mut self,
        name: &str,
        energy: &str,
        frequency: f64,
        rhythm: &str,
        rng: &mut impl Rng,
    ) -> Result<()> {
        require("name", name)?;
        require("energy", energy)?;
        if self.vibes.contains_key(name) {
            return Err(EngineError::Duplicate {
                category: "vibe",
                name: name.to_string(),
            });
        }

        self.vibes
            .insert(name.to_string(), Vibe::new(name, energy, frequency, rhythm));
        self.rhythms
            .insert(format!("vibe_{name}"), rhythm::generate(rhythm, rng));
        Ok(())
    }

    /// Record a context annotation. The returned receipt carries the rhythm
    /// modifier and the resolved influence names for the caller to log;
    /// no stored generator changes.
    pub fn set_context(
        &mut self,
        name: &str,
        kind: &str,
        influences: &[String],
    ) -> Result<ContextReceipt> {
        require("name", name)?;
        require("type", kind)?;
        if self.contexts.contains_key(name) {
            return Err(EngineError::Duplicate {
                category: "context",
                name: name.to_string(),
            });
        }

        let influenced: Vec<String> = influences
            .iter()
            .filter(|element| {
                self.rhythms.contains_key(&format!("line_{element}"))
                    || self.rhythms.contains_key(&format!("loop_{element}"))
                    || self.rhythms.contains_key(&format!("vibe_{element}"))
            })
            .cloned()
            .collect();

        self.contexts.insert(
            name.to_string(),
            Context::new(name, kind, influences.to_vec()),
        );

        Ok(ContextReceipt {
            modifier: context_rhythm_modifier(kind),
            influenced,
        })
    }

    // --- Mutation ---

    /// Append a trace to a line, advancing its generator.
    pub fn trace_line(&mut self, name: &str, speed: f64, message: &str) -> Result<Trace> {
        let step = self.next_step(&format!("line_{name}"));
        let line = self.lines.get_mut(name).ok_or_else(|| EngineError::NotFound {
            category: "line",
            name: name.to_string(),
        })?;

        let trace = Trace {
            timestamp: now_iso8601(),
            message: message.to_string(),
            speed,
            rhythm_step: step,
        };
        line.traces.push(trace.clone());
        Ok(trace)
    }

    /// Execute one loop iteration: appends the record, advances the
    /// generator (unless `apply_rhythm` is off) and moves the loop's phase
    /// to the newly computed angle.
    pub fn iterate_loop(&mut self, name: &str, input: &str, apply_rhythm: bool) -> Result<Iteration> {
        let step = if apply_rhythm {
            self.next_step(&format!("loop_{name}"))
        } else {
            1.0
        };
        let lp = self.loops.get_mut(name).ok_or_else(|| EngineError::NotFound {
            category: "loop",
            name: name.to_string(),
        })?;

        let iteration = Iteration {
            number: lp.iterations.len() as u64 + 1,
            input: input.to_string(),
            timestamp: now_iso8601(),
            rhythm_step: step,
            phase: phase(&lp.kind, lp.iterations.len() as u64),
        };
        lp.phase = iteration.phase;
        lp.iterations.push(iteration.clone());
        Ok(iteration)
    }

    /// Send a pulse through a vibe, advancing its generator.
    pub fn pulse_vibe(&mut self, name: &str, amplitude: f64, duration: f64) -> Result<Pulse> {
        let step = self.next_step(&format!("vibe_{name}"));
        let vibe = self.vibes.get_mut(name).ok_or_else(|| EngineError::NotFound {
            category: "vibe",
            name: name.to_string(),
        })?;

        let pulse = Pulse {
            timestamp: now_iso8601(),
            amplitude,
            duration,
            frequency: vibe.frequency,
            rhythm_step: step,
        };
        vibe.pulses.push(pulse.clone());
        Ok(pulse)
    }

    /// Register a composite generator under `composed_<name>`, independent
    /// of any entity generator. Returns the validated components.
    pub fn compose_rhythm(&mut self, name: &str, raw: &[Value]) -> Result<Vec<Component>> {
        require("name", name)?;
        let (components, generator) = compose::compose(name, raw)?;
        self.rhythms.insert(format!("composed_{name}"), generator);
        Ok(components)
    }

    // --- Queries ---

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.get(name)
    }

    pub fn loop_named(&self, name: &str) -> Option<&Loop> {
        self.loops.get(name)
    }

    pub fn vibe(&self, name: &str) -> Option<&Vibe> {
        self.vibes.get(name)
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        self.loops.values()
    }

    pub fn vibes(&self) -> impl Iterator<Item = &Vibe> {
        self.vibes.values()
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.lines.len(),
            self.loops.len(),
            self.vibes.len(),
            self.contexts.len(),
        )
    }

    pub fn has_rhythm(&self, key: &str) -> bool {
        self.rhythms.contains_key(key)
    }

    // --- Internals ---

    /// Advance a registered generator; 1.0 when the key is absent so
    /// history records stay total even for unregistered rhythms.
    fn next_step(&mut self, key: &str) -> f64 {
        self.rhythms.get_mut(key).map_or(1.0, |r| r.next())
    }

    /// Drop all entities and generators. Used by replace-mode load.
    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.loops.clear();
        self.vibes.clear();
        self.contexts.clear();
        self.rhythms.clear();
    }

    /// Install an entity loaded from disk, building a fresh generator from
    /// its stored rhythm field (cursor at 0 — positions are not persisted).
    pub(crate) fn adopt_line(&mut self, line: Line, rng: &mut impl Rng) {
        self.rhythms
            .insert(format!("line_{}", line.name), rhythm::generate(&line.rhythm, rng));
        self.lines.insert(line.name.clone(), line);
    }

    pub(crate) fn adopt_loop(&mut self, lp: Loop, rng: &mut impl Rng) {
        self.rhythms
            .insert(format!("loop_{}", lp.name), rhythm::generate(&lp.rhythm, rng));
        self.loops.insert(lp.name.clone(), lp);
    }

    pub(crate) fn adopt_vibe(&mut self, vibe: Vibe, rng: &mut impl Rng) {
        self.rhythms
            .insert(format!("vibe_{}", vibe.name), rhythm::generate(&vibe.rhythm, rng));
        self.vibes.insert(vibe.name.clone(), vibe);
    }

    pub(crate) fn adopt_context(&mut self, context: Context) {
        self.contexts.insert(context.name.clone(), context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use serde_json::json;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_create_line_registers_generator() {
        let mut store = EntityStore::new();
        store.create_line("x", "a", "b", "steady", &mut rng()).unwrap();
        assert!(store.line("x").is_some());
        assert!(store.has_rhythm("line_x"));
    }

    #[test]
    fn test_empty_name_rejected_without_state_change() {
        let mut store = EntityStore::new();
        let err = store.create_line("", "a", "b", "steady", &mut rng()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyField { field: "name" }));
        assert_eq!(store.counts(), (0, 0, 0, 0));
    }

    #[test]
    fn test_duplicate_create_preserves_original() {
        let mut store = EntityStore::new();
        let mut rng = rng();
        store.create_line("x", "a", "b", "steady", &mut rng).unwrap();
        let err = store.create_line("x", "c", "d", "pulsing", &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::Duplicate { category: "line", .. }));

        let line = store.line("x").unwrap();
        assert_eq!(line.from, "a");
        assert_eq!(line.to, "b");
        assert_eq!(line.rhythm, "steady");
    }

    #[test]
    fn test_uniqueness_is_category_scoped() {
        let mut store = EntityStore::new();
        let mut rng = rng();
        store.create_line("x", "a", "b", "steady", &mut rng).unwrap();
        store.create_vibe("x", "calm", 10.0, "ambient", &mut rng).unwrap();
        assert!(store.line("x").is_some());
        assert!(store.vibe("x").is_some());
    }

    #[test]
    fn test_trace_advances_rhythm() {
        let mut store = EntityStore::new();
        store.create_line("x", "a", "b", "accelerating", &mut rng()).unwrap();

        let t1 = store.trace_line("x", 1.0, "first").unwrap();
        let t2 = store.trace_line("x", 2.0, "second").unwrap();
        assert_eq!(t1.rhythm_step, 1.0);
        assert_eq!(t2.rhythm_step, 1.2);
        assert_eq!(store.line("x").unwrap().traces.len(), 2);
    }

    #[test]
    fn test_trace_missing_line_fails() {
        let mut store = EntityStore::new();
        let err = store.trace_line("ghost", 1.0, "").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { category: "line", .. }));
    }

    #[test]
    fn test_iterate_tracks_phase() {
        let mut store = EntityStore::new();
        store.create_loop("c", "convergent", "constant", &mut rng()).unwrap();

        // First iteration computes phase at n=0: 360 for convergent.
        let it1 = store.iterate_loop("c", "seed", true).unwrap();
        assert_eq!(it1.number, 1);
        assert_eq!(it1.phase, 360);
        assert_eq!(store.loop_named("c").unwrap().phase, 360);

        let it2 = store.iterate_loop("c", "more", true).unwrap();
        assert_eq!(it2.number, 2);
        assert_eq!(it2.phase, 330);
        assert_eq!(store.loop_named("c").unwrap().phase, 330);
    }

    #[test]
    fn test_iterate_without_rhythm_skips_generator() {
        let mut store = EntityStore::new();
        store.create_loop("c", "infinite", "fibonacci", &mut rng()).unwrap();

        let it1 = store.iterate_loop("c", "a", false).unwrap();
        assert_eq!(it1.rhythm_step, 1.0);
        // Generator did not advance: next applied step is still pattern head.
        let it2 = store.iterate_loop("c", "b", true).unwrap();
        assert_eq!(it2.rhythm_step, 1.0);
        let it3 = store.iterate_loop("c", "c", true).unwrap();
        assert_eq!(it3.rhythm_step, 1.0);
        let it4 = store.iterate_loop("c", "d", true).unwrap();
        assert_eq!(it4.rhythm_step, 2.0);
    }

    #[test]
    fn test_pulse_snapshots_vibe_frequency() {
        let mut store = EntityStore::new();
        store.create_vibe("v", "intense", 72.0, "driving", &mut rng()).unwrap();

        let pulse = store.pulse_vibe("v", 0.9, 2.0).unwrap();
        assert_eq!(pulse.frequency, 72.0);
        assert_eq!(pulse.amplitude, 0.9);
        assert_eq!(store.vibe("v").unwrap().pulses.len(), 1);
    }

    #[test]
    fn test_set_context_records_but_never_mutates_rhythms() {
        let mut store = EntityStore::new();
        let mut rng = rng();
        store.create_line("wire", "a", "b", "steady", &mut rng).unwrap();

        let receipt = store
            .set_context("mood", "experimental", &["wire".to_string(), "ghost".to_string()])
            .unwrap();
        assert_eq!(receipt.modifier, 2.0);
        assert_eq!(receipt.influenced, vec!["wire"]);

        // The influenced line's generator is untouched.
        let t = store.trace_line("wire", 1.0, "").unwrap();
        assert_eq!(t.rhythm_step, 1.0);
    }

    #[test]
    fn test_compose_registers_independent_generator() {
        let mut store = EntityStore::new();
        store.create_line("a", "x", "y", "steady", &mut rng()).unwrap();

        let raw = vec![json!({"element": "a", "weight": 0.7})];
        let components = store.compose_rhythm("mix", &raw).unwrap();
        assert_eq!(components.len(), 1);
        assert!(store.has_rhythm("composed_mix"));
        assert!(store.has_rhythm("line_a"), "entity generator unaffected");
    }

    #[test]
    fn test_compose_all_invalid_registers_nothing() {
        let mut store = EntityStore::new();
        let raw = vec![json!({"weight": "bad"})];
        assert!(store.compose_rhythm("r", &raw).is_err());
        assert!(!store.has_rhythm("composed_r"));
    }
}
