//! The four entity categories owned by the [`EntityStore`](crate::store::EntityStore).
//!
//! Field names follow the session wire format: snake_case except the
//! `rhythmStep` history fields, which keep their original camelCase spelling
//! so session files from earlier builds load unchanged.

use serde::{Deserialize, Serialize};

use crate::time::now_iso8601;

/// A named directed relationship between two labeled points, carrying a
/// rhythm and a growing trace history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub from: String,
    pub to: String,
    pub rhythm: String,
    pub created_at: String,
    pub traces: Vec<Trace>,
}

/// One recorded pass along a line. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    pub timestamp: String,
    pub message: String,
    pub speed: f64,
    #[serde(rename = "rhythmStep")]
    pub rhythm_step: f64,
}

impl Line {
    pub fn new(name: &str, from: &str, to: &str, rhythm: &str) -> Self {
        Self {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            rhythm: rhythm.to_string(),
            created_at: now_iso8601(),
            traces: Vec::new(),
        }
    }
}

/// A named iterative cycle of one of five geometric archetypes, each with
/// its own phase-progression formula (see [`crate::phase`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Loop {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rhythm: String,
    /// Phase angle of the latest iteration, in degrees.
    pub phase: i64,
    pub created_at: String,
    pub iterations: Vec<Iteration>,
}

/// One executed loop iteration. Append-only; `number` is 1-based.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Iteration {
    pub number: u64,
    pub input: String,
    pub timestamp: String,
    #[serde(rename = "rhythmStep")]
    pub rhythm_step: f64,
    pub phase: i64,
}

impl Loop {
    pub fn new(name: &str, kind: &str, rhythm: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            rhythm: rhythm.to_string(),
            phase: 0,
            created_at: now_iso8601(),
            iterations: Vec::new(),
        }
    }
}

/// A named energy/frequency pairing that can be pulsed with an amplitude
/// and duration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vibe {
    pub name: String,
    pub energy: String,
    /// Frequency/tempo, 1–100 Hz.
    pub frequency: f64,
    pub rhythm: String,
    pub created_at: String,
    pub pulses: Vec<Pulse>,
}

/// One recorded pulse through a vibe. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pulse {
    pub timestamp: String,
    pub amplitude: f64,
    pub duration: f64,
    pub frequency: f64,
    #[serde(rename = "rhythmStep")]
    pub rhythm_step: f64,
}

impl Vibe {
    pub fn new(name: &str, energy: &str, frequency: f64, rhythm: &str) -> Self {
        Self {
            name: name.to_string(),
            energy: energy.to_string(),
            frequency,
            rhythm: rhythm.to_string(),
            created_at: now_iso8601(),
            pulses: Vec::new(),
        }
    }
}

/// A named annotation describing an intended influence over other entities'
/// rhythms. Recorded and echoed back; its modifier is logged by callers but
/// never applied to any stored generator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub influences: Vec<String>,
    pub created_at: String,
}

impl Context {
    pub fn new(name: &str, kind: &str, influences: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            influences,
            created_at: now_iso8601(),
        }
    }
}

/// Rhythm multiplier for a context type. Diagnostic only — the store never
/// applies it to a generator.
pub fn context_rhythm_modifier(kind: &str) -> f64 {
    match kind {
        "creative" => 1.5,
        "analytical" => 0.8,
        "meditative" => 0.5,
        "collaborative" => 1.2,
        "experimental" => 2.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_starts_empty() {
        let line = Line::new("path", "a", "b", "steady");
        assert!(line.traces.is_empty());
        assert!(!line.created_at.is_empty());
    }

    #[test]
    fn test_loop_starts_at_phase_zero() {
        let lp = Loop::new("cycle", "infinite", "constant");
        assert_eq!(lp.phase, 0);
        assert!(lp.iterations.is_empty());
    }

    #[test]
    fn test_serde_type_field_rename() {
        let lp = Loop::new("cycle", "spiral", "fibonacci");
        let json = serde_json::to_value(&lp).unwrap();
        assert_eq!(json["type"], "spiral");
        assert!(json.get("kind").is_none());

        let ctx = Context::new("mood", "creative", vec![]);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["type"], "creative");
    }

    #[test]
    fn test_trace_rhythm_step_camel_case() {
        let trace = Trace {
            timestamp: now_iso8601(),
            message: "hi".to_string(),
            speed: 1.0,
            rhythm_step: 1.5,
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["rhythmStep"], 1.5);
    }

    #[test]
    fn test_context_modifier_table() {
        assert_eq!(context_rhythm_modifier("creative"), 1.5);
        assert_eq!(context_rhythm_modifier("meditative"), 0.5);
        assert_eq!(context_rhythm_modifier("unheard-of"), 1.0);
    }

    #[test]
    fn test_line_serde_roundtrip() {
        let mut line = Line::new("path", "start", "end", "flowing");
        line.traces.push(Trace {
            timestamp: now_iso8601(),
            message: "payload".to_string(),
            speed: 2.0,
            rhythm_step: 0.8,
        });
        let json = serde_json::to_string(&line).unwrap();
        let back: Line = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "path");
        assert_eq!(back.traces.len(), 1);
        assert_eq!(back.traces[0].rhythm_step, 0.8);
    }
}
