//! Named rhythm patterns and the cyclic generators that play them.
//!
//! A pattern is a fixed ordered sequence of numeric multipliers. A generator
//! holds one pattern plus a cursor; `next()` returns the value under the
//! cursor and advances it modulo the pattern length, so the first call after
//! construction always yields `pattern[0]`.

use rand::Rng;

/// Line rhythms.
pub const LINE_RHYTHMS: &[&str] = &["steady", "accelerating", "pulsing", "syncopated", "flowing"];
/// Loop rhythms.
pub const LOOP_RHYTHMS: &[&str] = &["constant", "variable", "fibonacci", "exponential", "harmonic"];
/// Vibe rhythms.
pub const VIBE_RHYTHMS: &[&str] = &["ambient", "driving", "syncopated", "polyrhythmic", "freeform"];

/// A cyclic multiplier sequence with a cursor. Ephemeral: generators are
/// never persisted and are rebuilt from an entity's `rhythm` field on load.
#[derive(Clone, Debug)]
pub struct RhythmGenerator {
    pattern: Vec<f64>,
    cursor: usize,
}

impl RhythmGenerator {
    /// Build a generator over a fixed pattern. An empty pattern collapses to
    /// the constant pattern `[1]` so `next()` is total.
    pub fn from_pattern(pattern: Vec<f64>) -> Self {
        let pattern = if pattern.is_empty() { vec![1.0] } else { pattern };
        Self { pattern, cursor: 0 }
    }

    /// Return the value at the cursor, then advance modulo pattern length.
    pub fn next(&mut self) -> f64 {
        let value = self.pattern[self.cursor];
        self.cursor = (self.cursor + 1) % self.pattern.len();
        value
    }

    pub fn pattern(&self) -> &[f64] {
        &self.pattern
    }
}

/// Fixed multiplier table for a named pattern. `None` for names with no
/// fixed table (unknown names and the randomized `freeform`).
fn fixed_pattern(name: &str) -> Option<&'static [f64]> {
    let pattern: &'static [f64] = match name {
        "steady" => &[1.0, 1.0, 1.0, 1.0],
        "accelerating" => &[1.0, 1.2, 1.5, 2.0],
        "pulsing" => &[0.5, 1.0, 0.5, 1.0],
        "syncopated" => &[1.0, 0.5, 0.75, 1.25],
        "flowing" => &[0.8, 1.0, 1.2, 1.0],
        "constant" => &[1.0],
        "variable" => &[0.5, 1.0, 2.0, 1.0],
        "fibonacci" => &[1.0, 1.0, 2.0, 3.0, 5.0, 8.0],
        "exponential" => &[1.0, 2.0, 4.0, 8.0],
        "harmonic" => &[1.0, 0.5, 0.33, 0.25],
        "ambient" => &[0.3, 0.5, 0.4, 0.6],
        "driving" => &[1.0, 1.0, 1.0, 1.0],
        "polyrhythmic" => &[3.0, 4.0, 5.0],
        _ => return None,
    };
    Some(pattern)
}

/// Build the generator for a named pattern. Unknown names fall back to
/// `constant`. `freeform` draws its three values once, here — the generator
/// then cycles those frozen values deterministically (bounded
/// unpredictability, kept for session compatibility).
pub fn generate(name: &str, rng: &mut impl Rng) -> RhythmGenerator {
    if name == "freeform" {
        let pattern = vec![
            rng.random::<f64>(),
            rng.random::<f64>(),
            rng.random::<f64>(),
        ];
        return RhythmGenerator::from_pattern(pattern);
    }
    let pattern = fixed_pattern(name).unwrap_or(&[1.0]);
    RhythmGenerator::from_pattern(pattern.to_vec())
}
