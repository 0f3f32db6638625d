//! Loop phase progression.
//!
//! Pure function from (loop type, iteration count) to an angle in degrees.
//! Each archetype has its own formula; values are truncated with `floor`
//! to match the integer phases recorded in existing session files.

/// Phase angle for a loop type at iteration `n`.
///
/// `convergent` decreases monotonically and clamps at 0; `divergent`
/// increases monotonically and clamps at 360 — the one value outside
/// [0, 360). Everything else, including `oscillating`, is reduced into
/// [0, 360). Unknown types sit at 0.
pub fn phase(kind: &str, n: u64) -> i64 {
    let n = n as f64;
    let degrees = match kind {
        "infinite" => (n * 30.0) % 360.0,
        "convergent" => (360.0 - n * 30.0).max(0.0),
        "divergent" => (n * 30.0).min(360.0),
        "spiral" => (n * 45.0) % 360.0,
        "oscillating" => ((n * std::f64::consts::PI / 4.0).sin() * 180.0 + 180.0).rem_euclid(360.0),
        _ => 0.0,
    };
    degrees.floor() as i64
}
