//! Glyph rendering for tool response payloads.
//!
//! Everything here is cosmetic: fixed lookup tables and repeat-counts that
//! decorate the text responses. Kept byte-stable because clients display
//! these strings verbatim.

use crate::store::EntityStore;

pub fn line_rhythm(rhythm: &str) -> &'static str {
    match rhythm {
        "steady" => "━━━━━━━━",
        "accelerating" => "━━━━━━━━━⟫",
        "pulsing" => "━ ━ ━ ━",
        "syncopated" => "━━ ━ ━━━",
        "flowing" => "〰️〰️〰️〰️",
        _ => "━━━━━━━━",
    }
}

pub fn loop_pattern(kind: &str) -> &'static str {
    match kind {
        "infinite" => "∞∞∞∞∞",
        "convergent" => "◯◯◯•",
        "divergent" => "•◯◯◯",
        "spiral" => "🌀",
        "oscillating" => "↺↻↺↻",
        _ => "◯◯◯◯",
    }
}

pub fn vibe_energy(energy: &str, frequency: f64) -> String {
    let symbols = match energy {
        "calm" => "≈≈≈≈≈",
        "intense" => "⚡⚡⚡⚡⚡",
        "chaotic" => "✱✱✱✱✱",
        "focused" => "◉◉◉◉◉",
        "expansive" => "◎◎◎◎◎",
        _ => "≈≈≈≈≈",
    };
    let waves = "〜".repeat((frequency / 20.0).ceil().max(0.0) as usize);
    format!("{symbols} {waves}")
}

pub fn context_glyphs(kind: &str) -> &'static str {
    match kind {
        "creative" => "🎨 🎭 🎪 🎨",
        "analytical" => "📊 📈 📉 📊",
        "meditative" => "☯️ ☯️ ☯️ ☯️",
        "collaborative" => "🤝 🤝 🤝 🤝",
        "experimental" => "🧪 🔬 ⚗️ 🧬",
        _ => "◆◆◆◆",
    }
}

/// Arrow run for a line trace; the glyph depends on speed band.
pub fn trace_arrows(speed: f64) -> String {
    let symbol = if speed > 1.5 {
        "⟫"
    } else if speed < 0.5 {
        "⟶"
    } else {
        "→"
    };
    symbol.repeat(8)
}

/// Glyph run for one loop iteration, capped at ten symbols.
pub fn loop_iteration(kind: &str, number: u64) -> String {
    let symbol = match kind {
        "infinite" => "∞",
        "convergent" => {
            if number > 5 {
                "•"
            } else {
                "◯"
            }
        }
        "divergent" => {
            if number > 5 {
                "◯"
            } else {
                "•"
            }
        }
        "spiral" => "🌀",
        "oscillating" => {
            if number % 2 == 1 {
                "↺"
            } else {
                "↻"
            }
        }
        _ => "◯",
    };
    let repeats = number.min(10) as usize;
    let suffix = if number > 10 { "..." } else { "" };
    format!("{}{suffix}", symbol.repeat(repeats))
}

pub fn loop_behavior(kind: &str, iteration: u64) -> String {
    match kind {
        "infinite" => "Continuous cycling".to_string(),
        "convergent" => if iteration > 8 {
            "Approaching fixed point"
        } else {
            "Converging"
        }
        .to_string(),
        "divergent" => if iteration > 8 {
            "Expanding rapidly"
        } else {
            "Diverging"
        }
        .to_string(),
        "spiral" => format!(
            "Spiraling {}",
            if iteration % 2 == 1 { "inward" } else { "outward" }
        ),
        "oscillating" => format!(
            "Oscillating {}",
            if iteration % 2 == 1 { "forward" } else { "backward" }
        ),
        _ => "Processing".to_string(),
    }
}

/// Bar-chart block for a pulse: height follows amplitude, width follows
/// frequency.
pub fn pulse_block(amplitude: f64, frequency: f64) -> String {
    const RAMP: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let height = (amplitude * 5.0).ceil().max(0.0) as usize;
    let width = (frequency / 10.0).ceil().max(1.0) as usize;

    let mut block = String::new();
    for i in 0..height {
        let glyph = RAMP[(i * 8 / height).min(7)];
        block.push_str(&glyph.to_string().repeat(width));
        block.push('\n');
    }
    block
}

/// `◉ → ◯ → ◉` chain from the bisection flags.
pub fn sync_chain(pattern: &[bool]) -> String {
    pattern
        .iter()
        .map(|&synced| if synced { "◉" } else { "◯" })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Ten-slot weight bar per component, `█` filled and `░` empty.
pub fn composite_bars(weights: &[f64]) -> String {
    weights
        .iter()
        .map(|w| {
            let filled = (w * 10.0).ceil().clamp(0.0, 10.0) as usize;
            format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Beat grid shared by all three categories over `time_window` beats.
fn beat_grid(time_window: u32) -> String {
    let mut grid = format!("🎵 SYSTEM RHYTHM (next {time_window} beats):\n");
    let border = "─".repeat(time_window as usize * 2);
    grid.push_str(&format!("┌{border}┐\n"));
    for label in ["Lines", "Loops", "Vibes"] {
        grid.push('│');
        for i in 0..time_window {
            grid.push_str(if i % 4 == 0 { "█ " } else { "░ " });
        }
        grid.push_str(&format!("│ {label}\n"));
    }
    grid.push_str(&format!("└{border}┘\n"));
    grid
}

/// Whole-system overview used by `visualize_system` and the CLI `show`
/// command.
pub fn system_overview(store: &EntityStore, show_rhythms: bool, time_window: u32) -> String {
    let mut out = String::from("🎨 LINES-LOOPS-VIBES SYSTEM\n\n");

    if store.lines().next().is_some() {
        out.push_str("〰️ LINES:\n");
        for line in store.lines() {
            out.push_str(&format!("  {}: {} → {}", line.name, line.from, line.to));
            if show_rhythms {
                out.push_str(&format!(" [{}]", line.rhythm));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if store.loops().next().is_some() {
        out.push_str("🔄 LOOPS:\n");
        for lp in store.loops() {
            out.push_str(&format!("  {}: {}", lp.name, lp.kind));
            if show_rhythms {
                out.push_str(&format!(" [{}]", lp.rhythm));
            }
            out.push_str(&format!(" ({} iterations)\n", lp.iterations.len()));
        }
        out.push('\n');
    }

    if store.vibes().next().is_some() {
        out.push_str("✨ VIBES:\n");
        for vibe in store.vibes() {
            out.push_str(&format!("  {}: {} @ {}Hz", vibe.name, vibe.energy, vibe.frequency));
            if show_rhythms {
                out.push_str(&format!(" [{}]", vibe.rhythm));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if show_rhythms {
        out.push_str(&beat_grid(time_window));
    }

    out
}
