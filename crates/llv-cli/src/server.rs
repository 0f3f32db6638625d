use std::sync::Arc;

use llv_core::render;
use llv_core::store::EntityStore;
use llv_core::sync;
use llv_store::SessionStore;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct LlvServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    store: EntityStore,
    sessions: SessionStore,
    rng: SmallRng,
}

impl LlvServer {
    /// Build the server. With `restore` set, the default session is loaded
    /// in replace mode; a missing file is the normal fresh-start case and
    /// any other failure is logged but never fatal.
    pub fn new(sessions: SessionStore, restore: bool) -> Self {
        let mut store = EntityStore::new();
        let mut rng = SmallRng::from_os_rng();

        if restore {
            match sessions.load_into(&mut store, None, false, &mut rng) {
                Ok(Some(stats)) => {
                    tracing::info!("restored {} entities from previous session", stats.loaded);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("could not restore previous session: {e}"),
            }
        }

        Self {
            state: Arc::new(Mutex::new(ServerState {
                store,
                sessions,
                rng,
            })),
            tool_router: Self::tool_router(),
        }
    }
}

/// Wrap a payload string as a text tool result. Validation and persistence
/// failures also travel this way — only an unrecognized tool name is fatal
/// to a request, and the rmcp router raises that before a handler runs.
fn text(payload: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(payload.into())]))
}

fn failure(err: impl std::fmt::Display) -> Result<CallToolResult, McpError> {
    text(format!("❌ {err}"))
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateLineRequest {
    /// Name of the line
    name: String,
    /// Starting point
    from: String,
    /// Ending point
    to: String,
    /// Rhythm of the line: steady, accelerating, pulsing, syncopated, flowing
    rhythm: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateLoopRequest {
    /// Name of the loop
    name: String,
    /// Loop pattern: infinite, convergent, divergent, spiral, oscillating
    #[serde(rename = "type")]
    kind: String,
    /// Rhythm pattern of iterations: constant, variable, fibonacci, exponential, harmonic
    rhythm: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateVibeRequest {
    /// Name of the vibe
    name: String,
    /// Energy type: calm, intense, chaotic, focused, expansive
    energy: String,
    /// Frequency/tempo (1-100 Hz)
    #[schemars(range(min = 1, max = 100))]
    frequency: Option<f64>,
    /// Rhythmic pattern: ambient, driving, syncopated, polyrhythmic, freeform
    rhythm: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SetContextRequest {
    /// Context name
    name: String,
    /// Type of context: creative, analytical, meditative, collaborative, experimental
    #[serde(rename = "type")]
    kind: String,
    /// Names of lines/loops/vibes this context influences
    influences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TraceLineRequest {
    /// Name of the line to trace
    line_name: String,
    /// Speed multiplier
    #[schemars(range(min = 0.1, max = 10))]
    speed: Option<f64>,
    /// Message or data to carry along the line
    message: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct IterateLoopRequest {
    /// Name of the loop to iterate
    loop_name: String,
    /// Input for this iteration
    input: String,
    /// Apply the loop's rhythm pattern (default true)
    apply_rhythm: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PulseVibeRequest {
    /// Name of the vibe
    vibe_name: String,
    /// Pulse amplitude (0-1)
    #[schemars(range(min = 0, max = 1))]
    amplitude: Option<f64>,
    /// Pulse duration in beats
    duration: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SynchronizeRequest {
    /// Elements to synchronize (names of lines/loops/vibes)
    elements: Vec<String>,
    /// Master rhythm to sync to
    master_rhythm: Option<String>,
    /// Phase offset in degrees
    #[schemars(range(min = 0, max = 360))]
    phase_offset: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ComposeRhythmRequest {
    /// Name for the composed rhythm
    name: String,
    /// Components and their weights: `{element, weight}` objects. Entries
    /// without a string element and numeric weight are dropped.
    components: Vec<serde_json::Value>,
    /// Base tempo in BPM
    tempo: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct VisualizeSystemRequest {
    /// Show rhythm patterns (default true)
    show_rhythms: Option<bool>,
    /// Time window to visualize, in beats
    time_window: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SaveDataRequest {
    /// Session name; defaults to the shared session file
    filename: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct LoadDataRequest {
    /// Session name; defaults to the shared session file
    filename: Option<String>,
    /// Merge into the live system instead of replacing it (existing
    /// entities always win)
    merge: Option<bool>,
}

#[tool_router]
impl LlvServer {
    #[tool(description = "Create a line - a connection or path between points")]
    async fn create_line(
        &self,
        Parameters(req): Parameters<CreateLineRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let rhythm = req.rhythm.as_deref().unwrap_or("steady");

        let ServerState { store, rng, .. } = &mut *state;
        if let Err(e) = store.create_line(&req.name, &req.from, &req.to, rhythm, rng) {
            return failure(e);
        }

        text(format!(
            "〰️ Line \"{}\" created!\n\nFrom: {} → To: {}\nRhythm: {rhythm}\n\n{}\n\nThe line is ready to carry messages with {rhythm} rhythm.",
            req.name,
            req.from,
            req.to,
            render::line_rhythm(rhythm),
        ))
    }

    #[tool(description = "Create a loop - an iterative cycle")]
    async fn create_loop(
        &self,
        Parameters(req): Parameters<CreateLoopRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let rhythm = req.rhythm.as_deref().unwrap_or("constant");

        let ServerState { store, rng, .. } = &mut *state;
        if let Err(e) = store.create_loop(&req.name, &req.kind, rhythm, rng) {
            return failure(e);
        }

        text(format!(
            "🔄 Loop \"{}\" created!\n\nType: {}\nRhythm: {rhythm}\n\n{}\n\nThe {} loop is ready with {rhythm} rhythm.",
            req.name,
            req.kind,
            render::loop_pattern(&req.kind),
            req.kind,
        ))
    }

    #[tool(description = "Create a vibe - an energy or atmosphere")]
    async fn create_vibe(
        &self,
        Parameters(req): Parameters<CreateVibeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let frequency = req.frequency.unwrap_or(50.0);
        let rhythm = req.rhythm.as_deref().unwrap_or("ambient");

        let ServerState { store, rng, .. } = &mut *state;
        if let Err(e) = store.create_vibe(&req.name, &req.energy, frequency, rhythm, rng) {
            return failure(e);
        }

        text(format!(
            "✨ Vibe \"{}\" created!\n\nEnergy: {}\nFrequency: {frequency} Hz\nRhythm: {rhythm}\n\n{}\n\nThe {} vibe resonates at {frequency}Hz with {rhythm} rhythm.",
            req.name,
            req.energy,
            render::vibe_energy(&req.energy, frequency),
            req.energy,
        ))
    }

    #[tool(description = "Set the context that influences rhythms")]
    async fn set_context(
        &self,
        Parameters(req): Parameters<SetContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let influences = req.influences.unwrap_or_default();

        let receipt = match state.store.set_context(&req.name, &req.kind, &influences) {
            Ok(receipt) => receipt,
            Err(e) => return failure(e),
        };

        // Side-channel only: the modifier is recorded in the log, never
        // applied to any stored generator.
        for element in &receipt.influenced {
            tracing::debug!(
                "context {} applies {}x rhythm modifier to {element}",
                req.name,
                receipt.modifier
            );
        }

        let influence_list = if influences.is_empty() {
            "None".to_string()
        } else {
            influences.join(", ")
        };

        text(format!(
            "🎭 Context \"{}\" set!\n\nType: {}\nInfluences: {influence_list}\n\n{}\n\nThe {} context will modify rhythms of influenced elements.",
            req.name,
            req.kind,
            render::context_glyphs(&req.kind),
            req.kind,
        ))
    }

    #[tool(description = "Trace along a line with a specific rhythm")]
    async fn trace_line(
        &self,
        Parameters(req): Parameters<TraceLineRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let speed = req.speed.unwrap_or(1.0);
        let message = req.message.unwrap_or_default();

        let trace = match state.store.trace_line(&req.line_name, speed, &message) {
            Ok(trace) => trace,
            Err(e) => return failure(e),
        };
        let (from, to) = state
            .store
            .line(&req.line_name)
            .map(|l| (l.from.clone(), l.to.clone()))
            .unwrap_or_default();

        text(format!(
            "〰️ Tracing line \"{}\"\n\nFrom: {from} → To: {to}\nSpeed: {speed}x\nMessage: \"{message}\"\n\n{}\n\nRhythm pulse: {}",
            req.line_name,
            render::trace_arrows(speed),
            trace.rhythm_step,
        ))
    }

    #[tool(description = "Execute one iteration of a loop with rhythm")]
    async fn iterate_loop(
        &self,
        Parameters(req): Parameters<IterateLoopRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let apply_rhythm = req.apply_rhythm.unwrap_or(true);

        let iteration = match state.store.iterate_loop(&req.loop_name, &req.input, apply_rhythm) {
            Ok(iteration) => iteration,
            Err(e) => return failure(e),
        };
        let kind = state
            .store
            .loop_named(&req.loop_name)
            .map(|l| l.kind.clone())
            .unwrap_or_default();

        text(format!(
            "🔄 Loop \"{}\" - Iteration {}\n\nInput: \"{}\"\nPhase: {}°\nRhythm: {}\n\n{}\n\nPattern: {}",
            req.loop_name,
            iteration.number,
            req.input,
            iteration.phase,
            iteration.rhythm_step,
            render::loop_iteration(&kind, iteration.number),
            render::loop_behavior(&kind, iteration.number),
        ))
    }

    #[tool(description = "Send a pulse through a vibe")]
    async fn pulse_vibe(
        &self,
        Parameters(req): Parameters<PulseVibeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let amplitude = req.amplitude.unwrap_or(0.5);
        let duration = req.duration.unwrap_or(1.0);

        let pulse = match state.store.pulse_vibe(&req.vibe_name, amplitude, duration) {
            Ok(pulse) => pulse,
            Err(e) => return failure(e),
        };
        let (energy, rhythm) = state
            .store
            .vibe(&req.vibe_name)
            .map(|v| (v.energy.clone(), v.rhythm.clone()))
            .unwrap_or_default();

        text(format!(
            "✨ Pulsing vibe \"{}\"\n\nEnergy: {energy}\nAmplitude: {:.0}%\nDuration: {duration} beats\n\n{}\n\nRhythm: {rhythm} @ {}",
            req.vibe_name,
            amplitude * 100.0,
            render::pulse_block(amplitude, pulse.frequency),
            pulse.rhythm_step,
        ))
    }

    #[tool(description = "Synchronize lines, loops, and vibes")]
    async fn synchronize(
        &self,
        Parameters(req): Parameters<SynchronizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let phase_offset = req.phase_offset.unwrap_or(0.0);

        let outcome = match sync::synchronize(&state.store, &req.elements, phase_offset) {
            Ok(outcome) => outcome,
            Err(e) => return failure(e),
        };

        let master = req.master_rhythm.as_deref().unwrap_or("Auto-detected");
        let roster = outcome
            .statuses
            .iter()
            .map(|s| {
                format!(
                    "{} {} ({})",
                    if s.synced { "✅" } else { "❌" },
                    s.element,
                    s.kind
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let unresolved = outcome.unresolved();
        let warning = if unresolved.is_empty() {
            String::new()
        } else {
            format!("\n⚠️ Not synced (unknown): {}\n", unresolved.join(", "))
        };

        text(format!(
            "🔗 Synchronizing {} elements\n\nMaster Rhythm: {master}\nPhase Offset: {phase_offset}°\n\n{roster}\n{warning}\n{}",
            req.elements.len(),
            render::sync_chain(&outcome.pattern),
        ))
    }

    #[tool(description = "Compose a complex rhythm from lines, loops, and vibes")]
    async fn compose_rhythm(
        &self,
        Parameters(req): Parameters<ComposeRhythmRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let tempo = req.tempo.unwrap_or(120.0);

        let components = match state.store.compose_rhythm(&req.name, &req.components) {
            Ok(components) => components,
            Err(e) => return failure(e),
        };

        let dropped = req.components.len() - components.len();
        let warning = if dropped == 0 {
            String::new()
        } else {
            format!("\n⚠️ {dropped} invalid component(s) ignored\n")
        };

        let roster = components
            .iter()
            .map(|c| format!("  • {}: {:.0}%", c.element, c.weight * 100.0))
            .collect::<Vec<_>>()
            .join("\n");
        let weights: Vec<f64> = components.iter().map(|c| c.weight).collect();

        text(format!(
            "🎼 Rhythm composed: \"{}\"\n\nTempo: {tempo} BPM\nComponents:\n{roster}\n{warning}\n{}\n\nComposite rhythm created and available for use.",
            req.name,
            render::composite_bars(&weights),
        ))
    }

    #[tool(description = "Visualize the entire lines-loops-vibes system")]
    async fn visualize_system(
        &self,
        Parameters(req): Parameters<VisualizeSystemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let show_rhythms = req.show_rhythms.unwrap_or(true);
        let time_window = req.time_window.unwrap_or(16);

        text(render::system_overview(&state.store, show_rhythms, time_window))
    }

    #[tool(description = "Save the current system to a session file")]
    async fn save_data(
        &self,
        Parameters(req): Parameters<SaveDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;

        match state.sessions.save(&state.store, req.filename.as_deref()) {
            Ok(path) => {
                let (lines, loops, vibes, contexts) = state.store.counts();
                text(format!(
                    "💾 Session saved to {}\n\nLines: {lines}\nLoops: {loops}\nVibes: {vibes}\nContexts: {contexts}",
                    path.display(),
                ))
            }
            Err(e) => failure(format!("failed to save session: {e}")),
        }
    }

    #[tool(description = "Load a session file, replacing or merging into the current system")]
    async fn load_data(
        &self,
        Parameters(req): Parameters<LoadDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let merge = req.merge.unwrap_or(false);
        let name = req.filename.as_deref();

        let ServerState {
            store,
            sessions,
            rng,
        } = &mut *state;

        match sessions.load_into(store, name, merge, rng) {
            Ok(Some(stats)) if merge => text(format!(
                "📂 Session merged: {} new entities added, {} existing kept as-is",
                stats.loaded, stats.skipped,
            )),
            Ok(Some(stats)) => text(format!(
                "📂 Session loaded: {} entities restored (previous system replaced)",
                stats.loaded,
            )),
            // No file yet is the expected fresh-start condition.
            Ok(None) => text(format!(
                "📂 No saved session \"{}\" — starting fresh",
                name.unwrap_or(llv_store::DEFAULT_SESSION),
            )),
            Err(e) => failure(format!("failed to load session: {e}")),
        }
    }
}

#[tool_handler]
impl ServerHandler for LlvServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "A creativity toolset built on three primitives: lines (connections \
                 between points), loops (iterative cycles with phase), and vibes \
                 (energies with frequency). Create entities, then trace/iterate/pulse \
                 them to advance their rhythm patterns. Contexts annotate intended \
                 influence. synchronize and compose_rhythm combine elements; \
                 visualize_system renders the whole picture. save_data/load_data \
                 persist the session to JSON (load supports merge mode, which never \
                 overwrites live entities)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
