//! Lines-loops-vibes entity and rhythm engine.
//!
//! Owns the four named entity categories (Line, Loop, Vibe, Context), the
//! cyclic rhythm generators attached to them, loop phase progression,
//! cross-category synchronization, and weighted rhythm composition, plus the
//! session snapshot wire format and glyph rendering for tool responses.
//!
//! Zero I/O — pure state engine with no opinions about transport or
//! persistence.

pub mod compose;
pub mod entity;
pub mod error;
pub mod phase;
pub mod render;
pub mod rhythm;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod time;

pub use compose::Component;
pub use entity::{Context, Iteration, Line, Loop, Pulse, Trace, Vibe, context_rhythm_modifier};
pub use error::EngineError;
pub use phase::phase;
pub use rhythm::{LINE_RHYTHMS, LOOP_RHYTHMS, RhythmGenerator, VIBE_RHYTHMS};
pub use snapshot::{CURRENT_VERSION, MergeStats, SessionSnapshot, export_json, import_json};
pub use store::{ContextReceipt, EntityStore};
pub use sync::{SyncOutcome, SyncStatus, synchronize};
