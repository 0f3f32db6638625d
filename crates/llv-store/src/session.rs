//! Session files: one JSON document per named session under the data
//! directory.
//!
//! Writes go through a temp file in the same directory followed by an
//! atomic rename, so a crash mid-write never leaves a partial file visible
//! to a later load. A missing file on load is the normal "no prior session"
//! condition, reported as `Ok(None)` rather than an error.

use std::fs;
use std::path::{Path, PathBuf};

use llv_core::snapshot::SessionSnapshot;
use llv_core::store::EntityStore;
use rand::Rng;

use crate::error::{Result, StoreError};

/// Session name used when the caller gives none.
pub const DEFAULT_SESSION: &str = "llv-session";

/// Default data directory, relative to the working directory.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("llv-data")
}

/// Whether persistence is enabled for this process. On by default;
/// `LLV_PERSISTENCE=0|false|off|no` disables it.
pub fn persistence_enabled() -> bool {
    match std::env::var("LLV_PERSISTENCE") {
        Ok(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        ),
        Err(_) => true,
    }
}

/// Sanitize a session name for use as a filename.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reads and writes session snapshots under one data directory.
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    /// Open a session store, creating the data directory as needed.
    /// `data_dir`: override the directory (CLI flag or `LLV_DATA_DIR`).
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = data_dir.map(PathBuf::from).unwrap_or_else(default_data_dir);
        fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", data_dir.display()))
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a session name to its file path. Empty or absent names use
    /// the default session.
    pub fn session_path(&self, name: Option<&str>) -> PathBuf {
        let stem = match name.map(sanitize_name) {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_SESSION.to_string(),
        };
        self.data_dir.join(format!("{stem}.json"))
    }

    /// Serialize the store and write it atomically. Returns the final path.
    pub fn save(&self, store: &EntityStore, name: Option<&str>) -> Result<PathBuf> {
        let path = self.session_path(name);
        let json = llv_core::export_json(store)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("saved session to {}", path.display());
        Ok(path)
    }

    /// Read a session snapshot. `Ok(None)` when no file exists yet.
    pub fn load(&self, name: Option<&str>) -> Result<Option<SessionSnapshot>> {
        let path = self.session_path(name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no session file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(llv_core::import_json(&json)?))
    }

    /// Load and apply in one step: replace mode overwrites the whole store,
    /// merge mode only fills gaps. Returns how many entities arrived, or
    /// `None` when there was no file.
    pub fn load_into(
        &self,
        store: &mut EntityStore,
        name: Option<&str>,
        merge: bool,
        rng: &mut impl Rng,
    ) -> Result<Option<LoadStats>> {
        let Some(snapshot) = self.load(name)? else {
            return Ok(None);
        };

        let total = snapshot.entity_count();
        let stats = if merge {
            let merged = snapshot.apply_merge(store, rng);
            LoadStats {
                loaded: merged.inserted,
                skipped: merged.skipped,
                total,
            }
        } else {
            snapshot.apply_replace(store, rng);
            LoadStats {
                loaded: total,
                skipped: 0,
                total,
            }
        };
        Ok(Some(stats))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct LoadStats {
    /// Entities installed into the live store.
    pub loaded: usize,
    /// Entities ignored because the name was already live (merge mode).
    pub skipped: usize,
    /// Entities present in the file.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use tempfile::TempDir;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn populated_store() -> EntityStore {
        let mut rng = rng();
        let mut store = EntityStore::new();
        store.create_line("wire", "a", "b", "steady", &mut rng).unwrap();
        store.create_vibe("mood", "calm", 10.0, "ambient", &mut rng).unwrap();
        store
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();
        let store = populated_store();

        let path = sessions.save(&store, None).unwrap();
        assert_eq!(path.file_name().unwrap(), "llv-session.json");

        let mut restored = EntityStore::new();
        let stats = sessions
            .load_into(&mut restored, None, false, &mut rng())
            .unwrap()
            .unwrap();
        assert_eq!(stats.loaded, 2);
        assert!(restored.line("wire").is_some());
        assert!(restored.vibe("mood").is_some());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();

        assert!(sessions.load(Some("nothing-here")).unwrap().is_none());

        let mut store = EntityStore::new();
        let stats = sessions
            .load_into(&mut store, Some("nothing-here"), false, &mut rng())
            .unwrap();
        assert!(stats.is_none());
        assert_eq!(store.counts(), (0, 0, 0, 0));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();
        fs::write(sessions.session_path(Some("bad")), "{not json").unwrap();

        let err = sessions.load(Some("bad")).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();
        sessions.save(&populated_store(), Some("tidy")).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_session_name_sanitized() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();

        let path = sessions.session_path(Some("my session/one"));
        assert_eq!(path.file_name().unwrap(), "my_session_one.json");

        // Blank names fall back to the default session.
        let path = sessions.session_path(Some("   "));
        assert_eq!(path.file_name().unwrap(), "llv-session.json");
    }

    #[test]
    fn test_merge_load_fills_gaps_only() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();
        let mut rng = rng();

        // File holds "mood" at 99Hz and a new "fresh" vibe.
        let mut on_disk = EntityStore::new();
        on_disk.create_vibe("mood", "intense", 99.0, "driving", &mut rng).unwrap();
        on_disk.create_vibe("fresh", "calm", 20.0, "ambient", &mut rng).unwrap();
        sessions.save(&on_disk, Some("merge-me")).unwrap();

        // Live store already has "mood" at 10Hz.
        let mut live = EntityStore::new();
        live.create_vibe("mood", "calm", 10.0, "ambient", &mut rng).unwrap();

        let stats = sessions
            .load_into(&mut live, Some("merge-me"), true, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(stats, LoadStats { loaded: 1, skipped: 1, total: 2 });
        assert_eq!(live.vibe("mood").unwrap().frequency, 10.0);
        assert!(live.vibe("fresh").is_some());
    }

    #[test]
    fn test_save_overwrites_previous_session() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(Some(dir.path())).unwrap();
        let mut rng = rng();

        sessions.save(&populated_store(), None).unwrap();

        let mut bigger = populated_store();
        bigger.create_loop("cycle", "spiral", "constant", &mut rng).unwrap();
        sessions.save(&bigger, None).unwrap();

        let mut restored = EntityStore::new();
        sessions.load_into(&mut restored, None, false, &mut rng).unwrap();
        assert_eq!(restored.counts(), (1, 1, 1, 0));
    }
}
