//! Lightweight adapter-side resumability state.
//!
//! A small JSON document `{ last_processed_ids, last_query, last_run }`
//! read at adapter construction and rewritten after each unit of work. This
//! is NOT the durable checkpoint (that lives in Postgres) — it only lets
//! sweep-mode adapters skip recently seen ids cheaply across processes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// Most recent ids retained in the state document. Older entries age out;
/// the database natural-key constraint still catches anything this misses.
const MAX_TRACKED_IDS: usize = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterState {
    #[serde(default)]
    pub last_processed_ids: Vec<String>,
    #[serde(default)]
    pub last_query: Option<String>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

impl AdapterState {
    #[must_use]
    pub fn was_processed(&self, id: &str) -> bool {
        self.last_processed_ids.iter().any(|seen| seen == id)
    }

    pub fn mark_processed(&mut self, id: &str) {
        if self.was_processed(id) {
            return;
        }
        self.last_processed_ids.push(id.to_owned());
        if self.last_processed_ids.len() > MAX_TRACKED_IDS {
            let excess = self.last_processed_ids.len() - MAX_TRACKED_IDS;
            self.last_processed_ids.drain(..excess);
        }
    }

    pub fn begin_run(&mut self, query: &str, now: DateTime<Utc>) {
        self.last_query = Some(query.to_owned());
        self.last_run = Some(now);
    }
}

/// JSON-file persistence for [`AdapterState`].
#[derive(Debug, Clone)]
pub struct AdapterStateFile {
    path: PathBuf,
}

impl AdapterStateFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    /// Loads the persisted state, or a default state if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::StateFile`] if the file exists but cannot be
    /// read or parsed.
    pub fn load(&self) -> Result<AdapterState, ScraperError> {
        if !Path::new(&self.path).exists() {
            return Ok(AdapterState::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| ScraperError::StateFile {
            path: self.path_str(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ScraperError::StateFile {
            path: self.path_str(),
            reason: e.to_string(),
        })
    }

    /// Persists `state`, replacing the previous document.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::StateFile`] if the file cannot be written.
    pub fn save(&self, state: &AdapterState) -> Result<(), ScraperError> {
        let content =
            serde_json::to_string_pretty(state).map_err(|e| ScraperError::StateFile {
                path: self.path_str(),
                reason: e.to_string(),
            })?;
        std::fs::write(&self.path, content).map_err(|e| ScraperError::StateFile {
            path: self.path_str(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_processed_dedups_and_caps() {
        let mut state = AdapterState::default();
        state.mark_processed("a");
        state.mark_processed("a");
        assert_eq!(state.last_processed_ids.len(), 1);

        for i in 0..(MAX_TRACKED_IDS + 10) {
            state.mark_processed(&format!("id-{i}"));
        }
        assert_eq!(state.last_processed_ids.len(), MAX_TRACKED_IDS);
        // Oldest entries aged out.
        assert!(!state.was_processed("a"));
        assert!(state.was_processed(&format!("id-{}", MAX_TRACKED_IDS + 9)));
    }

    #[test]
    fn state_file_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "buzzdb_adapter_state_test_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let file = AdapterStateFile::new(&path);
        assert!(file.load().unwrap().last_query.is_none());

        let mut state = AdapterState::default();
        state.begin_run("Razorpay", Utc::now());
        state.mark_processed("7123");
        file.save(&state).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.last_query.as_deref(), Some("Razorpay"));
        assert!(loaded.was_processed("7123"));
        assert!(loaded.last_run.is_some());

        let _ = std::fs::remove_file(&path);
    }
}
