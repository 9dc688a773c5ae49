//! The development program artifact.
//!
//! A human-curated, priority-ordered list of tasks selected for active work,
//! persisted as a single JSON file. Created by an explicit operation and
//! rewritten in full each time; never auto-refreshed, so the status snapshot
//! inside it is a hint and consumers must re-read live status from the
//! tracker when it matters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;

/// File name of the program artifact.
const PROGRAM_FILE: &str = "development_program.json";

/// One task in the development program.
///
/// Priority is a dense 1-based rank equal to insertion order at creation
/// time and is never renumbered afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub id: String,
    pub summary: String,
    /// Status snapshot at creation time, stale by design
    pub status: String,
    pub priority: u32,
}

/// Store for the single program artifact under a data directory.
#[derive(Debug, Clone)]
pub struct ProgramStore {
    path: PathBuf,
}

impl ProgramStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PROGRAM_FILE),
        }
    }

    /// Path of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the program with a new entry list (full rewrite).
    pub fn save(&self, entries: &[ProgramEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the program, or `None` if none has been created.
    pub fn load(&self) -> Result<Option<Vec<ProgramEntry>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}
