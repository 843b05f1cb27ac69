//! JSON snapshot persistence for the plan store.
//!
//! The whole store is one JSON document. Saves write a uniquely named temp
//! file in the store's directory, sync it to disk, and rename it over the
//! target, so a crash leaves either the old store or the new one.
//!
//! Saving is not a read-modify-write on its own; callers that load, change,
//! and save hold a [`crate::lock::StoreLock`] for the whole sequence.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::models::{Plan, PlanEvent, StageProgress, StageRange};

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub plans: Vec<StoredPlan>,
}

/// One plan together with its current schedule and event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub plan: Plan,
    /// Current schedule in stage order. Empty until a schedule is saved.
    #[serde(default)]
    pub stages: Vec<StageRange>,
    /// Actual progress per stage, in stage order.
    #[serde(default = "StageProgress::initial")]
    pub progress: Vec<StageProgress>,
    #[serde(default)]
    pub events: Vec<PlanEvent>,
}

impl StoredPlan {
    /// A plan with no schedule, untouched progress, and no events.
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            stages: Vec::new(),
            progress: StageProgress::initial(),
            events: Vec::new(),
        }
    }
}

/// Load the snapshot at `path`. A missing file is an empty store.
pub fn load_snapshot(path: &Path) -> Result<StoreSnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "store file absent, starting empty");
        return Ok(StoreSnapshot::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read store file at {}", path.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse store file at {}", path.display()))?;

    debug!(path = %path.display(), plans = snapshot.plans.len(), "store loaded");
    Ok(snapshot)
}

/// Serialize and write the snapshot, creating parent dirs as needed.
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create store directory {}", dir.display()))?;

    let contents =
        serde_json::to_string_pretty(snapshot).context("failed to serialize store snapshot")?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to sync {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move store into place at {}", path.display()))?;

    info!(path = %path.display(), plans = snapshot.plans.len(), "store saved");
    Ok(())
}
