//! Load the plan repository from the store file and write it back.

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use stageplan_core::repository::PlanRepository;
use stageplan_store::config::StoreConfig;
use stageplan_store::file::{load_snapshot, save_snapshot};
use stageplan_store::lock::StoreLock;

use crate::resolve::resolve_plan_id;

/// A repository loaded from one store file for the length of a command.
///
/// The store lock is taken before loading and held until the session is
/// dropped, so a concurrent command waits and then sees this one's saves.
pub struct Session {
    path: PathBuf,
    pub repo: PlanRepository,
    _lock: StoreLock,
}

impl Session {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let lock = StoreLock::acquire(&config.path)?;
        let snapshot = load_snapshot(&config.path)?;
        debug!(plans = snapshot.plans.len(), "opened session");
        Ok(Self {
            path: config.path.clone(),
            repo: PlanRepository::from_snapshot(snapshot),
            _lock: lock,
        })
    }

    /// Resolve a plan argument (full UUID or prefix) against stored plans.
    pub fn plan_id(&self, input: &str) -> Result<Uuid> {
        resolve_plan_id(input, &self.repo.list())
    }

    /// Persist the repository's current state.
    pub fn save(&self) -> Result<()> {
        save_snapshot(&self.path, &self.repo.snapshot())
    }
}
