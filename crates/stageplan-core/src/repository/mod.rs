//! Plan repository: the single writer for every plan's schedule.
//!
//! Holds a map from plan id to the plan, its current schedule, and its event
//! log. A schedule is never edited in place: each edit computes a new
//! snapshot from the current one and swaps it in under the write lock, then
//! bumps the plan's `version`. Callers that pass the version they last saw
//! get [`PlanStoreError::StaleVersion`] instead of silently applying an edit
//! to a schedule they have not seen; callers that pass `None` get
//! last-write-wins.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use stageplan_store::file::{StoreSnapshot, StoredPlan};
use stageplan_store::models::{
    Plan, PlanEvent, PlanEventKind, PlanStatus, Stage, StageProgress, StageStatus,
};

use crate::schedule::{Schedule, ValidationIssue, validate_for_save};
use crate::state::PlanStateMachine;
use crate::timeline::{add_month_to_stage, remove_month_from_stage};

/// Errors returned by [`PlanRepository`] operations.
#[derive(Debug, Error)]
pub enum PlanStoreError {
    #[error("plan {0} not found")]
    NotFound(Uuid),

    #[error("plan {id} has changed since it was read (expected version {expected}, found {actual})")]
    StaleVersion { id: Uuid, expected: u64, actual: u64 },

    #[error("cannot change the schedule of plan {id}: it is {status}")]
    ScheduleLocked { id: Uuid, status: PlanStatus },

    #[error("invalid status transition for plan {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: PlanStatus,
        to: PlanStatus,
    },

    #[error("plan {id} is not in progress (status is {status})")]
    NotInProgress { id: Uuid, status: PlanStatus },

    #[error("cannot extend {stage} of plan {id}: the stage is already completed")]
    StageCompleted { id: Uuid, stage: Stage },

    #[error("an extension needs at least one month")]
    EmptyExtension { id: Uuid },

    #[error("plan {id} has no schedule yet")]
    NoSchedule { id: Uuid },

    #[error("schedule for plan {id} is invalid: {issue}")]
    InvalidSchedule {
        id: Uuid,
        #[source]
        issue: ValidationIssue,
    },
}

/// Which single-month edit to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthEdit {
    Add,
    Remove,
}

impl MonthEdit {
    fn apply(self, schedule: &Schedule, stage_index: usize) -> Option<Schedule> {
        match self {
            Self::Add => add_month_to_stage(schedule, stage_index),
            Self::Remove => remove_month_from_stage(schedule, stage_index),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add_month",
            Self::Remove => "remove_month",
        }
    }
}

/// Result of a month edit that passed the plan-level checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The new schedule, now stored as the plan's current schedule.
    Applied(Schedule),
    /// The edit was not possible; the stored schedule is unchanged.
    Rejected,
}

#[derive(Debug, Clone)]
struct PlanRecord {
    plan: Plan,
    schedule: Schedule,
    /// One row per stage, in stage order.
    progress: Vec<StageProgress>,
    events: Vec<PlanEvent>,
}

impl PlanRecord {
    fn touch(&mut self) {
        self.plan.version += 1;
        self.plan.updated_at = Utc::now();
    }

    fn log(&mut self, kind: PlanEventKind, stage: Option<Stage>, payload: serde_json::Value) {
        self.events.push(PlanEvent::new(kind, stage, payload));
    }

    fn check_version(&self, expected: Option<u64>) -> Result<(), PlanStoreError> {
        match expected {
            Some(expected) if expected != self.plan.version => Err(PlanStoreError::StaleVersion {
                id: self.plan.id,
                expected,
                actual: self.plan.version,
            }),
            _ => Ok(()),
        }
    }

    fn stage_progress(&mut self, stage: Stage) -> &mut StageProgress {
        &mut self.progress[stage.index()]
    }

    fn ensure_schedule_editable(&self) -> Result<(), PlanStoreError> {
        if PlanStateMachine::can_edit_schedule(self.plan.status) {
            Ok(())
        } else {
            Err(PlanStoreError::ScheduleLocked {
                id: self.plan.id,
                status: self.plan.status,
            })
        }
    }

    fn transition(&mut self, to: PlanStatus) -> Result<(), PlanStoreError> {
        let from = self.plan.status;
        if !PlanStateMachine::is_valid_transition(from, to) {
            return Err(PlanStoreError::InvalidTransition {
                id: self.plan.id,
                from,
                to,
            });
        }
        self.plan.status = to;
        info!(plan_id = %self.plan.id, %from, %to, "plan status changed");
        Ok(())
    }
}

/// Thread-safe map from plan id to its current state.
#[derive(Debug, Default)]
pub struct PlanRepository {
    records: RwLock<HashMap<Uuid, PlanRecord>>,
}

impl PlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from a persisted snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let records = snapshot
            .plans
            .into_iter()
            .map(|stored| {
                let record = PlanRecord {
                    plan: stored.plan,
                    schedule: Schedule::new(stored.stages),
                    progress: normalize_progress(stored.progress),
                    events: stored.events,
                };
                (record.plan.id, record)
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Copy the current state out for persistence, oldest plan first.
    pub fn snapshot(&self) -> StoreSnapshot {
        let records = self.read();
        let mut plans: Vec<StoredPlan> = records
            .values()
            .map(|r| StoredPlan {
                plan: r.plan.clone(),
                stages: r.schedule.clone().into_inner(),
                progress: r.progress.clone(),
                events: r.events.clone(),
            })
            .collect();
        plans.sort_by(|a, b| {
            (a.plan.created_at, a.plan.id).cmp(&(b.plan.created_at, b.plan.id))
        });
        StoreSnapshot { plans }
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    pub fn get(&self, id: Uuid) -> Result<Plan, PlanStoreError> {
        self.read()
            .get(&id)
            .map(|r| r.plan.clone())
            .ok_or(PlanStoreError::NotFound(id))
    }

    /// All plans, newest first.
    pub fn list(&self) -> Vec<Plan> {
        let mut plans: Vec<Plan> = self.read().values().map(|r| r.plan.clone()).collect();
        plans.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        plans
    }

    /// The plan's current schedule (empty if none has been saved).
    pub fn schedule(&self, id: Uuid) -> Result<Schedule, PlanStoreError> {
        self.read()
            .get(&id)
            .map(|r| r.schedule.clone())
            .ok_or(PlanStoreError::NotFound(id))
    }

    /// Actual progress of each stage, in stage order.
    pub fn progress(&self, id: Uuid) -> Result<Vec<StageProgress>, PlanStoreError> {
        self.read()
            .get(&id)
            .map(|r| r.progress.clone())
            .ok_or(PlanStoreError::NotFound(id))
    }

    /// The plan's event log, oldest first.
    pub fn events(&self, id: Uuid) -> Result<Vec<PlanEvent>, PlanStoreError> {
        self.read()
            .get(&id)
            .map(|r| r.events.clone())
            .ok_or(PlanStoreError::NotFound(id))
    }

    // -------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------

    /// Create a new draft plan with no schedule.
    pub fn create_plan(&self, name: Option<String>) -> Plan {
        let plan = Plan::new(normalize_name(name));
        let mut record = PlanRecord {
            plan: plan.clone(),
            schedule: Schedule::default(),
            progress: StageProgress::initial(),
            events: Vec::new(),
        };
        record.log(
            PlanEventKind::PlanCreated,
            None,
            json!({ "name": plan.name }),
        );

        info!(plan_id = %plan.id, name = plan.display_name(), "plan created");
        self.write().insert(plan.id, record);
        plan
    }

    /// Replace the plan's schedule with a validated one.
    ///
    /// `name`, when given, also renames the plan. A draft plan moves to
    /// `scheduling`; a `ready_to_start` plan stays finalized.
    pub fn save_schedule(
        &self,
        id: Uuid,
        name: Option<String>,
        schedule: Schedule,
    ) -> Result<Plan, PlanStoreError> {
        self.with_record(id, |record| {
            record.ensure_schedule_editable()?;
            validate_for_save(&schedule)
                .map_err(|issue| PlanStoreError::InvalidSchedule { id, issue })?;

            if record.plan.status == PlanStatus::Draft {
                record.transition(PlanStatus::Scheduling)?;
            }

            let kind = if record.schedule.is_empty() {
                PlanEventKind::ScheduleCreated
            } else {
                PlanEventKind::ScheduleUpdated
            };
            if let Some(name) = normalize_name(name) {
                record.plan.name = Some(name);
            }
            record.schedule = schedule;
            record.touch();
            let payload = json!({ "name": record.plan.name, "stages": record.schedule });
            record.log(kind, None, payload);

            info!(plan_id = %id, event = %kind, "schedule saved");
            Ok(record.plan.clone())
        })
    }

    /// Add or remove one month on the stage at `stage_index`.
    ///
    /// Plan-level problems (unknown plan, stale version, frozen schedule)
    /// are errors. An edit the schedule itself cannot take (index out of
    /// range, last month of a stage, no buildable schedule) is
    /// [`EditOutcome::Rejected`] and changes nothing.
    pub fn edit_month(
        &self,
        id: Uuid,
        stage_index: usize,
        edit: MonthEdit,
        expected_version: Option<u64>,
    ) -> Result<EditOutcome, PlanStoreError> {
        self.with_record(id, |record| {
            record.check_version(expected_version)?;
            record.ensure_schedule_editable()?;

            let Some(next) = edit.apply(&record.schedule, stage_index) else {
                debug!(plan_id = %id, stage_index, edit = edit.as_str(), "edit rejected");
                return Ok(EditOutcome::Rejected);
            };

            let stage = Stage::from_index(stage_index);
            record.schedule = next.clone();
            record.touch();
            record.log(
                PlanEventKind::ScheduleUpdated,
                stage,
                json!({ "edit": edit.as_str(), "stages": next }),
            );

            info!(plan_id = %id, stage_index, edit = edit.as_str(), version = record.plan.version, "schedule edited");
            Ok(EditOutcome::Applied(next))
        })
    }

    pub fn add_month(
        &self,
        id: Uuid,
        stage_index: usize,
        expected_version: Option<u64>,
    ) -> Result<EditOutcome, PlanStoreError> {
        self.edit_month(id, stage_index, MonthEdit::Add, expected_version)
    }

    pub fn remove_month(
        &self,
        id: Uuid,
        stage_index: usize,
        expected_version: Option<u64>,
    ) -> Result<EditOutcome, PlanStoreError> {
        self.edit_month(id, stage_index, MonthEdit::Remove, expected_version)
    }

    /// Give a stage of an in-progress plan `months` more months; every later
    /// stage shifts later by the same amount.
    ///
    /// This is the one schedule change allowed after the plan has started.
    /// Completed stages cannot be extended. An extension the schedule cannot
    /// take is [`EditOutcome::Rejected`] and changes nothing.
    pub fn extend_stage(
        &self,
        id: Uuid,
        stage: Stage,
        months: u32,
        expected_version: Option<u64>,
    ) -> Result<EditOutcome, PlanStoreError> {
        self.with_record(id, |record| {
            record.check_version(expected_version)?;
            if record.plan.status != PlanStatus::InProgress {
                return Err(PlanStoreError::NotInProgress {
                    id,
                    status: record.plan.status,
                });
            }
            if record.stage_progress(stage).status == StageStatus::Completed {
                return Err(PlanStoreError::StageCompleted { id, stage });
            }
            if months == 0 {
                return Err(PlanStoreError::EmptyExtension { id });
            }

            let mut next = record.schedule.clone();
            for _ in 0..months {
                match add_month_to_stage(&next, stage.index()) {
                    Some(longer) => next = longer,
                    None => {
                        debug!(plan_id = %id, %stage, months, "extension rejected");
                        return Ok(EditOutcome::Rejected);
                    }
                }
            }

            record.schedule = next.clone();
            record.touch();
            record.log(
                PlanEventKind::StageExtended,
                Some(stage),
                json!({ "months": months, "stages": next }),
            );

            info!(plan_id = %id, %stage, months, version = record.plan.version, "stage extended");
            Ok(EditOutcome::Applied(next))
        })
    }

    /// Lock in the schedule: the plan becomes `ready_to_start`.
    ///
    /// Requires a schedule with all five stages that passes validation.
    /// Finalizing an already finalized plan records a fresh snapshot.
    pub fn finalize(&self, id: Uuid) -> Result<Plan, PlanStoreError> {
        self.with_record(id, |record| {
            record.ensure_schedule_editable()?;
            if record.schedule.is_empty() {
                return Err(PlanStoreError::NoSchedule { id });
            }
            validate_for_save(&record.schedule)
                .map_err(|issue| PlanStoreError::InvalidSchedule { id, issue })?;

            if record.plan.status != PlanStatus::ReadyToStart {
                record.transition(PlanStatus::ReadyToStart)?;
            }
            record.plan.finalized_at = Some(Utc::now());
            record.touch();
            let payload = json!({ "stages": record.schedule });
            record.log(PlanEventKind::ScheduleFinalized, None, payload);
            Ok(record.plan.clone())
        })
    }

    /// Start work on a finalized plan at its first stage.
    pub fn start(&self, id: Uuid) -> Result<Plan, PlanStoreError> {
        self.with_record(id, |record| {
            record.transition(PlanStatus::InProgress)?;
            record.plan.active_stage = Some(Stage::Analysis);
            record.stage_progress(Stage::Analysis).begin(Utc::now());
            record.touch();
            record.log(PlanEventKind::PlanStarted, Some(Stage::Analysis), json!({}));
            Ok(record.plan.clone())
        })
    }

    /// Move an in-progress plan to its next stage. Advancing past the last
    /// stage completes the plan.
    pub fn advance_stage(&self, id: Uuid) -> Result<Plan, PlanStoreError> {
        self.with_record(id, |record| {
            if record.plan.status != PlanStatus::InProgress {
                return Err(PlanStoreError::NotInProgress {
                    id,
                    status: record.plan.status,
                });
            }

            let now = Utc::now();
            let from = record.plan.active_stage;
            match from.map(Stage::next) {
                Some(Some(next)) => {
                    if let Some(current) = from {
                        record.stage_progress(current).complete(now);
                    }
                    record.stage_progress(next).begin(now);
                    record.plan.active_stage = Some(next);
                    record.log(
                        PlanEventKind::StageAdvanced,
                        Some(next),
                        json!({ "from": from }),
                    );
                }
                Some(None) => {
                    record.transition(PlanStatus::Completed)?;
                    record.stage_progress(Stage::Evaluation).complete(now);
                    record.plan.active_stage = None;
                    record.log(PlanEventKind::PlanCompleted, None, json!({}));
                }
                // In progress without an active stage: begin at the start.
                None => {
                    record.stage_progress(Stage::Analysis).begin(now);
                    record.plan.active_stage = Some(Stage::Analysis);
                    record.log(
                        PlanEventKind::StageAdvanced,
                        Some(Stage::Analysis),
                        json!({ "from": null }),
                    );
                }
            }
            record.touch();
            Ok(record.plan.clone())
        })
    }

    pub fn archive(&self, id: Uuid) -> Result<Plan, PlanStoreError> {
        self.with_record(id, |record| {
            let from = record.plan.status;
            record.transition(PlanStatus::Archived)?;
            record.touch();
            record.log(
                PlanEventKind::PlanArchived,
                None,
                json!({ "from": from }),
            );
            Ok(record.plan.clone())
        })
    }

    // -------------------------------------------------------------------
    // Locking
    // -------------------------------------------------------------------

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, PlanRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, PlanRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on one record while holding the write lock. `f` must check
    /// everything before it mutates so a failed operation leaves no trace.
    fn with_record<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut PlanRecord) -> Result<T, PlanStoreError>,
    ) -> Result<T, PlanStoreError> {
        let mut records = self.write();
        let record = records.get_mut(&id).ok_or(PlanStoreError::NotFound(id))?;
        f(record)
    }
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty())
}

/// Exactly one row per stage in stage order; missing rows start out
/// `not_started`, duplicates keep the first.
fn normalize_progress(rows: Vec<StageProgress>) -> Vec<StageProgress> {
    Stage::ORDER
        .iter()
        .map(|stage| {
            rows.iter()
                .find(|row| row.stage == *stage)
                .copied()
                .unwrap_or_else(|| StageProgress::not_started(*stage))
        })
        .collect()
}
