use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One of the five fixed phases of a course design plan.
///
/// The declaration order is the canonical stage order and is never changed
/// at runtime. Serialized with the capitalized variant name (`"Analysis"`),
/// displayed in lowercase (`analysis`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Analysis,
    Design,
    Development,
    Implementation,
    Evaluation,
}

impl Stage {
    /// Number of stages in every plan.
    pub const COUNT: usize = 5;

    /// All stages in canonical order.
    pub const ORDER: [Stage; Stage::COUNT] = [
        Stage::Analysis,
        Stage::Design,
        Stage::Development,
        Stage::Implementation,
        Stage::Evaluation,
    ];

    /// Zero-based position in [`Stage::ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Stage::index`]. `None` outside `0..5`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Capitalized name, as used on the wire.
    pub fn label(self) -> &'static str {
        match self {
            Self::Analysis => "Analysis",
            Self::Design => "Design",
            Self::Development => "Development",
            Self::Implementation => "Implementation",
            Self::Evaluation => "Evaluation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Analysis => "analysis",
            Self::Design => "design",
            Self::Development => "development",
            Self::Implementation => "implementation",
            Self::Evaluation => "evaluation",
        };
        f.write_str(s)
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    /// Case-insensitive: `analysis`, `Analysis` and `ANALYSIS` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "analysis" => Ok(Self::Analysis),
            "design" => Ok(Self::Design),
            "development" => Ok(Self::Development),
            "implementation" => Ok(Self::Implementation),
            "evaluation" => Ok(Self::Evaluation),
            _ => Err(StageParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Stage`] string.
#[derive(Debug, Clone)]
pub struct StageParseError(pub String);

impl fmt::Display for StageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid stage: {:?}", self.0)
    }
}

impl std::error::Error for StageParseError {}

// ---------------------------------------------------------------------------

/// Status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    Scheduling,
    ReadyToStart,
    InProgress,
    Completed,
    Archived,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Scheduling => "scheduling",
            Self::ReadyToStart => "ready_to_start",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduling" => Ok(Self::Scheduling),
            "ready_to_start" => Ok(Self::ReadyToStart),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(PlanStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan status: {:?}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ---------------------------------------------------------------------------

/// Where one stage of a started plan stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// Kind of entry in a plan's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEventKind {
    PlanCreated,
    ScheduleCreated,
    ScheduleUpdated,
    ScheduleFinalized,
    PlanStarted,
    StageAdvanced,
    StageExtended,
    PlanCompleted,
    PlanArchived,
}

impl fmt::Display for PlanEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PlanCreated => "plan_created",
            Self::ScheduleCreated => "schedule_created",
            Self::ScheduleUpdated => "schedule_updated",
            Self::ScheduleFinalized => "schedule_finalized",
            Self::PlanStarted => "plan_started",
            Self::StageAdvanced => "stage_advanced",
            Self::StageExtended => "stage_extended",
            Self::PlanCompleted => "plan_completed",
            Self::PlanArchived => "plan_archived",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Row-like types
// ---------------------------------------------------------------------------

/// The planned date range of one stage.
///
/// `planned_starts_on` is the first day of a month and `planned_ends_on` the
/// last calendar day of a month. Field names match the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRange {
    pub stage: Stage,
    pub planned_starts_on: NaiveDate,
    pub planned_ends_on: NaiveDate,
}

impl StageRange {
    pub fn new(stage: Stage, planned_starts_on: NaiveDate, planned_ends_on: NaiveDate) -> Self {
        Self {
            stage,
            planned_starts_on,
            planned_ends_on,
        }
    }
}

/// Actual progress of one stage, next to its planned range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(default)]
    pub actual_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_completed_at: Option<DateTime<Utc>>,
}

impl StageProgress {
    pub fn not_started(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::NotStarted,
            actual_started_at: None,
            actual_completed_at: None,
        }
    }

    /// One `not_started` row per stage, in stage order.
    pub fn initial() -> Vec<Self> {
        Stage::ORDER.iter().map(|s| Self::not_started(*s)).collect()
    }

    pub fn begin(&mut self, at: DateTime<Utc>) {
        self.status = StageStatus::InProgress;
        self.actual_started_at = Some(at);
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = StageStatus::Completed;
        self.actual_completed_at = Some(at);
    }
}

/// A course design plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: Option<String>,
    pub status: PlanStatus,
    pub active_stage: Option<Stage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
    /// Bumped on every change; used for optimistic concurrency on edits.
    #[serde(default)]
    pub version: u64,
}

impl Plan {
    /// A fresh draft plan with a new v4 id.
    pub fn new(name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            status: PlanStatus::Draft,
            active_stage: None,
            created_at: now,
            updated_at: now,
            finalized_at: None,
            version: 0,
        }
    }

    /// Name for display, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// One entry in a plan's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvent {
    pub at: DateTime<Utc>,
    pub kind: PlanEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl PlanEvent {
    pub fn new(kind: PlanEventKind, stage: Option<Stage>, payload: serde_json::Value) -> Self {
        Self {
            at: Utc::now(),
            kind,
            stage,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_matches_index() {
        for (i, stage) in Stage::ORDER.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(Stage::from_index(i), Some(*stage));
        }
        assert_eq!(Stage::from_index(5), None);
    }

    #[test]
    fn stage_next_stops_at_evaluation() {
        assert_eq!(Stage::Analysis.next(), Some(Stage::Design));
        assert_eq!(Stage::Implementation.next(), Some(Stage::Evaluation));
        assert_eq!(Stage::Evaluation.next(), None);
    }

    #[test]
    fn stage_parses_case_insensitively() {
        assert_eq!("analysis".parse::<Stage>().unwrap(), Stage::Analysis);
        assert_eq!("Design".parse::<Stage>().unwrap(), Stage::Design);
        assert_eq!("EVALUATION".parse::<Stage>().unwrap(), Stage::Evaluation);
        let err = "testing".parse::<Stage>().unwrap_err();
        assert_eq!(err.to_string(), "invalid stage: \"testing\"");
    }

    #[test]
    fn stage_serializes_capitalized() {
        let json = serde_json::to_string(&Stage::Implementation).unwrap();
        assert_eq!(json, "\"Implementation\"");
        let back: Stage = serde_json::from_str("\"Development\"").unwrap();
        assert_eq!(back, Stage::Development);
    }

    #[test]
    fn plan_status_display_roundtrip() {
        for status in [
            PlanStatus::Draft,
            PlanStatus::Scheduling,
            PlanStatus::ReadyToStart,
            PlanStatus::InProgress,
            PlanStatus::Completed,
            PlanStatus::Archived,
        ] {
            assert_eq!(status.to_string().parse::<PlanStatus>().unwrap(), status);
        }
        assert!("running".parse::<PlanStatus>().is_err());
    }

    #[test]
    fn stage_range_uses_wire_field_names() {
        let range = StageRange::new(
            Stage::Analysis,
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        );
        let value = serde_json::to_value(range).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "stage": "Analysis",
                "planned_starts_on": "2026-02-01",
                "planned_ends_on": "2026-03-31",
            })
        );
    }

    #[test]
    fn initial_progress_covers_every_stage() {
        let progress = StageProgress::initial();
        let stages: Vec<Stage> = progress.iter().map(|p| p.stage).collect();
        assert_eq!(stages, Stage::ORDER.to_vec());
        assert!(progress.iter().all(|p| p.status == StageStatus::NotStarted
            && p.actual_started_at.is_none()
            && p.actual_completed_at.is_none()));
    }

    #[test]
    fn stage_progress_records_actual_times() {
        let mut row = StageProgress::not_started(Stage::Design);
        let started = Utc::now();
        row.begin(started);
        assert_eq!(row.status, StageStatus::InProgress);
        assert_eq!(row.actual_started_at, Some(started));

        let done = started + chrono::Duration::days(30);
        row.complete(done);
        assert_eq!(row.status, StageStatus::Completed);
        assert_eq!(row.actual_completed_at, Some(done));

        let value = serde_json::to_value(row).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["stage"], "Design");
    }

    #[test]
    fn new_plan_is_draft() {
        let plan = Plan::new(Some("Intro to Rust".into()));
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.version, 0);
        assert!(plan.active_stage.is_none());
        assert_eq!(plan.display_name(), "Intro to Rust");
        assert_eq!(Plan::new(None).display_name(), "(unnamed)");
    }
}
