//! Display-ready summaries derived from a schedule.
//!
//! Everything here is recomputed from the schedule on each call; nothing is
//! cached.

use chrono::NaiveDate;
use serde::Serialize;

use stageplan_store::models::{Stage, StageRange};

use crate::timeline::{build_month_timeline, month_end, partition_timeline};

/// Per-stage block for rendering a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCard {
    pub stage: Stage,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub month_count: usize,
    /// First day of every month the stage covers.
    pub months: Vec<NaiveDate>,
    /// Whether removing a month from this stage would be accepted.
    pub can_remove_month: bool,
}

/// Overall span of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanBounds {
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub total_months: usize,
}

/// One card per stage in stage order, or an empty list when the schedule
/// cannot be flattened into a month timeline.
pub fn build_stage_cards(schedule: &[StageRange]) -> Vec<StageCard> {
    stage_cards(schedule).unwrap_or_default()
}

fn stage_cards(schedule: &[StageRange]) -> Option<Vec<StageCard>> {
    let timeline = build_month_timeline(schedule)?;
    let runs = partition_timeline(&timeline)?;

    runs.iter()
        .map(|run| {
            let first = run.months.first()?;
            let last = run.months.last()?;
            Some(StageCard {
                stage: run.stage,
                starts_on: first.month,
                ends_on: month_end(last.month)?,
                month_count: run.months.len(),
                months: run.months.iter().map(|e| e.month).collect(),
                can_remove_month: run.months.len() > 1,
            })
        })
        .collect()
}

/// First day, last day, and month count of the whole plan.
pub fn plan_bounds(schedule: &[StageRange]) -> Option<PlanBounds> {
    let timeline = build_month_timeline(schedule)?;
    let first = timeline.first()?;
    let last = timeline.last()?;
    Some(PlanBounds {
        starts_on: first.month,
        ends_on: month_end(last.month)?,
        total_months: timeline.len(),
    })
}
