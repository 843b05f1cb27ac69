//! Month timeline: a schedule flattened into one entry per calendar month.
//!
//! - [`build_month_timeline`] flattens a schedule.
//! - [`mutate`] adds or removes a single month on one stage.
//! - [`serialize`] turns partitioned month runs back into stage ranges.

pub mod mutate;
pub mod serialize;

use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::debug;

use stageplan_store::models::{Stage, StageRange};

pub use mutate::{add_month_to_stage, remove_month_from_stage};
pub use serialize::{StageRun, partition_timeline, serialize_runs};

/// One calendar month and the stage that owns it.
///
/// `month` is always the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthEntry {
    pub month: NaiveDate,
    pub stage: Stage,
}

// ---------------------------------------------------------------------------
// Month arithmetic
// ---------------------------------------------------------------------------

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// First day of the month after the one containing `date`.
pub fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).checked_add_months(Months::new(1))
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    next_month(date)?.pred_opt()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Flatten a schedule into an ascending list of months tagged by owner.
///
/// Each stage is looked up by [`Stage`], not by position, and all five must
/// be present. The walk covers every month between the earliest start and
/// the latest end of any stage; a month belongs to the first stage (in stage
/// order) whose range covers it. Returns `None` when a stage is missing or
/// some month in the span belongs to no stage.
pub fn build_month_timeline(schedule: &[StageRange]) -> Option<Vec<MonthEntry>> {
    let mut spans = Vec::with_capacity(Stage::COUNT);
    for stage in Stage::ORDER {
        let Some(range) = schedule.iter().find(|r| r.stage == stage) else {
            debug!(stage = %stage, "cannot build timeline: stage missing");
            return None;
        };
        spans.push((
            stage,
            month_start(range.planned_starts_on),
            month_start(range.planned_ends_on),
        ));
    }

    let first = spans.iter().map(|(_, start, _)| *start).min()?;
    let last = spans.iter().map(|(_, _, end)| *end).max()?;

    let mut timeline = Vec::new();
    let mut month = first;
    while month <= last {
        let owner = spans
            .iter()
            .find(|(_, start, end)| *start <= month && month <= *end)
            .map(|(stage, _, _)| *stage);

        match owner {
            Some(stage) => timeline.push(MonthEntry { month, stage }),
            None => {
                debug!(month = %month, "cannot build timeline: month not covered by any stage");
                return None;
            }
        }
        month = next_month(month)?;
    }

    Some(timeline)
}

/// Months owned by each stage, indexed by [`Stage::index`].
pub fn stage_lengths(timeline: &[MonthEntry]) -> [usize; Stage::COUNT] {
    let mut lengths = [0; Stage::COUNT];
    for entry in timeline {
        lengths[entry.stage.index()] += 1;
    }
    lengths
}
