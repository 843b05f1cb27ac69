//! Month-granular resize edits.
//!
//! Both edits work the same way: flatten the schedule, change one stage's
//! month count, grow or shrink the timeline by one month at its tail, and
//! re-partition. Every output range is a slice of one contiguous sorted
//! timeline, so the result has no gaps or overlaps, later stages shift by
//! one month, and earlier stages are untouched.
//!
//! A `None` result means the edit was rejected and the caller keeps its
//! current schedule.

use tracing::debug;

use stageplan_store::models::{Stage, StageRange};

use super::serialize::{repartition, serialize_runs};
use super::{MonthEntry, build_month_timeline, next_month, stage_lengths};
use crate::schedule::Schedule;

/// Give the stage at `stage_index` one more month.
///
/// Later stages move one month later; the plan grows by one month.
/// Returns `None` for an index outside `0..5` or a schedule that cannot be
/// flattened.
pub fn add_month_to_stage(schedule: &[StageRange], stage_index: usize) -> Option<Schedule> {
    let Some(stage) = Stage::from_index(stage_index) else {
        debug!(stage_index, "add month rejected: stage index out of range");
        return None;
    };

    let mut timeline = build_month_timeline(schedule)?;
    let mut lengths = stage_lengths(&timeline);
    lengths[stage_index] += 1;

    // The tag of the appended month is irrelevant: repartition reassigns it.
    let tail = next_month(timeline.last()?.month)?;
    timeline.push(MonthEntry { month: tail, stage });

    let result = serialize_runs(&repartition(&timeline, &lengths)?);
    debug!(stage = %stage, months = lengths[stage_index], "month added");
    result
}

/// Take one month away from the stage at `stage_index`.
///
/// Later stages move one month earlier; the plan shrinks by one month.
/// Returns `None` for an index outside `0..5`, a schedule that cannot be
/// flattened, or a stage that is down to its last month.
pub fn remove_month_from_stage(schedule: &[StageRange], stage_index: usize) -> Option<Schedule> {
    let Some(stage) = Stage::from_index(stage_index) else {
        debug!(stage_index, "remove month rejected: stage index out of range");
        return None;
    };

    let mut timeline = build_month_timeline(schedule)?;
    let mut lengths = stage_lengths(&timeline);
    if lengths[stage_index] <= 1 {
        debug!(stage = %stage, "remove month rejected: stage has a single month");
        return None;
    }
    lengths[stage_index] -= 1;
    timeline.pop();

    let result = serialize_runs(&repartition(&timeline, &lengths)?);
    debug!(stage = %stage, months = lengths[stage_index], "month removed");
    result
}
