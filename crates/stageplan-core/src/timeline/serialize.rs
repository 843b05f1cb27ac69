//! Stage range serializer: partitioned month runs back to stage ranges.

use stageplan_store::models::{Stage, StageRange};

use super::{MonthEntry, month_end, stage_lengths};
use crate::schedule::Schedule;

/// A consecutive slice of the timeline assigned to one stage.
///
/// The stage comes from the partition, not from the entries' own tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRun<'a> {
    pub stage: Stage,
    pub months: &'a [MonthEntry],
}

/// Split `timeline` into five consecutive runs, `lengths[i]` months each,
/// in stage order.
///
/// Returns `None` unless the lengths sum to exactly the timeline length.
pub fn repartition<'a>(
    timeline: &'a [MonthEntry],
    lengths: &[usize; Stage::COUNT],
) -> Option<Vec<StageRun<'a>>> {
    let mut rest = timeline;
    let mut runs = Vec::with_capacity(Stage::COUNT);

    for (stage, &len) in Stage::ORDER.into_iter().zip(lengths) {
        if len > rest.len() {
            return None;
        }
        let (months, tail) = rest.split_at(len);
        runs.push(StageRun { stage, months });
        rest = tail;
    }

    rest.is_empty().then_some(runs)
}

/// Partition a timeline using the month counts it already carries.
pub fn partition_timeline(timeline: &[MonthEntry]) -> Option<Vec<StageRun<'_>>> {
    repartition(timeline, &stage_lengths(timeline))
}

/// Emit one range per run: first day of its first month through last day of
/// its last month.
///
/// Returns `None` if there are not exactly five runs or any run is empty.
pub fn serialize_runs(runs: &[StageRun<'_>]) -> Option<Schedule> {
    if runs.len() != Stage::COUNT {
        return None;
    }

    let mut stages = Vec::with_capacity(Stage::COUNT);
    for run in runs {
        let first = run.months.first()?;
        let last = run.months.last()?;
        stages.push(StageRange::new(run.stage, first.month, month_end(last.month)?));
    }

    Some(Schedule::new(stages))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn months(start_month: u32, tags: &[Stage]) -> Vec<MonthEntry> {
        tags.iter()
            .enumerate()
            .map(|(i, stage)| MonthEntry {
                month: NaiveDate::from_ymd_opt(2026, start_month + i as u32, 1).unwrap(),
                stage: *stage,
            })
            .collect()
    }

    #[test]
    fn repartition_ignores_entry_tags() {
        let timeline = months(1, &[Stage::Evaluation; 6]);
        let runs = repartition(&timeline, &[2, 1, 1, 1, 1]).unwrap();
        assert_eq!(runs.len(), 5);
        assert_eq!(runs[0].stage, Stage::Analysis);
        assert_eq!(runs[0].months.len(), 2);
        assert_eq!(runs[4].stage, Stage::Evaluation);
        assert_eq!(
            runs[4].months[0].month,
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
        );
    }

    #[test]
    fn repartition_requires_exact_total() {
        let timeline = months(1, &[Stage::Analysis; 5]);
        assert!(repartition(&timeline, &[1, 1, 1, 1, 2]).is_none());
        assert!(repartition(&timeline, &[1, 1, 1, 1, 0]).is_none());
    }

    #[test]
    fn serialize_uses_calendar_month_ends() {
        let timeline = months(
            1,
            &[
                Stage::Analysis,
                Stage::Analysis,
                Stage::Design,
                Stage::Development,
                Stage::Implementation,
                Stage::Evaluation,
            ],
        );
        let runs = partition_timeline(&timeline).unwrap();
        let schedule = serialize_runs(&runs).unwrap();
        let date = |m, d| NaiveDate::from_ymd_opt(2026, m, d).unwrap();

        assert_eq!(
            schedule.stages(),
            &[
                StageRange::new(Stage::Analysis, date(1, 1), date(2, 28)),
                StageRange::new(Stage::Design, date(3, 1), date(3, 31)),
                StageRange::new(Stage::Development, date(4, 1), date(4, 30)),
                StageRange::new(Stage::Implementation, date(5, 1), date(5, 31)),
                StageRange::new(Stage::Evaluation, date(6, 1), date(6, 30)),
            ]
        );
    }

    #[test]
    fn empty_run_fails() {
        let timeline = months(1, &[Stage::Analysis; 4]);
        let runs = repartition(&timeline, &[1, 1, 0, 1, 1]).unwrap();
        assert!(serialize_runs(&runs).is_none());
    }

    #[test]
    fn wrong_run_count_fails() {
        let timeline = months(1, &[Stage::Analysis; 2]);
        let runs = vec![
            StageRun {
                stage: Stage::Analysis,
                months: &timeline[..1],
            },
            StageRun {
                stage: Stage::Design,
                months: &timeline[1..],
            },
        ];
        assert!(serialize_runs(&runs).is_none());
    }
}
