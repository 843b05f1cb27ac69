//! Schedule validation.
//!
//! [`validate_schedule`] checks, in order, and stops at the first failure:
//! 1. The schedule has exactly 5 ranges.
//! 2. Every range starts on or before its end.
//! 3. Every range after the first starts the day after its predecessor ends.
//!
//! Persisting a schedule additionally requires the ranges to be in stage
//! order, see [`validate_for_save`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stageplan_store::models::{Stage, StageRange};

/// The first rule a schedule breaks.
///
/// Serialized with a `code` tag (`stage_count`, `invalid_range`,
/// `non_contiguous`, `stage_out_of_order`); `Display` gives the user-facing
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[serde(rename = "stage_count")]
    #[error("schedule must contain exactly 5 stages (found {actual})")]
    StageCountMismatch { actual: usize },

    #[error("stage {stage} starts after it ends")]
    InvalidRange { stage: Stage },

    #[error(
        "stage {stage} must start on {expected_start}, the day after the previous stage ends \
         (starts on {actual_start}); stages may not have gaps or overlaps"
    )]
    NonContiguous {
        stage: Stage,
        expected_start: NaiveDate,
        actual_start: NaiveDate,
    },

    #[error("position {position} must hold stage {expected} (found {actual})")]
    StageOutOfOrder {
        position: usize,
        expected: Stage,
        actual: Stage,
    },
}

/// Check count, per-range ordering and contiguity. `None` means valid.
///
/// Never returns [`ValidationIssue::StageOutOfOrder`].
pub fn validate_schedule(ranges: &[StageRange]) -> Option<ValidationIssue> {
    if ranges.len() != Stage::COUNT {
        return Some(ValidationIssue::StageCountMismatch {
            actual: ranges.len(),
        });
    }

    if let Some(bad) = ranges
        .iter()
        .find(|r| r.planned_starts_on > r.planned_ends_on)
    {
        return Some(ValidationIssue::InvalidRange { stage: bad.stage });
    }

    for pair in ranges.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        // The day after NaiveDate::MAX does not exist; nothing can follow it.
        let expected_start = prev.planned_ends_on.succ_opt();
        if expected_start != Some(next.planned_starts_on) {
            return Some(ValidationIssue::NonContiguous {
                stage: next.stage,
                expected_start: expected_start.unwrap_or(prev.planned_ends_on),
                actual_start: next.planned_starts_on,
            });
        }
    }

    None
}

/// Check that position `i` holds `Stage::ORDER[i]`.
pub fn validate_stage_order(ranges: &[StageRange]) -> Option<ValidationIssue> {
    ranges
        .iter()
        .zip(Stage::ORDER)
        .enumerate()
        .find(|(_, (range, expected))| range.stage != *expected)
        .map(|(position, (range, expected))| ValidationIssue::StageOutOfOrder {
            position,
            expected,
            actual: range.stage,
        })
}

/// Everything a schedule must satisfy before it is stored.
pub fn validate_for_save(ranges: &[StageRange]) -> Result<(), ValidationIssue> {
    match validate_schedule(ranges).or_else(|| validate_stage_order(ranges)) {
        Some(issue) => Err(issue),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Feb 2026 start, two months per stage.
    fn base() -> Vec<StageRange> {
        vec![
            StageRange::new(Stage::Analysis, date(2026, 2, 1), date(2026, 3, 31)),
            StageRange::new(Stage::Design, date(2026, 4, 1), date(2026, 5, 31)),
            StageRange::new(Stage::Development, date(2026, 6, 1), date(2026, 7, 31)),
            StageRange::new(Stage::Implementation, date(2026, 8, 1), date(2026, 9, 30)),
            StageRange::new(Stage::Evaluation, date(2026, 10, 1), date(2026, 11, 30)),
        ]
    }

    #[test]
    fn valid_schedule_has_no_issue() {
        assert_eq!(validate_schedule(&base()), None);
        assert_eq!(validate_for_save(&base()), Ok(()));
    }

    #[test]
    fn count_is_checked_first() {
        let mut ranges = base();
        ranges.pop();
        // Also make a range invalid: count still wins.
        ranges[0].planned_starts_on = date(2026, 4, 1);
        assert_eq!(
            validate_schedule(&ranges),
            Some(ValidationIssue::StageCountMismatch { actual: 4 })
        );
        assert_eq!(
            validate_schedule(&[]),
            Some(ValidationIssue::StageCountMismatch { actual: 0 })
        );
    }

    #[test]
    fn inverted_range_reports_first_offender() {
        let mut ranges = base();
        ranges[2].planned_starts_on = date(2026, 8, 1);
        ranges[4].planned_starts_on = date(2026, 12, 1);
        assert_eq!(
            validate_schedule(&ranges),
            Some(ValidationIssue::InvalidRange {
                stage: Stage::Development
            })
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        let mut ranges = base();
        ranges[0].planned_ends_on = ranges[0].planned_starts_on;
        ranges[1].planned_starts_on = date(2026, 2, 2);
        assert_eq!(validate_schedule(&ranges), None);
    }

    #[test]
    fn gap_reports_expected_and_actual_start() {
        let mut ranges = base();
        ranges[3].planned_starts_on = date(2026, 8, 2);
        assert_eq!(
            validate_schedule(&ranges),
            Some(ValidationIssue::NonContiguous {
                stage: Stage::Implementation,
                expected_start: date(2026, 8, 1),
                actual_start: date(2026, 8, 2),
            })
        );
    }

    #[test]
    fn overlap_is_non_contiguous() {
        let mut ranges = base();
        ranges[1].planned_starts_on = date(2026, 3, 1);
        assert_eq!(
            validate_schedule(&ranges),
            Some(ValidationIssue::NonContiguous {
                stage: Stage::Design,
                expected_start: date(2026, 4, 1),
                actual_start: date(2026, 3, 1),
            })
        );
    }

    #[test]
    fn range_check_precedes_contiguity() {
        let mut ranges = base();
        ranges[1].planned_starts_on = date(2026, 3, 1);
        ranges[4].planned_ends_on = date(2026, 9, 1);
        assert_eq!(
            validate_schedule(&ranges),
            Some(ValidationIssue::InvalidRange {
                stage: Stage::Evaluation
            })
        );
    }

    #[test]
    fn stage_order_is_only_checked_for_save() {
        let mut ranges = base();
        ranges[0].stage = Stage::Design;
        ranges[1].stage = Stage::Analysis;
        assert_eq!(validate_schedule(&ranges), None);
        assert_eq!(
            validate_for_save(&ranges),
            Err(ValidationIssue::StageOutOfOrder {
                position: 0,
                expected: Stage::Analysis,
                actual: Stage::Design,
            })
        );
    }

    #[test]
    fn issue_serializes_with_code_tag() {
        let value =
            serde_json::to_value(ValidationIssue::StageCountMismatch { actual: 3 }).unwrap();
        assert_eq!(value, serde_json::json!({ "code": "stage_count", "actual": 3 }));

        let value = serde_json::to_value(ValidationIssue::InvalidRange {
            stage: Stage::Design,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "code": "invalid_range", "stage": "Design" })
        );
    }

    #[test]
    fn messages_name_the_rule() {
        assert_eq!(
            ValidationIssue::StageCountMismatch { actual: 4 }.to_string(),
            "schedule must contain exactly 5 stages (found 4)"
        );
        assert_eq!(
            ValidationIssue::InvalidRange {
                stage: Stage::Evaluation
            }
            .to_string(),
            "stage evaluation starts after it ends"
        );
    }
}
