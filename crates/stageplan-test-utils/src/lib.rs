//! Shared fixtures for stageplan integration tests.
//!
//! Fixtures build plain `Vec<StageRange>` values so that every crate in the
//! workspace can use them without pulling in the engine itself.

use chrono::{Datelike, Months, NaiveDate};
use tempfile::TempDir;

use stageplan_store::config::StoreConfig;
use stageplan_store::models::{Stage, StageRange};

/// First day of the given month. Panics on an impossible month.
pub fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| panic!("invalid month {year}-{month:02}"))
}

/// Last calendar day of the month containing `date`.
pub fn last_day(date: NaiveDate) -> NaiveDate {
    let first = month(date.year(), date.month());
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .expect("month end out of range")
}

/// A stage covering whole months `start` through `end`, inclusive.
pub fn range(stage: Stage, start: (i32, u32), end: (i32, u32)) -> StageRange {
    StageRange::new(
        stage,
        month(start.0, start.1),
        last_day(month(end.0, end.1)),
    )
}

/// A contiguous five-stage schedule starting at `year`-`start_month`, with
/// `lengths[i]` months for the i-th stage.
pub fn schedule_from_lengths(
    year: i32,
    start_month: u32,
    lengths: [u32; Stage::COUNT],
) -> Vec<StageRange> {
    let mut cursor = month(year, start_month);
    Stage::ORDER
        .into_iter()
        .zip(lengths)
        .map(|(stage, len)| {
            assert!(len > 0, "stage {stage} needs at least one month");
            let last = cursor + Months::new(len - 1);
            let range = StageRange::new(stage, cursor, last_day(last));
            cursor = cursor + Months::new(len);
            range
        })
        .collect()
}

/// Two months per stage from February 2026 through November 2026.
pub fn base_schedule() -> Vec<StageRange> {
    schedule_from_lengths(2026, 2, [2; Stage::COUNT])
}

/// A scratch directory plus a store config pointing inside it. Keep the
/// `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (TempDir, StoreConfig) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = StoreConfig::new(dir.path().join("plans.json"));
    (dir, config)
}
