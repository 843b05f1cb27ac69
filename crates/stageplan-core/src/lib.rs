//! Stage schedule engine for five-phase course design plans.
//!
//! A schedule assigns each [`Stage`] a contiguous range of calendar months.
//! Edits work on a flattened month timeline: add or remove one month on a
//! stage, then re-partition so that later stages shift and the schedule stays
//! contiguous.

pub mod repository;
pub mod schedule;
pub mod state;
pub mod timeline;
pub mod view;

pub use stageplan_store::models::{Stage, StageRange};

pub use schedule::{Schedule, ValidationIssue, validate_schedule};
pub use timeline::{MonthEntry, add_month_to_stage, build_month_timeline, remove_month_from_stage};
