//! Schedules: the value type, file parsing, and validation.

pub mod parser;
pub mod validate;

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use stageplan_store::models::{Stage, StageRange};

pub use parser::{
    ScheduleParseError, parse_schedule_file, parse_schedule_json, parse_schedule_toml,
    schedule_to_toml,
};
pub use validate::{ValidationIssue, validate_for_save, validate_schedule, validate_stage_order};

/// An immutable snapshot of a plan's stage ranges.
///
/// A well-formed schedule holds exactly one [`StageRange`] per [`Stage`] in
/// canonical order, with no gaps or overlaps between neighbours. The type
/// does not enforce that: it also carries raw input so the validator can
/// report what is wrong with it. Serializes as a bare array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(Vec<StageRange>);

impl Schedule {
    pub fn new(stages: Vec<StageRange>) -> Self {
        Self(stages)
    }

    pub fn stages(&self) -> &[StageRange] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<StageRange> {
        self.0
    }
}

impl Deref for Schedule {
    type Target = [StageRange];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
