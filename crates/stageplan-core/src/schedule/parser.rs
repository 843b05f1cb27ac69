//! Schedule file parser.
//!
//! Accepts two on-disk shapes:
//! - JSON: a bare array of `{ stage, planned_starts_on, planned_ends_on }`.
//! - TOML: a `[[stages]]` array of tables with the same keys. Dates must be
//!   quoted strings (`planned_starts_on = "2026-02-01"`).
//!
//! Parsing checks shape only. Run [`super::validate_schedule`] on the result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stageplan_store::models::StageRange;

use super::Schedule;

/// Errors that can occur while reading a schedule file.
#[derive(Debug, Error)]
pub enum ScheduleParseError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("unsupported schedule file extension {0:?} (expected json or toml)")]
    UnsupportedExtension(String),

    #[error("failed to read schedule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// TOML wrapper: a top-level array needs a key.
#[derive(Debug, Serialize, Deserialize)]
struct ScheduleToml {
    #[serde(default)]
    stages: Vec<StageRange>,
}

/// Parse a JSON schedule array.
pub fn parse_schedule_json(content: &str) -> Result<Schedule, ScheduleParseError> {
    let stages: Vec<StageRange> = serde_json::from_str(content)?;
    Ok(Schedule::new(stages))
}

/// Parse a TOML schedule with `[[stages]]` tables.
pub fn parse_schedule_toml(content: &str) -> Result<Schedule, ScheduleParseError> {
    let file: ScheduleToml = toml::from_str(content)?;
    Ok(Schedule::new(file.stages))
}

/// Read and parse a schedule file, picking the format from its extension.
pub fn parse_schedule_file(path: &Path) -> Result<Schedule, ScheduleParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let parse: fn(&str) -> Result<Schedule, ScheduleParseError> = match ext.as_str() {
        "json" => parse_schedule_json,
        "toml" => parse_schedule_toml,
        _ => return Err(ScheduleParseError::UnsupportedExtension(ext)),
    };

    let content = std::fs::read_to_string(path).map_err(|source| ScheduleParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Render a schedule in the TOML file shape.
pub fn schedule_to_toml(schedule: &Schedule) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&ScheduleToml {
        stages: schedule.stages().to_vec(),
    })
}
