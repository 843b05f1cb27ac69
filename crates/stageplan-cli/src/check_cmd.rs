//! `stageplan check` command: validate a schedule file without a store.

use std::path::Path;

use anyhow::{Context, Result, bail};

use stageplan_core::schedule::{parse_schedule_file, validate_for_save};

use crate::render::render_schedule;

/// Parse `file`, print its stage table, and fail on the first rule it breaks.
pub fn run_check(file: &Path, month_format: &str) -> Result<()> {
    let schedule = parse_schedule_file(file)
        .with_context(|| format!("failed to load schedule from {}", file.display()))?;

    print!("{}", render_schedule(&schedule, month_format));

    if let Err(issue) = validate_for_save(&schedule) {
        bail!("{} is invalid: {issue}", file.display());
    }
    println!();
    println!("{} is valid.", file.display());
    Ok(())
}
