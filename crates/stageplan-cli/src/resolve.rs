//! Argument resolution for plan ids and stages.
//!
//! - [`resolve_plan_id`] accepts a full UUID or an unambiguous prefix of
//!   one of the stored plans' ids.
//! - [`parse_stage_index`] accepts a stage name or a numeric index.

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use stageplan_core::Stage;
use stageplan_store::models::Plan;

/// Resolve `input` to the id of one of `plans`.
///
/// A well-formed UUID is returned as-is, even if no such plan exists; the
/// repository reports that. Anything else is matched case-insensitively as
/// a prefix of the hyphenated ids.
pub fn resolve_plan_id(input: &str, plans: &[Plan]) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let prefix = input.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        bail!("plan ID must not be empty");
    }

    let matches: Vec<Uuid> = plans
        .iter()
        .map(|p| p.id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no plan matches ID {input:?}"),
        many => bail!(
            "plan ID prefix {input:?} is ambiguous ({} plans match)",
            many.len()
        ),
    }
}

/// Turn a stage argument into a stage index.
///
/// Numbers pass through unchecked so that an out-of-range index reaches the
/// edit, which rejects it. Names map to their position in stage order.
pub fn parse_stage_index(input: &str) -> Result<usize> {
    if let Ok(index) = input.parse::<usize>() {
        return Ok(index);
    }
    let stage: Stage = input
        .parse()
        .with_context(|| format!("expected a stage name or an index 0-4, got {input:?}"))?;
    Ok(stage.index())
}
