//! CLI handlers for `stageplan schedule` subcommands.

use std::path::Path;

use anyhow::{Context, Result, bail};

use stageplan_core::Stage;
use stageplan_core::repository::{EditOutcome, MonthEdit};
use stageplan_core::schedule::{Schedule, parse_schedule_file, schedule_to_toml, validate_for_save};
use stageplan_core::view::build_stage_cards;

use crate::ScheduleCommands;
use crate::render::render_schedule;
use crate::resolve::parse_stage_index;
use crate::session::Session;

/// Dispatch a `ScheduleCommands` variant to the appropriate handler.
pub fn run_schedule_command(
    command: ScheduleCommands,
    session: &Session,
    month_format: &str,
) -> Result<()> {
    match command {
        ScheduleCommands::Set {
            plan_id,
            file,
            name,
        } => cmd_set(session, &plan_id, Path::new(&file), name, month_format),
        ScheduleCommands::Show { plan_id, json } => cmd_show(session, &plan_id, json, month_format),
        ScheduleCommands::AddMonth {
            plan_id,
            stage,
            expected_version,
        } => cmd_edit(
            session,
            &plan_id,
            &stage,
            MonthEdit::Add,
            expected_version,
            month_format,
        ),
        ScheduleCommands::RemoveMonth {
            plan_id,
            stage,
            expected_version,
        } => cmd_edit(
            session,
            &plan_id,
            &stage,
            MonthEdit::Remove,
            expected_version,
            month_format,
        ),
        ScheduleCommands::Validate { plan_id, json } => cmd_validate(session, &plan_id, json),
        ScheduleCommands::Export { plan_id, output } => {
            cmd_export(session, &plan_id, output.as_deref())
        }
    }
}

// -----------------------------------------------------------------------
// stageplan schedule set <plan-id> <file>
// -----------------------------------------------------------------------

fn cmd_set(
    session: &Session,
    plan_id: &str,
    file: &Path,
    name: Option<String>,
    month_format: &str,
) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let schedule = parse_schedule_file(file)
        .with_context(|| format!("failed to load schedule from {}", file.display()))?;

    let plan = session.repo.save_schedule(id, name, schedule)?;
    session.save()?;

    println!(
        "Schedule saved for plan {} (status {}, version {}).",
        plan.id, plan.status, plan.version
    );
    println!();
    print!("{}", render_schedule(&session.repo.schedule(id)?, month_format));
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan schedule show <plan-id>
// -----------------------------------------------------------------------

fn cmd_show(session: &Session, plan_id: &str, json: bool, month_format: &str) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let schedule = session.repo.schedule(id)?;

    if json {
        let cards = build_stage_cards(&schedule);
        println!(
            "{}",
            serde_json::to_string_pretty(&cards).context("failed to serialize stage cards")?
        );
    } else {
        print!("{}", render_schedule(&schedule, month_format));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan schedule add-month / remove-month <plan-id> <stage>
// -----------------------------------------------------------------------

fn cmd_edit(
    session: &Session,
    plan_id: &str,
    stage: &str,
    edit: MonthEdit,
    expected_version: Option<u64>,
    month_format: &str,
) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let stage_index = parse_stage_index(stage)?;

    match session
        .repo
        .edit_month(id, stage_index, edit, expected_version)?
    {
        EditOutcome::Applied(schedule) => {
            session.save()?;
            let version = session.repo.get(id)?.version;
            println!("Schedule updated (version {version}).");
            println!();
            print!("{}", render_schedule(&schedule, month_format));
        }
        EditOutcome::Rejected => {
            let cards = build_stage_cards(&session.repo.schedule(id)?);
            let reason = match Stage::from_index(stage_index) {
                None => format!("stage index {stage_index} is out of range (0-4)"),
                Some(_) if cards.is_empty() => {
                    "the schedule is missing or cannot be laid out month by month".to_string()
                }
                Some(stage) if edit == MonthEdit::Remove => {
                    format!("{} is down to a single month", stage.label())
                }
                Some(_) => "the schedule would run past the supported date range".to_string(),
            };
            println!("No change: {reason}.");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan schedule validate <plan-id>
// -----------------------------------------------------------------------

fn cmd_validate(session: &Session, plan_id: &str, json: bool) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let schedule = session.repo.schedule(id)?;
    if schedule.is_empty() {
        bail!("plan {id} has no schedule yet");
    }

    let result = validate_for_save(&schedule);
    if json {
        let value = match &result {
            Ok(()) => serde_json::json!({ "valid": true }),
            Err(issue) => serde_json::json!({ "valid": false, "issue": issue }),
        };
        println!("{value}");
    }

    match result {
        Ok(()) => {
            if !json {
                println!("Schedule is valid.");
            }
            Ok(())
        }
        Err(issue) => bail!("schedule is invalid: {issue}"),
    }
}

// -----------------------------------------------------------------------
// stageplan schedule export <plan-id>
// -----------------------------------------------------------------------

/// Write the stored schedule as a file `schedule set` can read back. The
/// output extension picks JSON or TOML; stdout gets TOML.
fn cmd_export(session: &Session, plan_id: &str, output: Option<&str>) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let schedule = session.repo.schedule(id)?;
    if schedule.is_empty() {
        bail!("plan {id} has no schedule yet");
    }

    match output {
        Some(path) => {
            let path = Path::new(path);
            let contents = render_export(&schedule, path)?;
            std::fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Schedule for plan {id} written to {}", path.display());
        }
        None => print!("{}", schedule_to_toml(&schedule).context("failed to render TOML")?),
    }
    Ok(())
}

fn render_export(schedule: &Schedule, path: &Path) -> Result<String> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let mut out =
            serde_json::to_string_pretty(schedule).context("failed to render JSON")?;
        out.push('\n');
        Ok(out)
    } else {
        schedule_to_toml(schedule).context("failed to render TOML")
    }
}
