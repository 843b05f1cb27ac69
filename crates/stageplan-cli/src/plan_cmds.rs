//! CLI handlers for `stageplan plan` subcommands.
//!
//! Implements:
//! - `stageplan plan create [--name N]` -- create an empty draft plan
//! - `stageplan plan list [--status S]` -- list plans, optionally by status
//! - `stageplan plan show <plan-id>`    -- plan details and schedule
//! - `stageplan plan finalize|start|advance|archive <plan-id>` -- lifecycle
//! - `stageplan plan extend <plan-id> <stage> [--months N]` -- lengthen a started stage
//! - `stageplan plan events <plan-id>`  -- event log

use anyhow::Result;

use stageplan_core::repository::EditOutcome;
use stageplan_store::models::{Plan, PlanStatus, Stage, StageStatus};

use crate::PlanCommands;
use crate::render::{render_plan, render_progress, render_schedule};
use crate::session::Session;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub fn run_plan_command(command: PlanCommands, session: &Session, month_format: &str) -> Result<()> {
    match command {
        PlanCommands::Create { name } => cmd_create(session, name),
        PlanCommands::List { status } => cmd_list(session, status),
        PlanCommands::Show { plan_id } => cmd_show(session, &plan_id, month_format),
        PlanCommands::Finalize { plan_id } => {
            let plan = session.repo.finalize(session.plan_id(&plan_id)?)?;
            session.save()?;
            println!("Plan {} finalized; ready to start.", plan.id);
            Ok(())
        }
        PlanCommands::Start { plan_id } => {
            let plan = session.repo.start(session.plan_id(&plan_id)?)?;
            session.save()?;
            print_active_stage(&plan, "started");
            Ok(())
        }
        PlanCommands::Advance { plan_id } => {
            let plan = session.repo.advance_stage(session.plan_id(&plan_id)?)?;
            session.save()?;
            print_active_stage(&plan, "advanced");
            Ok(())
        }
        PlanCommands::Extend {
            plan_id,
            stage,
            months,
            expected_version,
        } => cmd_extend(session, &plan_id, stage, months, expected_version, month_format),
        PlanCommands::Archive { plan_id } => {
            let plan = session.repo.archive(session.plan_id(&plan_id)?)?;
            session.save()?;
            println!("Plan {} archived.", plan.id);
            Ok(())
        }
        PlanCommands::Events { plan_id } => cmd_events(session, &plan_id),
    }
}

// -----------------------------------------------------------------------
// stageplan plan create
// -----------------------------------------------------------------------

fn cmd_create(session: &Session, name: Option<String>) -> Result<()> {
    let plan = session.repo.create_plan(name);
    session.save()?;

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:  {}", plan.id);
    println!("  Name:     {}", plan.display_name());
    println!("  Status:   {}", plan.status);
    println!();
    println!(
        "Next: run `stageplan schedule set {} <file>` to give it a schedule.",
        short_id(&plan)
    );
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan plan list
// -----------------------------------------------------------------------

fn cmd_list(session: &Session, status: Option<PlanStatus>) -> Result<()> {
    let plans: Vec<Plan> = session
        .repo
        .list()
        .into_iter()
        .filter(|p| status.is_none_or(|s| p.status == s))
        .collect();

    if plans.is_empty() {
        match status {
            Some(status) => println!("No {status} plans found."),
            None => println!("No plans found. Use `stageplan plan create` to create one."),
        }
        return Ok(());
    }

    // Status max is 14 (ready_to_start).
    let id_w = 36;
    let name_w = plans
        .iter()
        .map(|p| p.display_name().len())
        .max()
        .unwrap_or(4)
        .max(4);
    let status_w = 14;

    println!(
        "{:<id_w$}  {:<name_w$}  {:<status_w$}  CREATED",
        "ID", "NAME", "STATUS",
    );
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<name_w$}  {:<status_w$}  {}",
            plan.id.to_string(),
            plan.display_name(),
            plan.status.to_string(),
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan plan show <plan-id>
// -----------------------------------------------------------------------

fn cmd_show(session: &Session, plan_id: &str, month_format: &str) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let plan = session.repo.get(id)?;
    let schedule = session.repo.schedule(id)?;
    let progress = session.repo.progress(id)?;

    print!("{}", render_plan(&plan));
    println!();
    print!("{}", render_schedule(&schedule, month_format));
    if progress.iter().any(|p| p.status != StageStatus::NotStarted) {
        println!();
        print!("{}", render_progress(&progress));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan plan extend <plan-id> <stage>
// -----------------------------------------------------------------------

fn cmd_extend(
    session: &Session,
    plan_id: &str,
    stage: Stage,
    months: u32,
    expected_version: Option<u64>,
    month_format: &str,
) -> Result<()> {
    let id = session.plan_id(plan_id)?;

    match session.repo.extend_stage(id, stage, months, expected_version)? {
        EditOutcome::Applied(schedule) => {
            session.save()?;
            let version = session.repo.get(id)?.version;
            println!(
                "{} extended by {months} month(s) (version {version}).",
                stage.label()
            );
            println!();
            print!("{}", render_schedule(&schedule, month_format));
        }
        EditOutcome::Rejected => {
            println!(
                "No change: {} cannot be extended by {months} month(s).",
                stage.label()
            );
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// stageplan plan events <plan-id>
// -----------------------------------------------------------------------

fn cmd_events(session: &Session, plan_id: &str) -> Result<()> {
    let id = session.plan_id(plan_id)?;
    let events = session.repo.events(id)?;

    if events.is_empty() {
        println!("No events recorded for plan {id}.");
        return Ok(());
    }

    for event in &events {
        let stage = event.stage.map(|s| s.label()).unwrap_or("-");
        println!(
            "{}  {:<18}  {:<14}  {}",
            event.at.format("%Y-%m-%d %H:%M:%S"),
            event.kind.to_string(),
            stage,
            event.payload
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn print_active_stage(plan: &Plan, verb: &str) {
    match plan.active_stage {
        Some(stage) => println!("Plan {} {verb}; active stage: {}.", plan.id, stage.label()),
        None => println!("Plan {} is {}.", plan.id, plan.status),
    }
}

/// First block of the hyphenated id; enough to address a plan in practice.
fn short_id(plan: &Plan) -> String {
    plan.id.to_string().chars().take(8).collect()
}
