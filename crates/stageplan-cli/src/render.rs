//! Plain-text rendering of plans and schedules.

use std::fmt::Write as _;

use chrono::NaiveDate;

use stageplan_core::StageRange;
use stageplan_core::view::{build_stage_cards, plan_bounds};
use stageplan_store::models::{Plan, StageProgress};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn month_label(month: NaiveDate, format: &str) -> String {
    month.format(format).to_string()
}

/// Header block for one plan.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan: {}", plan.display_name());
    let _ = writeln!(out, "  ID:           {}", plan.id);
    let _ = writeln!(out, "  Status:       {}", plan.status);
    if let Some(stage) = plan.active_stage {
        let _ = writeln!(out, "  Active stage: {}", stage.label());
    }
    let _ = writeln!(out, "  Version:      {}", plan.version);
    let _ = writeln!(
        out,
        "  Created:      {}",
        plan.created_at.format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(
        out,
        "  Updated:      {}",
        plan.updated_at.format(TIMESTAMP_FORMAT)
    );
    if let Some(finalized) = plan.finalized_at {
        let _ = writeln!(out, "  Finalized:    {}", finalized.format(TIMESTAMP_FORMAT));
    }
    out
}

/// Actual start and completion times per stage.
pub fn render_progress(progress: &[StageProgress]) -> String {
    let stamp = |at: Option<chrono::DateTime<chrono::Utc>>| {
        at.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<15} {:<12} {:<24} COMPLETED",
        "STAGE", "STATUS", "STARTED"
    );
    for row in progress {
        let _ = writeln!(
            out,
            "  {:<15} {:<12} {:<24} {}",
            row.stage.label(),
            row.status.to_string(),
            stamp(row.actual_started_at),
            stamp(row.actual_completed_at)
        );
    }
    out
}

/// Stage table for a schedule.
///
/// A schedule that cannot be laid out month by month is shown as its raw
/// ranges instead.
pub fn render_schedule(schedule: &[StageRange], month_format: &str) -> String {
    let mut out = String::new();
    if schedule.is_empty() {
        out.push_str("No schedule yet.\n");
        return out;
    }

    let cards = build_stage_cards(schedule);
    let Some(bounds) = plan_bounds(schedule) else {
        out.push_str("Schedule cannot be laid out month by month. Raw ranges:\n");
        for range in schedule {
            let _ = writeln!(
                out,
                "  {:<15} {}  {}",
                range.stage.label(),
                range.planned_starts_on,
                range.planned_ends_on
            );
        }
        return out;
    };

    let _ = writeln!(
        out,
        "Schedule: {} to {} ({} months)",
        month_label(bounds.starts_on, month_format),
        month_label(bounds.ends_on, month_format),
        bounds.total_months
    );
    out.push('\n');
    let _ = writeln!(
        out,
        "  #  {:<15} {:<11} {:<11} {:>6}  MONTHS",
        "STAGE", "START", "END", "COUNT"
    );

    for card in &cards {
        let labels: Vec<String> = card
            .months
            .iter()
            .map(|m| month_label(*m, month_format))
            .collect();
        let marker = if card.can_remove_month { " " } else { "*" };
        let _ = writeln!(
            out,
            "  {}  {:<15} {:<11} {:<11} {:>5}{}  {}",
            card.stage.index(),
            card.stage.label(),
            card.starts_on.to_string(),
            card.ends_on.to_string(),
            card.month_count,
            marker,
            labels.join(", ")
        );
    }

    if cards.iter().any(|c| !c.can_remove_month) {
        out.push_str("\n  * single month; cannot be shortened\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use stageplan_test_utils::{base_schedule, schedule_from_lengths};

    use super::*;

    #[test]
    fn schedule_table_lists_every_stage() {
        let text = render_schedule(&base_schedule(), "%b %Y");
        assert!(text.starts_with("Schedule: Feb 2026 to Nov 2026 (10 months)"));
        for stage in ["Analysis", "Design", "Development", "Implementation", "Evaluation"] {
            assert!(text.contains(stage), "missing {stage} in:\n{text}");
        }
        assert!(text.contains("Oct 2026, Nov 2026"));
        assert!(!text.contains("cannot be shortened"));
    }

    #[test]
    fn single_month_stage_is_marked() {
        let text = render_schedule(&schedule_from_lengths(2026, 2, [1, 2, 2, 2, 2]), "%Y-%m");
        assert!(text.contains("    1*  2026-02"), "unexpected table:\n{text}");
        assert!(text.contains("cannot be shortened"));
    }

    #[test]
    fn broken_schedule_falls_back_to_raw_ranges() {
        let mut ranges = base_schedule();
        ranges.remove(2);
        let text = render_schedule(&ranges, "%b %Y");
        assert!(text.starts_with("Schedule cannot be laid out"));
        assert!(text.contains("2026-08-01"));
    }

    #[test]
    fn empty_schedule() {
        assert_eq!(render_schedule(&[], "%b %Y"), "No schedule yet.\n");
    }

    #[test]
    fn progress_table_shows_status_and_times() {
        let mut progress = StageProgress::initial();
        let started = chrono::DateTime::parse_from_rfc3339("2026-02-02T09:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        progress[0].begin(started);

        let text = render_progress(&progress);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("Analysis"));
        assert!(lines[1].contains("in_progress"));
        assert!(lines[1].contains("2026-02-02 09:00:00 UTC"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains("not_started"));
    }

    #[test]
    fn plan_header_shows_name_and_status() {
        let plan = Plan::new(Some("Biology 101".into()));
        let text = render_plan(&plan);
        assert!(text.starts_with("Plan: Biology 101\n"));
        assert!(text.contains("Status:       draft"));
        assert!(!text.contains("Finalized"));
    }
}
