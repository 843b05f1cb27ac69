//! Integration tests for the JSON store snapshot.
//!
//! Each test writes into its own temporary directory.

use chrono::NaiveDate;
use serde_json::json;

use stageplan_store::file::{StoreSnapshot, StoredPlan, load_snapshot, save_snapshot};
use stageplan_store::models::{
    Plan, PlanEvent, PlanEventKind, PlanStatus, Stage, StageProgress, StageRange, StageStatus,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_plan() -> StoredPlan {
    let mut plan = Plan::new(Some("Data Structures".into()));
    plan.status = PlanStatus::Scheduling;
    plan.version = 3;

    StoredPlan {
        plan,
        stages: vec![
            StageRange::new(Stage::Analysis, date(2026, 2, 1), date(2026, 2, 28)),
            StageRange::new(Stage::Design, date(2026, 3, 1), date(2026, 4, 30)),
            StageRange::new(Stage::Development, date(2026, 5, 1), date(2026, 7, 31)),
            StageRange::new(Stage::Implementation, date(2026, 8, 1), date(2026, 9, 30)),
            StageRange::new(Stage::Evaluation, date(2026, 10, 1), date(2026, 10, 31)),
        ],
        progress: StageProgress::initial(),
        events: vec![PlanEvent::new(
            PlanEventKind::PlanCreated,
            None,
            json!({ "name": "Data Structures" }),
        )],
    }
}

#[test]
fn save_then_load_preserves_plans() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("plans.json");

    let snapshot = StoreSnapshot {
        plans: vec![sample_plan()],
    };
    save_snapshot(&path, &snapshot).expect("save should succeed");

    let loaded = load_snapshot(&path).expect("load should succeed");
    assert_eq!(loaded, snapshot);
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n != "plans.json")
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");

    save_snapshot(
        &path,
        &StoreSnapshot {
            plans: vec![sample_plan(), sample_plan()],
        },
    )
    .unwrap();
    save_snapshot(&path, &StoreSnapshot::default()).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert!(loaded.plans.is_empty());
}

#[test]
fn stored_dates_use_iso_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");
    save_snapshot(
        &path,
        &StoreSnapshot {
            plans: vec![sample_plan()],
        },
    )
    .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"planned_starts_on\": \"2026-02-01\""));
    assert!(raw.contains("\"planned_ends_on\": \"2026-10-31\""));
    assert!(raw.contains("\"status\": \"scheduling\""));
    assert!(raw.contains("\"kind\": \"plan_created\""));
}

#[test]
fn plan_without_stages_loads_with_empty_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");
    let plan = Plan::new(None);
    let raw = json!({ "plans": [ { "plan": plan } ] });
    std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded.plans.len(), 1);
    assert!(loaded.plans[0].stages.is_empty());
    assert!(loaded.plans[0].events.is_empty());
    assert_eq!(loaded.plans[0].plan.id, plan.id);
}

#[test]
fn missing_progress_defaults_to_not_started() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");
    let raw = json!({ "plans": [ { "plan": Plan::new(None) } ] });
    std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    let progress = &loaded.plans[0].progress;
    assert_eq!(progress.len(), Stage::COUNT);
    assert!(progress.iter().all(|p| p.status == StageStatus::NotStarted));
}
