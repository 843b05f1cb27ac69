//! Plan status transitions.

use stageplan_store::models::PlanStatus;

/// The plan state machine.
///
/// Enforces the valid transition graph:
///
/// ```text
/// draft          -> scheduling      (first schedule saved)
/// scheduling     -> ready_to_start  (schedule finalized)
/// ready_to_start -> in_progress     (plan started)
/// in_progress    -> completed       (last stage advanced past)
/// any but archived -> archived
/// ```
///
/// Re-saving or re-finalizing a `ready_to_start` plan keeps its status; that
/// is not a transition.
pub struct PlanStateMachine;

impl PlanStateMachine {
    /// Check whether a transition from `from` to `to` is a valid edge
    /// in the state graph.
    pub fn is_valid_transition(from: PlanStatus, to: PlanStatus) -> bool {
        matches!(
            (from, to),
            (PlanStatus::Draft, PlanStatus::Scheduling)
                | (PlanStatus::Scheduling, PlanStatus::ReadyToStart)
                | (PlanStatus::ReadyToStart, PlanStatus::InProgress)
                | (PlanStatus::InProgress, PlanStatus::Completed)
                | (
                    PlanStatus::Draft
                        | PlanStatus::Scheduling
                        | PlanStatus::ReadyToStart
                        | PlanStatus::InProgress
                        | PlanStatus::Completed,
                    PlanStatus::Archived
                )
        )
    }

    /// Whether the schedule may still be saved, edited, or finalized.
    ///
    /// Once a plan has started or is closed its schedule is frozen; a
    /// started plan can only have stages extended.
    pub fn can_edit_schedule(status: PlanStatus) -> bool {
        matches!(
            status,
            PlanStatus::Draft | PlanStatus::Scheduling | PlanStatus::ReadyToStart
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlanStatus; 6] = [
        PlanStatus::Draft,
        PlanStatus::Scheduling,
        PlanStatus::ReadyToStart,
        PlanStatus::InProgress,
        PlanStatus::Completed,
        PlanStatus::Archived,
    ];

    #[test]
    fn forward_path_is_valid() {
        assert!(PlanStateMachine::is_valid_transition(
            PlanStatus::Draft,
            PlanStatus::Scheduling
        ));
        assert!(PlanStateMachine::is_valid_transition(
            PlanStatus::Scheduling,
            PlanStatus::ReadyToStart
        ));
        assert!(PlanStateMachine::is_valid_transition(
            PlanStatus::ReadyToStart,
            PlanStatus::InProgress
        ));
        assert!(PlanStateMachine::is_valid_transition(
            PlanStatus::InProgress,
            PlanStatus::Completed
        ));
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(!PlanStateMachine::is_valid_transition(
            PlanStatus::Draft,
            PlanStatus::ReadyToStart
        ));
        assert!(!PlanStateMachine::is_valid_transition(
            PlanStatus::Scheduling,
            PlanStatus::InProgress
        ));
        assert!(!PlanStateMachine::is_valid_transition(
            PlanStatus::ReadyToStart,
            PlanStatus::Scheduling
        ));
        assert!(!PlanStateMachine::is_valid_transition(
            PlanStatus::Completed,
            PlanStatus::InProgress
        ));
    }

    #[test]
    fn everything_but_archived_can_archive() {
        for status in ALL {
            assert_eq!(
                PlanStateMachine::is_valid_transition(status, PlanStatus::Archived),
                status != PlanStatus::Archived,
                "{status} -> archived"
            );
        }
    }

    #[test]
    fn archived_is_terminal() {
        for status in ALL {
            assert!(!PlanStateMachine::is_valid_transition(
                PlanStatus::Archived,
                status
            ));
        }
    }

    #[test]
    fn schedule_is_frozen_once_started() {
        let editable: Vec<PlanStatus> = ALL
            .into_iter()
            .filter(|s| PlanStateMachine::can_edit_schedule(*s))
            .collect();
        assert_eq!(
            editable,
            vec![
                PlanStatus::Draft,
                PlanStatus::Scheduling,
                PlanStatus::ReadyToStart
            ]
        );
    }
}
