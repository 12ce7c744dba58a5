//! Workflow phase transition table

use crate::error::StateMachineError;
use crate::state::WorkflowPhase;

/// Validates a workflow phase transition.
///
/// Illegal transitions indicate a bug in the driver; they are returned as an
/// error rather than panicking so the workflow can fail the scenario cleanly.
pub fn validate_transition(from: WorkflowPhase, to: WorkflowPhase) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: WorkflowPhase) -> Vec<WorkflowPhase> {
    use WorkflowPhase::*;
    match from {
        Pending => vec![Generated, Failed],
        Generated => vec![Evaluated],
        Evaluated => vec![Refining, Accepted],
        Refining => vec![Generated, Failed],
        Accepted => vec![],
        Failed => vec![],
    }
}

fn allowed(from: WorkflowPhase, to: WorkflowPhase) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn refinement_loop_is_legal() {
        assert!(validate_transition(WorkflowPhase::Evaluated, WorkflowPhase::Refining).is_ok());
        assert!(validate_transition(WorkflowPhase::Refining, WorkflowPhase::Generated).is_ok());
        assert!(validate_transition(WorkflowPhase::Generated, WorkflowPhase::Evaluated).is_ok());
    }

    #[test]
    fn cannot_skip_evaluation() {
        assert!(validate_transition(WorkflowPhase::Generated, WorkflowPhase::Accepted).is_err());
        assert!(validate_transition(WorkflowPhase::Pending, WorkflowPhase::Evaluated).is_err());
    }

    #[test]
    fn failure_only_from_generation_points() {
        assert!(validate_transition(WorkflowPhase::Pending, WorkflowPhase::Failed).is_ok());
        assert!(validate_transition(WorkflowPhase::Refining, WorkflowPhase::Failed).is_ok());
        assert!(validate_transition(WorkflowPhase::Evaluated, WorkflowPhase::Failed).is_err());
    }

    fn phase() -> impl Strategy<Value = WorkflowPhase> {
        prop_oneof![
            Just(WorkflowPhase::Pending),
            Just(WorkflowPhase::Generated),
            Just(WorkflowPhase::Evaluated),
            Just(WorkflowPhase::Refining),
            Just(WorkflowPhase::Accepted),
            Just(WorkflowPhase::Failed),
        ]
    }

    proptest! {
        #[test]
        fn prop_validation_matches_table(from in phase(), to in phase()) {
            let res = validate_transition(from, to);
            let allowed = allowed_transitions(from);

            if res.is_ok() {
                prop_assert!(allowed.contains(&to));
            } else {
                prop_assert!(!allowed.contains(&to));
            }
        }

        #[test]
        fn prop_terminal_phases_have_no_exit(from in phase(), to in phase()) {
            if from.is_terminal() {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }
    }
}
