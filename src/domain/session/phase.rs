//! Conversation phase of a single session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where a session is in the handling of one inbound message.
///
/// Failures are not modelled as phases: whatever goes wrong, the engine
/// puts the session back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Idle,
    Classifying,
    Transitioning,
    ExecutingStep,
    DrainingQueue,
}

impl StateMachine for ConversationPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationPhase::*;
        matches!(
            (self, target),
            (Idle, Classifying)
                | (Classifying, Transitioning)
                | (Classifying, Idle)
                | (Transitioning, ExecutingStep)
                | (Transitioning, DrainingQueue)
                | (Transitioning, Idle)
                | (ExecutingStep, DrainingQueue)
                | (ExecutingStep, Idle)
                | (DrainingQueue, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationPhase::*;
        match self {
            Idle => vec![Classifying],
            Classifying => vec![Transitioning, Idle],
            Transitioning => vec![ExecutingStep, DrainingQueue, Idle],
            ExecutingStep => vec![DrainingQueue, Idle],
            DrainingQueue => vec![Idle],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationPhase::*;

    #[test]
    fn test_happy_path_is_valid() {
        let mut phase = Idle;
        for next in [Classifying, Transitioning, ExecutingStep, DrainingQueue, Idle] {
            phase = phase.transition_to(next).unwrap();
        }
        assert_eq!(phase, Idle);
    }

    #[test]
    fn test_retry_path_skips_step_execution() {
        assert!(Transitioning.can_transition_to(&DrainingQueue));
    }

    #[test]
    fn test_cannot_skip_classification() {
        assert!(Idle.transition_to(Transitioning).is_err());
        assert!(Idle.transition_to(ExecutingStep).is_err());
    }

    #[test]
    fn test_no_phase_is_terminal() {
        for phase in [Idle, Classifying, Transitioning, ExecutingStep, DrainingQueue] {
            assert!(!phase.is_terminal(), "{:?} should not be terminal", phase);
        }
    }

    #[test]
    fn test_can_transition_to_is_consistent_with_valid_transitions() {
        for phase in [Idle, Classifying, Transitioning, ExecutingStep, DrainingQueue] {
            for target in phase.valid_transitions() {
                assert!(phase.can_transition_to(&target));
            }
        }
    }
}
