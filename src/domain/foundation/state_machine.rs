//! Lifecycle enums whose values only change along declared edges.

use std::fmt::Debug;

use super::ValidationError;

/// An enum with a fixed transition graph.
///
/// Implementors list their edges; `transition_to` refuses everything else.
pub trait StateMachine: Sized + Copy + PartialEq + Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one move.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` if the edge exists.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_transition(
                format!("{:?}", self),
                format!("{:?}", target),
            ));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
