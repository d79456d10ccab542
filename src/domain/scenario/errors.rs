//! Scenario errors.

use thiserror::Error;

use crate::domain::foundation::StepId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("no scenarios configured")]
    NoScenarios,

    #[error("scenario '{0}' has no steps")]
    NoSteps(String),

    #[error("scenario '{scenario}': start step '{step}' does not exist")]
    UnknownStartStep { scenario: String, step: StepId },

    #[error("scenario '{scenario}': step '{from}' points to unknown step '{target}'")]
    DanglingTransition {
        scenario: String,
        from: StepId,
        target: StepId,
    },

    /// A session refers to a step the scenario does not define.
    #[error("scenario '{scenario}': step '{step}' not found")]
    UnknownStep { scenario: String, step: StepId },
}

impl ScenarioError {
    /// True for errors that mean the running scenario graph is broken.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            ScenarioError::UnknownStep { .. }
                | ScenarioError::DanglingTransition { .. }
                | ScenarioError::UnknownStartStep { .. }
        )
    }
}
