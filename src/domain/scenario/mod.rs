//! Scenario domain module.
//!
//! Scenario graphs, step templates, validation rules, transitions, and the
//! state machine that applies them to inbound replies.

mod catalog;
mod delay;
mod errors;
mod machine;
mod step;
mod transition;
mod validation;

pub use catalog::{GlobalRules, Scenario, ScenarioCatalog};
pub use delay::{sample_or, DelaySpec, DEFAULT_MESSAGE_DELAY_MS, DEFAULT_RETRY_DELAY_MS};
pub use errors::ScenarioError;
pub use machine::{RetryDecision, ScenarioStateMachine, ValidationOutcome};
pub use step::{CaptionTemplate, MediaTemplate, MessageTemplate, Step, Transitions};
pub use transition::{Branch, Condition, ConditionalTransition, Transition};
pub use validation::{
    ClassifierRule, ForceProgress, KeywordRule, PatternRule, Predicate, PredicateRule,
    StepValidation, ValidationContext, ValidationRule, Validator,
};
