//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait, and error
//! types that form the vocabulary of the conversation domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ChatId, StepId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
