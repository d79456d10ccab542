//! Session domain module.
//!
//! Per-chat conversation state, the facts collected along the way, the
//! conversation phase, and the outbound actions a step produces.

mod aggregate;
mod outbound;
mod phase;
mod user_data;

pub use aggregate::{Session, SessionSnapshot};
pub use outbound::{MediaPayload, MediaSource, OutboundAction, OutboundPayload, OutboundPlan};
pub use phase::ConversationPhase;
pub use user_data::UserData;
