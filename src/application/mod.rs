//! Application layer - orchestration of domain logic over the ports.
//!
//! - `ConversationEngine` - inbound processing, step execution, routing
//! - `OutboundDrainer` - per-session delivery loop
//! - `MediaDispatcher` - media resolution, policies and history
//! - `SessionRegistry` - live sessions and their outbound queues
//! - `IdleSweeper` - background eviction of inactive sessions

mod drain;
mod engine;
mod idle_sweeper;
mod media_dispatcher;
mod registry;
mod rng;
mod stats;
mod typing;

pub use drain::OutboundDrainer;
pub use engine::{
    ConversationEngine, EngineDependencies, EngineError, EngineSettings, InboundOutcome,
};
pub use idle_sweeper::{IdleSweeper, IdleSweeperConfig};
pub use media_dispatcher::{Fallback, MediaDispatcher, SendOptions};
pub use registry::{LiveSession, OutboundQueue, SessionRegistry};
pub use rng::SharedRng;
pub use stats::{EngineStats, StatsReport};
pub use typing::TypingSimulation;
