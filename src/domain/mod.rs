//! Domain layer - conversation scripting, personality, sessions and media.
//!
//! Nothing in here performs I/O; collaborators are reached through the
//! traits in `crate::ports`.

pub mod classification;
pub mod foundation;
pub mod media;
pub mod personality;
pub mod scenario;
pub mod session;
