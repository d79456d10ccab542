//! Persona Flow - scripted, personality-flavored conversation engine
//!
//! Inbound chat messages are classified, validated against the current step
//! of a YAML-defined scenario graph and answered with humanized outbound
//! messages and media, delivered per chat with realistic pacing.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
