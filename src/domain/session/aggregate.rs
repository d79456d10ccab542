//! Session aggregate.
//!
//! One session exists per chat. It tracks where the chat is in the active
//! scenario, how many times the current step has been retried, and what has
//! been learned about the counterpart so far.
//!
//! # Invariants
//!
//! - `retry_count` is reset to 0 on every transition
//! - `retry_count` only grows through `register_retry`
//! - `phase` is not persisted; restored sessions start `Idle`

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::phase::ConversationPhase;
use super::user_data::UserData;
use crate::domain::classification::Classification;
use crate::domain::foundation::{ChatId, StateMachine, StepId, Timestamp, ValidationError};

/// Per-chat conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    chat_id: ChatId,
    current_step: StepId,
    previous_step: Option<StepId>,
    retry_count: u32,
    user_data: UserData,
    last_interaction: Timestamp,
    phase: ConversationPhase,
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub chat_id: ChatId,
    pub current_step: StepId,
    #[serde(default)]
    pub previous_step: Option<StepId>,
    #[serde(default)]
    pub user_data: UserData,
    pub last_interaction_time: Timestamp,
    #[serde(default)]
    pub retry_count: u32,
}

impl Session {
    /// Creates a fresh session positioned on the scenario's start step.
    pub fn new(chat_id: ChatId, start_step: StepId, now: Timestamp) -> Self {
        Self {
            chat_id,
            current_step: start_step,
            previous_step: None,
            retry_count: 0,
            user_data: UserData::default(),
            last_interaction: now,
            phase: ConversationPhase::Idle,
        }
    }

    /// Restores a session from its persisted form.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            chat_id: snapshot.chat_id,
            current_step: snapshot.current_step,
            previous_step: snapshot.previous_step,
            retry_count: snapshot.retry_count,
            user_data: snapshot.user_data,
            last_interaction: snapshot.last_interaction_time,
            phase: ConversationPhase::Idle,
        }
    }

    /// Captures the persistable part of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            chat_id: self.chat_id.clone(),
            current_step: self.current_step.clone(),
            previous_step: self.previous_step.clone(),
            user_data: self.user_data.clone(),
            last_interaction_time: self.last_interaction,
            retry_count: self.retry_count,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn current_step(&self) -> &StepId {
        &self.current_step
    }

    pub fn previous_step(&self) -> Option<&StepId> {
        self.previous_step.as_ref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn user_data(&self) -> &UserData {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut UserData {
        &mut self.user_data
    }

    pub fn last_interaction(&self) -> &Timestamp {
        &self.last_interaction
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records an inbound message at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_interaction = now;
    }

    /// Moves to `next`, remembering the step we came from.
    pub fn advance_to(&mut self, next: StepId) {
        let previous = std::mem::replace(&mut self.current_step, next);
        self.previous_step = Some(previous);
        self.retry_count = 0;
    }

    /// Counts one more failed attempt at the current step and returns the
    /// new count.
    pub fn register_retry(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }

    /// Merges detected entities into the user data.
    pub fn apply_classification(&mut self, classification: &Classification) -> bool {
        self.user_data.merge(classification)
    }

    /// Moves the session to another phase.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the transition is not allowed from the
    /// current phase; the phase is left unchanged.
    pub fn enter_phase(&mut self, next: ConversationPhase) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(next)?;
        Ok(())
    }

    /// Drops back to `Idle` regardless of the current phase.
    pub fn reset_phase(&mut self) {
        self.phase = ConversationPhase::Idle;
    }

    /// True when the last inbound message is older than `threshold`.
    pub fn is_idle(&self, threshold: Duration, now: &Timestamp) -> bool {
        self.last_interaction.is_older_than(threshold, now)
    }
}
