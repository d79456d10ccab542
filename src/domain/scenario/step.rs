//! Scenario steps and their outbound templates.

use serde::Deserialize;

use super::delay::DelaySpec;
use super::transition::Transition;
use super::validation::StepValidation;
use crate::domain::foundation::StepId;
use crate::domain::media::MediaType;

/// One node of a scenario graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Step {
    /// Filled from the map key when the scenario is loaded.
    #[serde(default)]
    pub id: StepId,
    #[serde(default)]
    pub messages: Vec<MessageTemplate>,
    #[serde(default, alias = "mediaMessages")]
    pub media_messages: Vec<MediaTemplate>,
    #[serde(default, alias = "retryMessages")]
    pub retry_messages: Vec<MessageTemplate>,
    /// Media sequence played after the messages.
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub validation: StepValidation,
    #[serde(default)]
    pub transitions: Transitions,
}

impl Step {
    pub fn on_success(&self) -> Option<&Transition> {
        self.transitions.on_success.as_ref()
    }

    pub fn on_timeout(&self) -> Option<&StepId> {
        self.transitions.on_timeout.as_ref()
    }

    /// Retry message for the given attempt (1-based); the last one repeats.
    pub fn retry_message(&self, attempt: u32) -> Option<&MessageTemplate> {
        if self.retry_messages.is_empty() {
            return None;
        }
        let index = (attempt.saturating_sub(1) as usize).min(self.retry_messages.len() - 1);
        self.retry_messages.get(index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transitions {
    #[serde(default, alias = "onSuccess")]
    pub on_success: Option<Transition>,
    #[serde(default, alias = "onTimeout")]
    pub on_timeout: Option<StepId>,
}

/// Text with optional alternates and a delivery delay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageTemplate {
    pub content: String,
    #[serde(default)]
    pub variations: Vec<String>,
    #[serde(default, alias = "delay_ms", alias = "delayMs")]
    pub delay: Option<DelaySpec>,
}

/// Media send declared on a step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaTemplate {
    #[serde(alias = "type", alias = "mediaType")]
    pub media_type: MediaType,
    /// Explicit asset path; takes precedence over `category`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub caption: Option<CaptionTemplate>,
    #[serde(default, alias = "delay_ms", alias = "delayMs")]
    pub delay: Option<DelaySpec>,
}

/// Caption given as a plain string or as `{ text, variations }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CaptionTemplate {
    Plain(String),
    Varied {
        text: String,
        #[serde(default)]
        variations: Vec<String>,
    },
}

impl CaptionTemplate {
    pub fn base(&self) -> &str {
        match self {
            CaptionTemplate::Plain(text) | CaptionTemplate::Varied { text, .. } => text,
        }
    }

    pub fn variations(&self) -> &[String] {
        match self {
            CaptionTemplate::Plain(_) => &[],
            CaptionTemplate::Varied { variations, .. } => variations,
        }
    }
}
