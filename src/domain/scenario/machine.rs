//! Scenario state machine: validates replies and decides where to go next.

use std::sync::Arc;
use tracing::warn;

use super::catalog::Scenario;
use super::step::Step;
use super::validation::{ValidationContext, ValidationRule};
use crate::domain::classification::Classification;
use crate::domain::foundation::StepId;
use crate::domain::session::Session;

/// Result of validating one reply against the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// Target when advancing; `None` on a terminal step or when retrying.
    pub next_step: Option<StepId>,
    pub needs_retry: bool,
    pub force_progress: bool,
}

impl ValidationOutcome {
    fn valid(next_step: Option<StepId>, force_progress: bool) -> Self {
        Self {
            is_valid: true,
            next_step,
            needs_retry: false,
            force_progress,
        }
    }

    fn forced(next_step: Option<StepId>) -> Self {
        Self {
            is_valid: false,
            next_step,
            needs_retry: false,
            force_progress: true,
        }
    }

    fn retry() -> Self {
        Self {
            is_valid: false,
            next_step: None,
            needs_retry: true,
            force_progress: false,
        }
    }
}

/// What to do after a reply needed a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the retry message for this attempt.
    Retry { attempt: u32 },
    /// Retries used up; move to the step's timeout target.
    Timeout(StepId),
    /// Retries used up and nowhere to go; stay silent.
    Exhausted,
}

/// Applies a scenario's rules to inbound replies.
#[derive(Debug, Clone)]
pub struct ScenarioStateMachine {
    scenario: Arc<Scenario>,
}

impl ScenarioStateMachine {
    pub fn new(scenario: Arc<Scenario>) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    /// Validates `message` against `step` for the given session.
    ///
    /// `session.retry_count()` is the count before this reply.
    pub fn validate(
        &self,
        message: &str,
        classification: &Classification,
        session: &Session,
        step: &Step,
    ) -> ValidationOutcome {
        let rule = &step.validation.rule;
        let success_target = || {
            step.on_success()
                .and_then(|t| t.resolve(session.user_data()))
                .cloned()
        };

        match rule {
            ValidationRule::None => return ValidationOutcome::valid(success_target(), true),
            ValidationRule::Unknown => {
                warn!(
                    step = %step.id,
                    chat_id = %session.chat_id(),
                    "Unrecognized validation rule, accepting reply"
                );
            }
            _ => {}
        }

        let ctx = ValidationContext {
            message,
            classification,
            user_data: session.user_data(),
        };

        if rule.accepts(&ctx) {
            ValidationOutcome::valid(success_target(), false)
        } else if step.validation.forces_progress_at(session.retry_count()) {
            ValidationOutcome::forced(success_target())
        } else {
            ValidationOutcome::retry()
        }
    }

    /// Decides what a needs-retry outcome leads to.
    ///
    /// `retry_count` is the count after this failure was registered.
    pub fn retry_decision(&self, step: &Step, retry_count: u32) -> RetryDecision {
        if retry_count <= self.scenario.max_retries_for(step) {
            return RetryDecision::Retry {
                attempt: retry_count,
            };
        }
        match step.on_timeout() {
            Some(target) => RetryDecision::Timeout(target.clone()),
            None => RetryDecision::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChatId, Timestamp};
    use crate::domain::scenario::ScenarioCatalog;
    use std::collections::BTreeMap;

    const SCENARIO: &str = r#"
test:
  start_step: greet
  steps:
    greet:
      transitions: {on_success: ask_city}
    ask_city:
      validation:
        rule: {type: classifier, entity: location}
        max_retries: 2
      transitions: {on_success: ask_age, on_timeout: bye}
    ask_age:
      validation:
        rule: {type: classifier, entity: age}
        force_progress: {enabled: true, on_retry_count: 2}
      transitions:
        on_success:
          type: conditional
          conditions:
            - {condition: "age < 19", next_step: minor}
            - {condition: "age >= 19 && age <= 30", next_step: young}
            - {condition: "age > 30", next_step: older}
          default: young
    minor: {}
    young: {}
    older: {}
    bye: {}
    odd:
      validation:
        rule: {type: astrology}
      transitions: {on_success: bye}
"#;

    fn machine() -> ScenarioStateMachine {
        let raw: BTreeMap<String, Scenario> = serde_yaml::from_str(SCENARIO).unwrap();
        let catalog = ScenarioCatalog::new(raw).unwrap();
        ScenarioStateMachine::new(catalog.get("test").unwrap())
    }

    fn session_at(step: &str) -> Session {
        let mut session = Session::new(ChatId::new("c"), StepId::new("greet"), Timestamp::now());
        if step != "greet" {
            session.advance_to(StepId::new(step));
        }
        session
    }

    fn step<'a>(m: &'a ScenarioStateMachine, id: &str) -> &'a Step {
        m.scenario().step(&StepId::new(id)).unwrap()
    }

    #[test]
    fn test_no_rule_always_valid_and_forced() {
        let m = machine();
        let session = session_at("greet");
        for message in ["", "anything", "🙂"] {
            let outcome = m.validate(message, &Classification::neutral(), &session, step(&m, "greet"));
            assert!(outcome.is_valid);
            assert!(!outcome.needs_retry);
            assert!(outcome.force_progress);
            assert_eq!(outcome.next_step.as_ref().map(StepId::as_str), Some("ask_city"));
        }
    }

    #[test]
    fn test_failed_rule_needs_retry() {
        let m = machine();
        let session = session_at("ask_city");
        let outcome = m.validate("hmm", &Classification::neutral(), &session, step(&m, "ask_city"));
        assert_eq!(
            outcome,
            ValidationOutcome {
                is_valid: false,
                next_step: None,
                needs_retry: true,
                force_progress: false
            }
        );
    }

    #[test]
    fn test_valid_reply_advances() {
        let m = machine();
        let session = session_at("ask_city");
        let classification = Classification {
            contains_location: true,
            location_name: Some("Lyon".to_string()),
            ..Classification::neutral()
        };
        let outcome = m.validate("Lyon", &classification, &session, step(&m, "ask_city"));
        assert!(outcome.is_valid);
        assert!(!outcome.force_progress);
        assert_eq!(outcome.next_step.as_ref().map(StepId::as_str), Some("ask_age"));
    }

    #[test]
    fn test_conditional_first_match_on_age() {
        let m = machine();
        let mut session = session_at("ask_age");
        session.user_data_mut().age = Some(25);
        let classification = Classification {
            contains_age: true,
            age_value: Some(25),
            ..Classification::neutral()
        };
        let outcome = m.validate("25", &classification, &session, step(&m, "ask_age"));
        assert_eq!(outcome.next_step.as_ref().map(StepId::as_str), Some("young"));
    }

    #[test]
    fn test_force_progress_after_retries() {
        let m = machine();
        let mut session = session_at("ask_age");
        let ask_age = step(&m, "ask_age");

        session.register_retry();
        let outcome = m.validate("?", &Classification::neutral(), &session, ask_age);
        assert!(outcome.needs_retry);

        session.register_retry();
        let outcome = m.validate("?", &Classification::neutral(), &session, ask_age);
        assert!(outcome.force_progress);
        assert!(!outcome.is_valid);
        assert!(!outcome.needs_retry);
        // no age collected: default branch
        assert_eq!(outcome.next_step.as_ref().map(StepId::as_str), Some("young"));
    }

    #[test]
    fn test_retry_bound_then_timeout() {
        let m = machine();
        let ask_city = step(&m, "ask_city");
        assert_eq!(m.retry_decision(ask_city, 1), RetryDecision::Retry { attempt: 1 });
        assert_eq!(m.retry_decision(ask_city, 2), RetryDecision::Retry { attempt: 2 });
        assert_eq!(
            m.retry_decision(ask_city, 3),
            RetryDecision::Timeout(StepId::new("bye"))
        );
    }

    #[test]
    fn test_retry_exhausted_without_timeout() {
        let m = machine();
        let ask_age = step(&m, "ask_age");
        // scenario default of 2
        assert_eq!(m.retry_decision(ask_age, 2), RetryDecision::Retry { attempt: 2 });
        assert_eq!(m.retry_decision(ask_age, 3), RetryDecision::Exhausted);
    }

    #[test]
    fn test_unknown_rule_fails_open() {
        let m = machine();
        let session = session_at("odd");
        let outcome = m.validate("x", &Classification::neutral(), &session, step(&m, "odd"));
        assert!(outcome.is_valid);
        assert_eq!(outcome.next_step.as_ref().map(StepId::as_str), Some("bye"));
    }

    #[test]
    fn test_terminal_step_has_no_target() {
        let m = machine();
        let session = session_at("bye");
        let outcome = m.validate("ok", &Classification::neutral(), &session, step(&m, "bye"));
        assert!(outcome.is_valid);
        assert!(outcome.next_step.is_none());
    }
}
