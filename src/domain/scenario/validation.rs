//! Step validation rules.
//!
//! Rules form a closed set dispatched through [`ValidationRule`]; each kind
//! implements [`Validator`]. Nothing in a scenario file can execute code.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};

use crate::domain::classification::{Classification, EntityKind, Intent};
use crate::domain::session::UserData;

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub message: &'a str,
    pub classification: &'a Classification,
    pub user_data: &'a UserData,
}

/// A single validation strategy.
pub trait Validator {
    /// Returns true if the reply satisfies the rule.
    fn accepts(&self, ctx: &ValidationContext<'_>) -> bool;
}

/// Rule attached to a step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Any reply is accepted.
    #[default]
    None,
    #[serde(alias = "nlp")]
    Classifier(ClassifierRule),
    Pattern(PatternRule),
    Keyword(KeywordRule),
    #[serde(alias = "function")]
    Predicate(PredicateRule),
    /// Rule type this build does not know; accepted with a warning.
    #[serde(other)]
    Unknown,
}

/// Validation block of a step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepValidation {
    #[serde(default)]
    pub rule: ValidationRule,
    /// Overrides the scenario-wide retry limit.
    #[serde(default, alias = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(default, alias = "forceProgress")]
    pub force_progress: Option<ForceProgress>,
}

impl StepValidation {
    pub fn has_rule(&self) -> bool {
        !matches!(self.rule, ValidationRule::None)
    }

    /// True if a failed reply at `retry_count` should still advance.
    pub fn forces_progress_at(&self, retry_count: u32) -> bool {
        self.force_progress
            .as_ref()
            .map_or(false, |fp| fp.enabled && retry_count >= fp.on_retry_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ForceProgress {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, alias = "onRetryCount")]
    pub on_retry_count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Classifier-based
// ─────────────────────────────────────────────────────────────────────────────

/// Validation against the classifier result.
///
/// Checked in order, the first configured criterion decides: required
/// entity, then keywords, then intents. With none configured the reply must
/// be longer than `min_length`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierRule {
    #[serde(default)]
    pub entity: Option<EntityKind>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default, alias = "minLength")]
    pub min_length: usize,
}

impl Validator for ClassifierRule {
    fn accepts(&self, ctx: &ValidationContext<'_>) -> bool {
        if let Some(entity) = self.entity {
            return ctx.classification.detected(entity);
        }
        if !self.keywords.is_empty() {
            return contains_any(ctx.message, &self.keywords);
        }
        if !self.intents.is_empty() {
            return self.intents.contains(&ctx.classification.intent);
        }
        ctx.message.chars().count() > self.min_length
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern
// ─────────────────────────────────────────────────────────────────────────────

/// Case-insensitive regular expression over the raw reply.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRule {
    #[serde(deserialize_with = "case_insensitive_regex")]
    pub pattern: Regex,
}

impl Validator for PatternRule {
    fn accepts(&self, ctx: &ValidationContext<'_>) -> bool {
        self.pattern.is_match(ctx.message)
    }
}

fn case_insensitive_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let source = String::deserialize(deserializer)?;
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(serde::de::Error::custom)
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyword
// ─────────────────────────────────────────────────────────────────────────────

/// Reply contains any keyword, ignoring case. An empty list accepts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordRule {
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Validator for KeywordRule {
    fn accepts(&self, ctx: &ValidationContext<'_>) -> bool {
        self.keywords.is_empty() || contains_any(ctx.message, &self.keywords)
    }
}

fn contains_any(message: &str, keywords: &[String]) -> bool {
    let lower = message.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Predicate
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in predicates over collected user data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Predicate {
    /// Collected age is at least `age`.
    IsOlderThan { age: u32 },
    HasLocation,
    HasSelectedService,
    PaymentConfirmed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredicateRule {
    pub predicate: Predicate,
}

impl Validator for PredicateRule {
    fn accepts(&self, ctx: &ValidationContext<'_>) -> bool {
        let data = ctx.user_data;
        match &self.predicate {
            Predicate::IsOlderThan { age } => data.age.map_or(false, |a| a >= *age),
            Predicate::HasLocation => data.location.is_some(),
            Predicate::HasSelectedService => data.service_choice.is_some(),
            Predicate::PaymentConfirmed => data.payment_confirmed,
        }
    }
}

impl ValidationRule {
    /// Evaluates the rule. `None` and `Unknown` accept everything.
    pub fn accepts(&self, ctx: &ValidationContext<'_>) -> bool {
        match self {
            ValidationRule::None | ValidationRule::Unknown => true,
            ValidationRule::Classifier(rule) => rule.accepts(ctx),
            ValidationRule::Pattern(rule) => rule.accepts(ctx),
            ValidationRule::Keyword(rule) => rule.accepts(ctx),
            ValidationRule::Predicate(rule) => rule.accepts(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(yaml: &str) -> ValidationRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn check(rule: &ValidationRule, message: &str, c: &Classification, data: &UserData) -> bool {
        rule.accepts(&ValidationContext {
            message,
            classification: c,
            user_data: data,
        })
    }

    #[test]
    fn test_entity_rule_uses_classifier_flag() {
        let r = rule("type: classifier\nentity: location");
        let data = UserData::default();
        let mut c = Classification::neutral();
        assert!(!check(&r, "near the river", &c, &data));

        c.contains_location = true;
        assert!(check(&r, "near the river", &c, &data));
    }

    #[test]
    fn test_classifier_rule_with_intents() {
        let r = rule("type: nlp\nintents: [greeting, confirmation]");
        let data = UserData::default();
        let mut c = Classification::neutral();
        assert!(!check(&r, "hm", &c, &data));
        c.intent = Intent::Greeting;
        assert!(check(&r, "hm", &c, &data));
    }

    #[test]
    fn test_classifier_rule_min_length_fallback() {
        let r = rule("type: classifier\nmin_length: 3");
        let c = Classification::neutral();
        let data = UserData::default();
        assert!(!check(&r, "abc", &c, &data));
        assert!(check(&r, "abcd", &c, &data));
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        let r = rule("type: pattern\npattern: '^yes'");
        let c = Classification::neutral();
        let data = UserData::default();
        assert!(check(&r, "YES please", &c, &data));
        assert!(!check(&r, "no", &c, &data));
    }

    #[test]
    fn test_invalid_pattern_is_load_error() {
        let result: Result<ValidationRule, _> = serde_yaml::from_str("type: pattern\npattern: '('");
        assert!(result.is_err());
    }

    #[test]
    fn test_keyword_rule() {
        let r = rule("type: keyword\nkeywords: [Ok, sure]");
        let c = Classification::neutral();
        let data = UserData::default();
        assert!(check(&r, "okay then", &c, &data));
        assert!(check(&r, "SURE", &c, &data));
        assert!(!check(&r, "never", &c, &data));

        let empty = rule("type: keyword");
        assert!(check(&empty, "anything", &c, &data));
    }

    #[test]
    fn test_predicates() {
        let c = Classification::neutral();
        let mut data = UserData::default();
        let older = rule("type: predicate\npredicate: {name: isOlderThan, age: 18}");
        assert!(!check(&older, "", &c, &data));
        data.age = Some(18);
        assert!(check(&older, "", &c, &data));

        let service = rule("type: function\npredicate: {name: hasSelectedService}");
        assert!(!check(&service, "", &c, &data));
        data.service_choice = Some("a".to_string());
        assert!(check(&service, "", &c, &data));

        let paid = rule("type: predicate\npredicate: {name: paymentConfirmed}");
        assert!(!check(&paid, "", &c, &data));
    }

    #[test]
    fn test_unknown_type_accepts() {
        let r = rule("type: sentiment");
        assert!(matches!(r, ValidationRule::Unknown));
        assert!(check(&r, "", &Classification::neutral(), &UserData::default()));
    }

    #[test]
    fn test_force_progress_threshold() {
        let v: StepValidation = serde_yaml::from_str(
            "rule: {type: keyword, keywords: [x]}\nforce_progress: {enabled: true, on_retry_count: 2}",
        )
        .unwrap();
        assert!(v.has_rule());
        assert!(!v.forces_progress_at(1));
        assert!(v.forces_progress_at(2));

        let disabled: StepValidation =
            serde_yaml::from_str("force_progress: {enabled: false, on_retry_count: 0}").unwrap();
        assert!(!disabled.has_rule());
        assert!(!disabled.forces_progress_at(5));
    }
}
