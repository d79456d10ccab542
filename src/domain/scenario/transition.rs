//! Step transitions: literal targets and conditional branches.
//!
//! A conditional transition is evaluated first-match in declaration order
//! over small comparison expressions such as `age >= 19 && age <= 30`.
//! Expressions are parsed when the scenario is loaded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

use crate::domain::foundation::StepId;
use crate::domain::session::UserData;

static CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]+)\s*(<=|>=|==|<|>)\s*(-?\d+)\s*$").expect("clause regex is valid")
});

/// Where a step goes next.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Transition {
    Step(StepId),
    Conditional(ConditionalTransition),
}

/// `{ type: conditional, conditions: [...], default: step }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionalTransition {
    #[serde(default)]
    pub conditions: Vec<Branch>,
    #[serde(default)]
    pub default: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Branch {
    pub condition: Condition,
    #[serde(alias = "nextStep")]
    pub next_step: StepId,
}

impl Transition {
    /// Resolves the target for the given user data. `None` when a conditional
    /// transition matches nothing and has no default.
    pub fn resolve(&self, user_data: &UserData) -> Option<&StepId> {
        match self {
            Transition::Step(id) => Some(id),
            Transition::Conditional(cond) => cond
                .conditions
                .iter()
                .find(|b| b.condition.holds(user_data))
                .map(|b| &b.next_step)
                .or(cond.default.as_ref()),
        }
    }

    /// Every step id this transition can lead to.
    pub fn targets(&self) -> Vec<&StepId> {
        match self {
            Transition::Step(id) => vec![id],
            Transition::Conditional(cond) => cond
                .conditions
                .iter()
                .map(|b| &b.next_step)
                .chain(cond.default.iter())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    fn apply(&self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Eq => left == right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: Field,
    pub op: CompareOp,
    pub value: i64,
}

/// Conjunction of comparisons over collected user data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Condition {
    source: String,
    clauses: Vec<Clause>,
}

impl Condition {
    /// Parses `field op number [&& field op number]*`.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let clauses = expr
            .split("&&")
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| format!("invalid condition '{}': {}", expr, reason))?;

        Ok(Self {
            source: expr.trim().to_string(),
            clauses,
        })
    }

    /// True when every clause holds. A clause over a field with no collected
    /// value never holds.
    pub fn holds(&self, user_data: &UserData) -> bool {
        self.clauses.iter().all(|clause| {
            let value = match clause.field {
                Field::Age => user_data.age.map(i64::from),
            };
            value.map_or(false, |v| clause.op.apply(v, clause.value))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for Condition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Condition::parse(&value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn parse_clause(clause: &str) -> Result<Clause, String> {
    let caps = CLAUSE
        .captures(clause)
        .ok_or_else(|| format!("cannot parse '{}'", clause.trim()))?;

    let field = match &caps[1] {
        "age" => Field::Age,
        other => return Err(format!("unknown field '{}'", other)),
    };
    let op = match &caps[2] {
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        _ => CompareOp::Eq,
    };
    let value = caps[3]
        .parse::<i64>()
        .map_err(|e| format!("bad number '{}': {}", &caps[3], e))?;

    Ok(Clause { field, op, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_age(age: Option<u32>) -> UserData {
        UserData {
            age,
            ..Default::default()
        }
    }

    fn age_router() -> Transition {
        serde_yaml::from_str(
            r#"
type: conditional
conditions:
  - condition: "age < 19"
    next_step: too_young
  - condition: "age >= 19 && age <= 30"
    next_step: young
  - condition: "age > 30"
    next_step: older
default: ask_age_again
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_literal_target() {
        let t: Transition = serde_yaml::from_str("next").unwrap();
        assert_eq!(t.resolve(&UserData::default()).map(StepId::as_str), Some("next"));
    }

    #[test]
    fn test_first_matching_branch_wins() {
        let router = age_router();
        assert_eq!(router.resolve(&with_age(Some(25))).map(StepId::as_str), Some("young"));
        assert_eq!(router.resolve(&with_age(Some(12))).map(StepId::as_str), Some("too_young"));
        assert_eq!(router.resolve(&with_age(Some(45))).map(StepId::as_str), Some("older"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let router = age_router();
        assert_eq!(router.resolve(&with_age(Some(19))).map(StepId::as_str), Some("young"));
        assert_eq!(router.resolve(&with_age(Some(30))).map(StepId::as_str), Some("young"));
    }

    #[test]
    fn test_missing_field_falls_to_default() {
        let router = age_router();
        assert_eq!(
            router.resolve(&with_age(None)).map(StepId::as_str),
            Some("ask_age_again")
        );
    }

    #[test]
    fn test_no_match_without_default_is_none() {
        let t: Transition = serde_yaml::from_str(
            r#"
type: conditional
conditions:
  - condition: "age > 99"
    next_step: old
"#,
        )
        .unwrap();
        assert!(t.resolve(&with_age(Some(20))).is_none());
    }

    #[test]
    fn test_targets_lists_branches_and_default() {
        let router = age_router();
        let targets: Vec<&str> = router.targets().into_iter().map(StepId::as_str).collect();
        assert_eq!(targets, vec!["too_young", "young", "older", "ask_age_again"]);
    }

    #[test]
    fn test_rejects_unknown_field_and_garbage() {
        assert!(Condition::parse("height > 3").is_err());
        assert!(Condition::parse("age >> 3").is_err());
        assert!(Condition::parse("age = 3").is_err());
        assert!(Condition::parse("age == 3").is_ok());
    }

    #[test]
    fn test_invalid_condition_fails_deserialization() {
        let result: Result<Transition, _> = serde_yaml::from_str(
            r#"
conditions:
  - condition: "mood > 3"
    next_step: x
"#,
        );
        // untagged: neither a step id nor a valid conditional
        assert!(result.is_err());
    }
}
