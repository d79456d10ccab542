//! Scenarios and the catalog they are selected from.
//!
//! Scenarios are read once at startup and never mutated. Loading normalizes
//! step ids and checks that every transition target exists, so a running
//! engine only sees a dangling step if a restored session refers to a step
//! that has since been removed.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use super::errors::ScenarioError;
use super::step::Step;
use crate::domain::foundation::StepId;

/// Scenario-wide rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GlobalRules {
    #[serde(default = "default_max_retries", alias = "maxRetries")]
    pub max_retries: u32,
}

impl Default for GlobalRules {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

/// A named conversation script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Filled from the catalog key when loaded.
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "startStep")]
    pub start_step: Option<StepId>,
    #[serde(default, alias = "globalRules")]
    pub global_rules: GlobalRules,
    #[serde(default)]
    pub steps: BTreeMap<StepId, Step>,
}

impl Scenario {
    /// Entry step: the configured one, else the first step id in order.
    pub fn start_step(&self) -> Option<&StepId> {
        self.start_step.as_ref().or_else(|| self.steps.keys().next())
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    /// Looks up a step, reporting a dangling id as an integrity error.
    pub fn require_step(&self, id: &StepId) -> Result<&Step, ScenarioError> {
        self.step(id).ok_or_else(|| ScenarioError::UnknownStep {
            scenario: self.name.clone(),
            step: id.clone(),
        })
    }

    /// Retry limit for a step: its own, else the scenario's.
    pub fn max_retries_for(&self, step: &Step) -> u32 {
        step.validation
            .max_retries
            .unwrap_or(self.global_rules.max_retries)
    }

    fn normalize(&mut self, name: &str) {
        self.name = name.to_string();
        for (id, step) in self.steps.iter_mut() {
            step.id = id.clone();
        }
    }

    /// Checks that the start step and every transition target exist.
    pub fn check_integrity(&self) -> Result<(), ScenarioError> {
        let start = self
            .start_step()
            .ok_or_else(|| ScenarioError::NoSteps(self.name.clone()))?;
        if !self.steps.contains_key(start) {
            return Err(ScenarioError::UnknownStartStep {
                scenario: self.name.clone(),
                step: start.clone(),
            });
        }

        for (id, step) in &self.steps {
            let mut targets: Vec<&StepId> = step
                .on_success()
                .map(|t| t.targets())
                .unwrap_or_default();
            targets.extend(step.on_timeout());

            if let Some(missing) = targets.into_iter().find(|t| !self.steps.contains_key(*t)) {
                return Err(ScenarioError::DanglingTransition {
                    scenario: self.name.clone(),
                    from: id.clone(),
                    target: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

/// All configured scenarios, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, Arc<Scenario>>,
}

impl ScenarioCatalog {
    /// Builds the catalog, rejecting any scenario with a broken graph.
    pub fn new(raw: BTreeMap<String, Scenario>) -> Result<Self, ScenarioError> {
        let mut scenarios = BTreeMap::new();
        for (name, mut scenario) in raw {
            scenario.normalize(&name);
            scenario.check_integrity()?;
            scenarios.insert(name, Arc::new(scenario));
        }
        Ok(Self { scenarios })
    }

    /// Picks a scenario by name, falling back to the first one.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<Scenario>, ScenarioError> {
        if let Some(name) = name {
            if let Some(scenario) = self.scenarios.get(name) {
                return Ok(Arc::clone(scenario));
            }
        }

        let (first_name, first) = self
            .scenarios
            .iter()
            .next()
            .ok_or(ScenarioError::NoScenarios)?;

        if let Some(requested) = name {
            warn!(
                requested = requested,
                fallback = first_name.as_str(),
                "Scenario not found, using first available"
            );
        }
        Ok(Arc::clone(first))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Scenario>> {
        self.scenarios.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
