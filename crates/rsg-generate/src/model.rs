use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Usage summary for a root generator and its child templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generator: String,
    /// Values returned by the root instance.
    pub values_generated: u64,
    /// Rule invocations across every depth level.
    pub rule_usage: BTreeMap<String, u64>,
    /// Instances in the child-template chain, the root included.
    pub instances: u64,
    /// Instances whose depth filtering fell back to the full rule set.
    pub fallback_instances: u64,
}

impl GenerationReport {
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            ..Self::default()
        }
    }

    pub fn record_rule_usage(&mut self, rule: &str, count: u64) {
        *self.rule_usage.entry(rule.to_string()).or_insert(0) += count;
    }

    pub fn record_instance(&mut self, fallback: bool) {
        self.instances += 1;
        if fallback {
            self.fallback_instances += 1;
        }
    }

    pub fn invocations(&self) -> u64 {
        self.rule_usage.values().sum()
    }
}
