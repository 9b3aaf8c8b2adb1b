use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, Result};

/// Suffix of the per-rule weight keys (`<rule>_chance`).
pub const CHANCE_SUFFIX: &str = "_chance";

/// Weight of a rule with no explicit `<rule>_chance` entry.
pub const DEFAULT_CHANCE: f64 = 1.0;

/// Open-ended named values attached to a generator instance.
///
/// Holds per-rule weights and the values consumed by rule parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn chance_key(rule: &str) -> String {
        format!("{rule}{CHANCE_SUFFIX}")
    }

    /// Relative selection weight of `rule`.
    ///
    /// Weights are raw magnitudes handed to a weighted draw; they are not
    /// normalized against each other.
    pub fn chance(&self, rule: &str) -> Result<f64> {
        let Some(value) = self.values.get(&Self::chance_key(rule)) else {
            return Ok(DEFAULT_CHANCE);
        };
        let invalid = || GenerationError::InvalidWeight {
            rule: rule.to_string(),
            value: value.to_string(),
        };
        let weight = value.as_f64().ok_or_else(invalid)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid());
        }
        Ok(weight)
    }
}
