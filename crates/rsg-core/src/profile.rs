use std::path::Path;

use schemars::JsonSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::config::Config;
use crate::error::ProfileError;

/// How a merge step treats two rule sets defining the same rule name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The later definition replaces the earlier one.
    #[default]
    LastWins,
    /// Duplicate names are a configuration error.
    Error,
}

/// A generator described in a TOML or JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    /// Display name of the generator type.
    pub name: String,
    /// Named rule sets merged, in order, into one generator type.
    #[serde(default)]
    pub rule_sets: Vec<String>,
    /// Policy for rule names defined by more than one rule set.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// Depth and breadth bounds of the root instance.
    #[serde(flatten)]
    pub bounds: Bounds,
    /// Number of values produced per run.
    #[serde(default = "default_count")]
    pub count: u64,
    /// Optional seed for a deterministic random source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Rule weights (`<rule>_chance`) and rule parameters.
    #[serde(default, skip_serializing_if = "Config::is_empty")]
    pub config: Config,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_sets: Vec::new(),
            conflict_policy: ConflictPolicy::default(),
            bounds: Bounds::default(),
            count: default_count(),
            seed: None,
            config: Config::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::Invalid("name must not be empty".to_string()));
        }
        if self.count == 0 {
            return Err(ProfileError::Invalid("count must be > 0".to_string()));
        }
        if let Some(name) = self.rule_sets.iter().find(|name| name.trim().is_empty()) {
            return Err(ProfileError::Invalid(format!(
                "rule set name '{name}' must not be blank"
            )));
        }
        self.bounds
            .validate()
            .map_err(|err| ProfileError::Invalid(err.to_string()))
    }
}

/// Load and validate a profile; `.json` files are parsed as JSON, anything
/// else as TOML.
pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let profile: Profile = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    profile.validate()?;
    Ok(profile)
}

/// Emit the JSON Schema for profile files.
pub fn profile_json_schema() -> RootSchema {
    schema_for!(Profile)
}

fn default_count() -> u64 {
    10
}
