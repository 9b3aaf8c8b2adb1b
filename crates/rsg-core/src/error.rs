use thiserror::Error;

/// Errors surfaced while building or running a generator.
///
/// Generation is pure computation over a random source, so every variant is a
/// configuration or programming error. Nothing is retried and no partial value
/// is ever returned.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A required rule parameter has no instance attribute or config entry.
    #[error("missing configuration: rule '{rule}' requires '{param}'")]
    MissingConfiguration { rule: String, param: String },
    /// Every available rule has weight zero.
    #[error("degenerate weights: all available rules have zero weight ({})", rules.join(", "))]
    DegenerateWeights { rules: Vec<String> },
    /// A `<rule>_chance` value is negative, not finite, or not a number.
    #[error("invalid weight for rule '{rule}': {value}")]
    InvalidWeight { rule: String, value: String },
    /// A min bound exceeds its max bound.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    /// A configuration value does not match the parameter kind.
    #[error("invalid parameter '{param}' for rule '{rule}': expected {expected}")]
    InvalidParam {
        rule: String,
        param: String,
        expected: &'static str,
    },
    /// Two merged rule sets define the same rule name under a strict policy.
    #[error("duplicate rule: {0}")]
    DuplicateRule(String),
    /// A profile or builder referenced a rule set nobody registered.
    #[error("unknown rule set: {0}")]
    UnknownRuleSet(String),
    /// A rule implementation rejected its resolved inputs.
    #[error("rule '{rule}' failed: {message}")]
    Rule { rule: String, message: String },
}

impl GenerationError {
    pub fn missing(rule: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            rule: rule.into(),
            param: param.into(),
        }
    }

    pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for generation results.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised while loading a profile file.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid profile: {0}")]
    Invalid(String),
}
