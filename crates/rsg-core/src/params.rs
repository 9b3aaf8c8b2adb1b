use std::collections::BTreeMap;

use serde_json::Value;

use crate::bounds::Bounds;
use crate::config::Config;
use crate::error::{GenerationError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    String,
}

impl ParamKind {
    fn label(self) -> &'static str {
        match self {
            ParamKind::Bool => "bool",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::String => "string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Int => value.as_i64().is_some(),
            ParamKind::Float => value.as_f64().is_some(),
            ParamKind::String => value.is_string(),
        }
    }
}

/// Default value of an optional parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl ParamDefault {
    pub const fn kind(self) -> ParamKind {
        match self {
            ParamDefault::Bool(_) => ParamKind::Bool,
            ParamDefault::Int(_) => ParamKind::Int,
            ParamDefault::Float(_) => ParamKind::Float,
            ParamDefault::Str(_) => ParamKind::String,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            ParamDefault::Bool(value) => Value::Bool(value),
            ParamDefault::Int(value) => Value::from(value),
            ParamDefault::Float(value) => Value::from(value),
            ParamDefault::Str(value) => Value::from(value),
        }
    }
}

/// Declared parameter of a rule: required, or optional with a default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: Option<ParamDefault>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, default: ParamDefault) -> Self {
        Self {
            name,
            kind: default.kind(),
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Parameter values resolved for one rule invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    rule: String,
    values: BTreeMap<&'static str, Value>,
}

/// Resolve every declared parameter of `rule`.
///
/// Instance attributes (the bounds) are searched first, then the config, then
/// the declared default. Resolution runs at invocation time only, so a missing
/// required value surfaces when the rule is actually picked.
pub fn resolve_params(
    rule: &str,
    specs: &[ParamSpec],
    bounds: &Bounds,
    config: &Config,
) -> Result<Params> {
    let mut values = BTreeMap::new();
    for spec in specs {
        let value = bounds
            .attribute(spec.name)
            .map(Value::from)
            .or_else(|| config.get(spec.name).cloned())
            .or_else(|| spec.default.map(ParamDefault::to_value))
            .ok_or_else(|| GenerationError::missing(rule, spec.name))?;
        if !spec.kind.accepts(&value) {
            return Err(GenerationError::InvalidParam {
                rule: rule.to_string(),
                param: spec.name.to_string(),
                expected: spec.kind.label(),
            });
        }
        values.insert(spec.name, value);
    }
    Ok(Params {
        rule: rule.to_string(),
        values,
    })
}

impl Params {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn require(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| GenerationError::missing(&self.rule, key))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64> {
        self.get_i64(key)
            .ok_or_else(|| GenerationError::missing(&self.rule, key))
    }

    pub fn require_u64(&self, key: &str) -> Result<u64> {
        let value = self.require(key)?;
        value.as_u64().ok_or_else(|| GenerationError::InvalidParam {
            rule: self.rule.clone(),
            param: key.to_string(),
            expected: "non-negative int",
        })
    }

    pub fn require_f64(&self, key: &str) -> Result<f64> {
        self.get_f64(key)
            .ok_or_else(|| GenerationError::missing(&self.rule, key))
    }
}
