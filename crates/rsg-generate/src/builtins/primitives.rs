use rand::Rng;
use rand::seq::IndexedRandom;

use rsg_core::{GenerationError, ParamDefault, ParamSpec, Result, Value};

use crate::registry::RuleSet;
use crate::rule::{Rule, RuleCall, RuleKind};

pub const DEFAULT_MAX_INT: i64 = 1000;
pub const DEFAULT_MAX_FLOAT: f64 = 1000.0;
pub const DEFAULT_MIN_STR_LEN: i64 = 4;
pub const DEFAULT_MAX_STR_LEN: i64 = 10;

/// ASCII letters, digits and punctuation.
pub const STR_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

const INT_PARAMS: &[ParamSpec] = &[ParamSpec::optional(
    "max_int_val",
    ParamDefault::Int(DEFAULT_MAX_INT),
)];
const FLOAT_PARAMS: &[ParamSpec] = &[ParamSpec::optional(
    "max_float_val",
    ParamDefault::Float(DEFAULT_MAX_FLOAT),
)];
const STR_PARAMS: &[ParamSpec] = &[
    ParamSpec::optional("min_str_len", ParamDefault::Int(DEFAULT_MIN_STR_LEN)),
    ParamSpec::optional("max_str_len", ParamDefault::Int(DEFAULT_MAX_STR_LEN)),
];

pub fn int_rules() -> RuleSet {
    RuleSet::new("int").rule(IntRule)
}

pub fn float_rules() -> RuleSet {
    RuleSet::new("float").rule(FloatRule)
}

pub fn str_rules() -> RuleSet {
    RuleSet::new("str").rule(StrRule)
}

/// Uniform integer in `[0, max_int_val]`.
struct IntRule;

impl Rule for IntRule {
    fn name(&self) -> &str {
        "int"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Leaf
    }

    fn params(&self) -> &[ParamSpec] {
        INT_PARAMS
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        let max = call.params.require_i64("max_int_val")?;
        if max < 0 {
            return Err(GenerationError::rule("int", "max_int_val must be >= 0"));
        }
        Ok(Value::Int(call.rng.random_range(0..=max)))
    }
}

/// Uniform float in `[0, max_float_val)`.
struct FloatRule;

impl Rule for FloatRule {
    fn name(&self) -> &str {
        "float"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Leaf
    }

    fn params(&self) -> &[ParamSpec] {
        FLOAT_PARAMS
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        let max = call.params.require_f64("max_float_val")?;
        Ok(Value::Float(call.rng.random::<f64>() * max))
    }
}

struct StrRule;

impl Rule for StrRule {
    fn name(&self) -> &str {
        "str"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Leaf
    }

    fn params(&self) -> &[ParamSpec] {
        STR_PARAMS
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        let (min_len, max_len) = length_range(
            "str",
            call.params.require_i64("min_str_len")?,
            call.params.require_i64("max_str_len")?,
            "min_str_len",
        )?;
        let len = call.rng.random_range(min_len..=max_len);
        Ok(Value::Str(random_text(call.rng, STR_CHARSET, len)))
    }
}

/// Validate an inclusive length range read from two parameters.
pub(crate) fn length_range(
    rule: &str,
    min: i64,
    max: i64,
    min_key: &str,
) -> Result<(usize, usize)> {
    if min < 0 {
        return Err(GenerationError::rule(rule, format!("{min_key} must be >= 0")));
    }
    if min > max {
        return Err(GenerationError::rule(
            rule,
            format!("{min_key} ({min}) must be <= max ({max})"),
        ));
    }
    Ok((min as usize, max as usize))
}

pub(crate) fn random_text(rng: &mut dyn rand::RngCore, charset: &[u8], len: usize) -> String {
    (0..len)
        .filter_map(|_| charset.choose(rng).map(|byte| *byte as char))
        .collect()
}
