use rand::Rng;
use rand::seq::IndexedRandom;

use rsg_core::{ParamDefault, ParamSpec, Result, Value};

use crate::builtins::primitives::{length_range, random_text};
use crate::registry::RuleSet;
use crate::rule::{Rule, RuleCall, RuleKind};

pub const DEFAULT_MIN_KEY_LEN: i64 = 4;
pub const DEFAULT_MAX_KEY_LEN: i64 = 10;

const KEY_HEAD: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const KEY_TAIL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

const DICT_PARAMS: &[ParamSpec] = &[
    ParamSpec::optional("min_key_len", ParamDefault::Int(DEFAULT_MIN_KEY_LEN)),
    ParamSpec::optional("max_key_len", ParamDefault::Int(DEFAULT_MAX_KEY_LEN)),
];

pub fn dict_rules() -> RuleSet {
    RuleSet::new("dict").rule(DictRule)
}

pub fn list_rules() -> RuleSet {
    RuleSet::new("list").rule(ListRule)
}

pub fn tuple_rules() -> RuleSet {
    RuleSet::new("tuple").rule(TupleRule)
}

/// One random identifier-like key per child.
struct DictRule;

impl Rule for DictRule {
    fn name(&self) -> &str {
        "dict"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Composite
    }

    fn params(&self) -> &[ParamSpec] {
        DICT_PARAMS
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        let (min_len, max_len) = length_range(
            "dict",
            call.params.require_i64("min_key_len")?,
            call.params.require_i64("max_key_len")?,
            "min_key_len",
        )?;

        let mut entries = Vec::with_capacity(call.children.len());
        for child in call.children {
            let len = call.rng.random_range(min_len..=max_len);
            entries.push((random_key(call.rng, len), child));
        }
        Ok(Value::Dict(entries))
    }
}

/// Keys always start with a letter, so even a zero length yields one char.
fn random_key(rng: &mut dyn rand::RngCore, len: usize) -> String {
    let mut key = String::with_capacity(len.max(1));
    if let Some(head) = KEY_HEAD.choose(rng) {
        key.push(*head as char);
    }
    key.push_str(&random_text(rng, KEY_TAIL, len.saturating_sub(1)));
    key
}

struct ListRule;

impl Rule for ListRule {
    fn name(&self) -> &str {
        "list"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Composite
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        Ok(Value::List(call.children))
    }
}

struct TupleRule;

impl Rule for TupleRule {
    fn name(&self) -> &str {
        "tuple"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Composite
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        Ok(Value::Tuple(call.children))
    }
}
