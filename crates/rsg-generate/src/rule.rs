use std::fmt;

use rand::RngCore;

use rsg_core::{ParamSpec, Params, Result, Value};

/// Whether a rule recurses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Produces a value directly.
    Leaf,
    /// Combines a batch of recursively generated children.
    Composite,
}

impl RuleKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, RuleKind::Leaf)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Leaf => "leaf",
            RuleKind::Composite => "composite",
        }
    }
}

/// Inputs of a single rule invocation.
pub struct RuleCall<'a> {
    /// Declared parameters resolved against the owning instance.
    pub params: &'a Params,
    /// Child values in generation order; always empty for leaf rules.
    pub children: Vec<Value>,
    pub rng: &'a mut dyn RngCore,
}

/// A named generation capability.
///
/// Rules are created once, shared read-only by every instance of the
/// generator types that include them, and never mutated.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> RuleKind;

    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value>;
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

type RuleFn = dyn Fn(RuleCall<'_>) -> Result<Value> + Send + Sync;

/// Rule backed by a closure.
pub struct FnRule {
    name: String,
    kind: RuleKind,
    params: Vec<ParamSpec>,
    func: Box<RuleFn>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, kind: RuleKind, params: &[ParamSpec], func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            params: params.to_vec(),
            func: Box::new(func),
        }
    }

    pub fn leaf<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, RuleKind::Leaf, &[], func)
    }

    pub fn composite<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, RuleKind::Composite, &[], func)
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RuleKind {
        self.kind
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn generate(&self, call: RuleCall<'_>) -> Result<Value> {
        (self.func)(call)
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
