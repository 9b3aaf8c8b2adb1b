use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use rsg_core::profile::ConflictPolicy;
use rsg_core::{GenerationError, ParamSpec, Result, Value};

use crate::builtins;
use crate::rule::{FnRule, Rule, RuleCall, RuleKind};

/// Name of the no-op leaf rule synthesized for types with no rules.
pub const DEFAULT_RULE: &str = "default";

/// A rule-bearing definition: a named group of rules registered explicitly.
#[derive(Clone, Default)]
pub struct RuleSet {
    name: String,
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn shared_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn leaf<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.rule(FnRule::leaf(name, func))
    }

    pub fn leaf_with<F>(self, name: impl Into<String>, params: &[ParamSpec], func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.rule(FnRule::new(name, RuleKind::Leaf, params, func))
    }

    pub fn composite<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.rule(FnRule::composite(name, func))
    }

    pub fn composite_with<F>(self, name: impl Into<String>, params: &[ParamSpec], func: F) -> Self
    where
        F: Fn(RuleCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.rule(FnRule::new(name, RuleKind::Composite, params, func))
    }

    /// Append every rule of `other`; name conflicts are settled at merge time.
    pub fn extend(mut self, other: &RuleSet) -> Self {
        self.rules.extend(other.rules.iter().cloned());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish()
    }
}

/// A concrete generator type: one deduplicated rule table.
///
/// Built once by [`GeneratorTypeBuilder::build`] and shared read-only by every
/// instance created from it.
pub struct GeneratorType {
    name: String,
    rules: Vec<Arc<dyn Rule>>,
}

impl GeneratorType {
    pub fn builder(name: impl Into<String>) -> GeneratorTypeBuilder {
        GeneratorTypeBuilder {
            name: name.into(),
            sets: Vec::new(),
            policy: ConflictPolicy::default(),
        }
    }

    /// Shorthand for a type made of a single rule set.
    pub fn from_rule_set(set: RuleSet) -> Result<Arc<Self>> {
        Self::builder(set.name().to_string()).include(set).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorType")
            .field("name", &self.name)
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// Merge step collecting rule sets into a [`GeneratorType`].
#[derive(Debug)]
pub struct GeneratorTypeBuilder {
    name: String,
    sets: Vec<RuleSet>,
    policy: ConflictPolicy,
}

impl GeneratorTypeBuilder {
    pub fn include(mut self, set: RuleSet) -> Self {
        self.sets.push(set);
        self
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Union of all included rules, deduplicated by name.
    ///
    /// Under `LastWins` a later definition replaces the earlier one in its
    /// original slot, so rule order stays stable across merges.
    pub fn build(self) -> Result<Arc<GeneratorType>> {
        let mut rules: Vec<Arc<dyn Rule>> = Vec::new();
        for set in &self.sets {
            for rule in set.rules() {
                match rules.iter().position(|existing| existing.name() == rule.name()) {
                    None => rules.push(Arc::clone(rule)),
                    Some(_) if self.policy == ConflictPolicy::Error => {
                        return Err(GenerationError::DuplicateRule(rule.name().to_string()));
                    }
                    Some(idx) => {
                        debug!(
                            generator = %self.name,
                            rule = rule.name(),
                            rule_set = set.name(),
                            "rule overridden"
                        );
                        rules[idx] = Arc::clone(rule);
                    }
                }
            }
        }

        if rules.is_empty() {
            rules.push(Arc::new(FnRule::leaf(DEFAULT_RULE, |_| Ok(Value::Null))));
        }

        debug!(
            generator = %self.name,
            rule_sets = self.sets.len(),
            rules = rules.len(),
            "generator type built"
        );

        Ok(Arc::new(GeneratorType {
            name: self.name,
            rules,
        }))
    }
}

/// Named rule sets that profiles can refer to.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sets: BTreeMap<String, RuleSet>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding every built-in rule set.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtins::register(&mut catalog);
        catalog
    }

    pub fn register(&mut self, set: RuleSet) {
        self.sets.insert(set.name().to_string(), set);
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.sets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Merge the named rule sets, in order, into one generator type.
    pub fn build_type(
        &self,
        name: &str,
        set_names: &[String],
        policy: ConflictPolicy,
    ) -> Result<Arc<GeneratorType>> {
        let mut builder = GeneratorType::builder(name).conflict_policy(policy);
        for set_name in set_names {
            let set = self
                .get(set_name)
                .ok_or_else(|| GenerationError::UnknownRuleSet(set_name.clone()))?;
            builder = builder.include(set.clone());
        }
        builder.build()
    }
}
