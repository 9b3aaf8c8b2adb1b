use std::collections::BTreeMap;
use std::sync::Arc;

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore};
use tracing::{debug, trace};

use rsg_core::{Bounds, Config, GenerationError, Profile, Result, Value, resolve_params};

use crate::model::GenerationReport;
use crate::registry::{Catalog, GeneratorType};
use crate::rule::{Rule, RuleCall, RuleKind};

/// One configured node of the recursion tree.
///
/// Holds the bounds, the weight of every rule available at this depth, the
/// configuration used to satisfy rule parameters, and a lazily created child
/// template one level deeper.
///
/// An instance belongs to a single call stack: `generate` takes `&mut self`,
/// so callers that want parallel generation build one root instance per
/// thread.
#[derive(Debug)]
pub struct Generator {
    ty: Arc<GeneratorType>,
    bounds: Bounds,
    config: Arc<Config>,
    weights: WeightedRules,
    sampler: WeightedIndex<f64>,
    fallback: bool,
    child: Option<Box<Generator>>,
    generated: u64,
    usage: BTreeMap<String, u64>,
}

impl Generator {
    /// Build a root instance.
    ///
    /// Bounds and weights are checked here for the root and for every child
    /// level below it, so a configuration that would leave some depth without
    /// a selectable rule fails at construction rather than mid-generation.
    pub fn new(ty: Arc<GeneratorType>, bounds: Bounds, config: Config) -> Result<Self> {
        bounds.validate()?;
        check_child_levels(&ty, bounds, &config)?;
        Self::with_shared_config(ty, bounds, Arc::new(config))
    }

    pub fn builder(ty: Arc<GeneratorType>) -> GeneratorBuilder {
        GeneratorBuilder {
            ty,
            bounds: Bounds::default(),
            config: Config::default(),
        }
    }

    /// Build the type named by `profile` from `catalog` and instantiate it.
    pub fn from_profile(profile: &Profile, catalog: &Catalog) -> Result<Self> {
        let ty = catalog.build_type(&profile.name, &profile.rule_sets, profile.conflict_policy)?;
        Self::new(ty, profile.bounds, profile.config.clone())
    }

    fn with_shared_config(
        ty: Arc<GeneratorType>,
        bounds: Bounds,
        config: Arc<Config>,
    ) -> Result<Self> {
        let (weights, fallback) = weighted_rules(&ty, &bounds, &config)?;
        let sampler = sampler_for(&weights)?;

        debug!(
            generator = %ty.name(),
            min_depth = bounds.min_depth,
            max_depth = bounds.max_depth,
            available = weights.len(),
            fallback,
            "generator instance created"
        );

        Ok(Self {
            ty,
            bounds,
            config,
            weights,
            sampler,
            fallback,
            child: None,
            generated: 0,
            usage: BTreeMap::new(),
        })
    }

    pub fn generator_type(&self) -> &Arc<GeneratorType> {
        &self.ty
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True when depth filtering left nothing and every rule became available.
    pub fn used_fallback(&self) -> bool {
        self.fallback
    }

    pub fn available_rules(&self) -> Vec<&str> {
        self.weights.iter().map(|(rule, _)| rule.name()).collect()
    }

    /// Weight of `name` at this instance, `None` if the rule is unavailable.
    pub fn weight_of(&self, name: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(rule, _)| rule.name() == name)
            .map(|(_, weight)| *weight)
    }

    /// Draw one rule by weight and invoke it.
    ///
    /// Composite rules receive their child batch before running. Rule
    /// parameters are resolved here, at invocation time.
    pub fn generate(&mut self, rng: &mut dyn RngCore) -> Result<Value> {
        let idx = self.sampler.sample(rng);
        let rule = Arc::clone(&self.weights[idx].0);
        trace!(
            generator = %self.ty.name(),
            rule = rule.name(),
            max_depth = self.bounds.max_depth,
            "rule selected"
        );

        let params = resolve_params(rule.name(), rule.params(), &self.bounds, &self.config)?;
        let children = match rule.kind() {
            RuleKind::Leaf => Vec::new(),
            RuleKind::Composite => self.generate_children(rng)?,
        };

        let value = rule.generate(RuleCall {
            params: &params,
            children,
            rng,
        })?;

        self.generated += 1;
        *self.usage.entry(rule.name().to_string()).or_insert(0) += 1;
        Ok(value)
    }

    /// Child template, created on first access and reused afterwards.
    pub fn child(&mut self) -> Result<&mut Generator> {
        let child = match self.child.take() {
            Some(child) => child,
            None => Box::new(Self::with_shared_config(
                Arc::clone(&self.ty),
                self.bounds.descend(),
                Arc::clone(&self.config),
            )?),
        };
        Ok(&mut **self.child.insert(child))
    }

    /// Produce a batch of children through the child template.
    ///
    /// The batch size is uniform in `[min_breadth, max_breadth]`, and zero once
    /// no depth remains.
    pub fn generate_children(&mut self, rng: &mut dyn RngCore) -> Result<Vec<Value>> {
        let drawn = rng.random_range(self.bounds.min_breadth..=self.bounds.max_breadth);
        let count = if self.bounds.allows_composite() { drawn } else { 0 };
        if count == 0 {
            return Ok(Vec::new());
        }

        let child = self.child()?;
        let mut children = Vec::with_capacity(count as usize);
        for _ in 0..count {
            children.push(child.generate(rng)?);
        }
        Ok(children)
    }

    /// Independent draws pulled from `rng`.
    pub fn values<'a>(&'a mut self, rng: &'a mut dyn RngCore) -> Values<'a> {
        Values {
            generator: self,
            rng,
        }
    }

    /// Usage collected over this instance and its chain of child templates.
    pub fn report(&self) -> GenerationReport {
        let mut report = GenerationReport::new(self.ty.name());
        report.values_generated = self.generated;

        let mut level = Some(self);
        while let Some(generator) = level {
            report.record_instance(generator.fallback);
            for (rule, count) in &generator.usage {
                report.record_rule_usage(rule, *count);
            }
            level = generator.child.as_deref();
        }
        report
    }
}

type WeightedRules = Vec<(Arc<dyn Rule>, f64)>;

/// Rules selectable under `bounds`, with their weights. The flag is set when
/// depth filtering left nothing and the full table was used instead.
fn weighted_rules(
    ty: &GeneratorType,
    bounds: &Bounds,
    config: &Config,
) -> Result<(WeightedRules, bool)> {
    let mut available: Vec<Arc<dyn Rule>> = ty
        .rules()
        .iter()
        .filter(|rule| match rule.kind() {
            RuleKind::Leaf => bounds.allows_leaf(),
            RuleKind::Composite => bounds.allows_composite(),
        })
        .cloned()
        .collect();

    let fallback = available.is_empty();
    if fallback {
        available = ty.rules().to_vec();
    }

    let mut weights = Vec::with_capacity(available.len());
    for rule in available {
        let weight = config.chance(rule.name())?;
        weights.push((rule, weight));
    }
    Ok((weights, fallback))
}

fn sampler_for(weights: &[(Arc<dyn Rule>, f64)]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights.iter().map(|(_, weight)| *weight)).map_err(|_| {
        GenerationError::DegenerateWeights {
            rules: weights
                .iter()
                .map(|(rule, _)| rule.name().to_string())
                .collect(),
        }
    })
}

/// Walk the bounds every child template would get until they stop changing.
fn check_child_levels(ty: &GeneratorType, bounds: Bounds, config: &Config) -> Result<()> {
    let mut level = bounds;
    loop {
        let next = level.descend();
        if next == level {
            return Ok(());
        }
        let (weights, _) = weighted_rules(ty, &next, config)?;
        sampler_for(&weights)?;
        level = next;
    }
}

/// Pulls values from the thread-local random source.
///
/// Draws are not reproducible across runs; use [`Generator::values`] with a
/// seeded rng for that.
impl Iterator for Generator {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate(&mut rand::rng()))
    }
}

/// Iterator returned by [`Generator::values`].
pub struct Values<'a> {
    generator: &'a mut Generator,
    rng: &'a mut dyn RngCore,
}

impl Iterator for Values<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generator.generate(&mut *self.rng))
    }
}

/// Fluent construction of a root instance: bounds plus config entries.
#[derive(Debug)]
pub struct GeneratorBuilder {
    ty: Arc<GeneratorType>,
    bounds: Bounds,
    config: Config,
}

impl GeneratorBuilder {
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn depth(mut self, min_depth: u32, max_depth: u32) -> Self {
        self.bounds = self.bounds.with_depth(min_depth, max_depth);
        self
    }

    pub fn breadth(mut self, min_breadth: u32, max_breadth: u32) -> Self {
        self.bounds = self.bounds.with_breadth(min_breadth, max_breadth);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key, value);
        self
    }

    /// Shorthand for `set("<rule>_chance", weight)`.
    pub fn chance(self, rule: &str, weight: f64) -> Self {
        self.set(Config::chance_key(rule), weight)
    }

    pub fn build(self) -> Result<Generator> {
        Generator::new(self.ty, self.bounds, self.config)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::registry::{DEFAULT_RULE, RuleSet};

    fn letters() -> Arc<GeneratorType> {
        GeneratorType::from_rule_set(
            RuleSet::new("letters")
                .leaf("a", |_| Ok(Value::from("A")))
                .leaf("b", |_| Ok(Value::from("B"))),
        )
        .unwrap()
    }

    fn lists() -> Arc<GeneratorType> {
        GeneratorType::from_rule_set(
            RuleSet::new("lists")
                .composite("list", |call| Ok(Value::List(call.children)))
                .leaf("a", |_| Ok(Value::from("A"))),
        )
        .unwrap()
    }

    #[test]
    fn min_depth_hides_leaves() {
        let generator = Generator::builder(lists()).depth(1, 3).build().unwrap();
        assert_eq!(generator.available_rules(), vec!["list"]);
        assert!(!generator.used_fallback());
    }

    #[test]
    fn zero_max_depth_hides_composites() {
        let generator = Generator::builder(lists()).depth(0, 0).build().unwrap();
        assert_eq!(generator.available_rules(), vec!["a"]);
    }

    #[test]
    fn fallback_exposes_every_rule() {
        let generator = Generator::builder(letters()).depth(10, 11).build().unwrap();
        assert!(generator.used_fallback());
        assert_eq!(generator.available_rules(), vec!["a", "b"]);
    }

    #[test]
    fn weights_come_from_chance_keys() {
        let generator = Generator::builder(letters())
            .chance("a", 0.1)
            .build()
            .unwrap();
        assert_eq!(generator.weight_of("a"), Some(0.1));
        assert_eq!(generator.weight_of("b"), Some(1.0));
        assert_eq!(generator.weight_of("missing"), None);
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        let result = Generator::builder(letters())
            .chance("a", 0.0)
            .chance("b", 0.0)
            .build();
        assert!(matches!(result, Err(GenerationError::DegenerateWeights { rules }) if rules.len() == 2));
    }

    #[test]
    fn zero_weight_leaf_below_root_fails_at_construction() {
        let ty = GeneratorType::builder("int_list")
            .include(crate::builtins::primitives::int_rules())
            .include(crate::builtins::collections::list_rules())
            .build()
            .unwrap();

        let result = Generator::builder(Arc::clone(&ty))
            .depth(0, 2)
            .chance("int", 0.0)
            .build();
        assert!(matches!(
            result,
            Err(GenerationError::DegenerateWeights { rules }) if rules == vec!["int".to_string()]
        ));

        let mut generator = Generator::builder(ty)
            .depth(0, 2)
            .chance("list", 0.0)
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            assert!(generator.generate(&mut rng).unwrap().as_i64().is_some());
        }
    }

    #[test]
    fn zero_weight_rule_is_never_chosen() {
        let mut generator = Generator::builder(letters())
            .chance("a", 0.0)
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(generator.generate(&mut rng).unwrap(), Value::from("B"));
        }
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let result = Generator::builder(letters()).breadth(4, 2).build();
        assert!(matches!(result, Err(GenerationError::InvalidBounds(_))));
    }

    #[test]
    fn child_template_is_memoized() {
        let mut generator = Generator::builder(lists()).depth(2, 3).build().unwrap();
        let first = generator.child().unwrap() as *const Generator;
        let second = generator.child().unwrap() as *const Generator;
        assert_eq!(first, second);

        let child = generator.child().unwrap();
        assert_eq!(child.bounds().min_depth, 1);
        assert_eq!(child.bounds().max_depth, 2);
        assert_eq!(child.available_rules(), vec!["list"]);
    }

    #[test]
    fn children_respect_breadth() {
        let mut generator = Generator::builder(lists())
            .depth(0, 2)
            .breadth(2, 3)
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let children = generator.generate_children(&mut rng).unwrap();
            assert!((2..=3).contains(&children.len()));
        }
    }

    #[test]
    fn no_children_without_depth() {
        let mut generator = Generator::builder(lists())
            .depth(0, 0)
            .breadth(5, 5)
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(generator.generate_children(&mut rng).unwrap().is_empty());
        assert!(generator.child.is_none());
    }

    #[test]
    fn report_aggregates_child_chain() {
        let ty = GeneratorType::builder("empty").build().unwrap();
        let mut generator = Generator::builder(ty).build().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for value in generator.values(&mut rng).take(4) {
            assert!(value.unwrap().is_null());
        }
        let report = generator.report();
        assert_eq!(report.values_generated, 4);
        assert_eq!(report.rule_usage.get(DEFAULT_RULE), Some(&4));
        assert_eq!(report.instances, 1);
    }
}
