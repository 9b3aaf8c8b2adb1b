//! Built-in rule sets: scalar leaves and the standard containers.

pub mod collections;
pub mod primitives;

use crate::registry::{Catalog, RuleSet};

pub const BASE_RULE_SET: &str = "base";

/// Register every built-in rule set, plus their union under `base`.
pub fn register(catalog: &mut Catalog) {
    for set in rule_sets() {
        catalog.register(set);
    }
    catalog.register(base_rule_set());
}

/// The individual built-in rule sets, one rule each.
pub fn rule_sets() -> Vec<RuleSet> {
    vec![
        primitives::int_rules(),
        primitives::float_rules(),
        primitives::str_rules(),
        collections::dict_rules(),
        collections::list_rules(),
        collections::tuple_rules(),
    ]
}

/// Union of every built-in rule.
pub fn base_rule_set() -> RuleSet {
    rule_sets()
        .iter()
        .fold(RuleSet::new(BASE_RULE_SET), |base, set| base.extend(set))
}
