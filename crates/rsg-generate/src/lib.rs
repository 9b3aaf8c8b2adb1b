//! Randomized structured-data generation engine for rsg.
//!
//! Rules are grouped into rule sets, merged into a generator type, and driven
//! by generator instances that recurse with decaying depth until only leaf
//! rules remain.

pub mod builtins;
pub mod generator;
pub mod model;
pub mod registry;
pub mod rule;

pub use generator::{Generator, GeneratorBuilder, Values};
pub use model::GenerationReport;
pub use registry::{Catalog, DEFAULT_RULE, GeneratorType, GeneratorTypeBuilder, RuleSet};
pub use rule::{FnRule, Rule, RuleCall, RuleKind};
pub use rsg_core::{Bounds, Config, GenerationError, ParamDefault, ParamKind, ParamSpec, Value};
