use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

pub const DEFAULT_MIN_DEPTH: u32 = 0;
pub const DEFAULT_MAX_DEPTH: u32 = 4;
pub const DEFAULT_MIN_BREADTH: u32 = 2;
pub const DEFAULT_MAX_BREADTH: u32 = 4;

/// Depth and breadth bounds of one generator instance.
///
/// Min bounds only restrict which rules are available at an instance; they
/// never force a composite rule to recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Bounds {
    /// Leaf rules are unavailable while this is above zero.
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,
    /// Remaining recursion levels; composite rules need at least one.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Smallest number of children per composite value.
    #[serde(default = "default_min_breadth")]
    pub min_breadth: u32,
    /// Largest number of children per composite value.
    #[serde(default = "default_max_breadth")]
    pub max_breadth: u32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
            min_breadth: DEFAULT_MIN_BREADTH,
            max_breadth: DEFAULT_MAX_BREADTH,
        }
    }
}

impl Bounds {
    pub fn new(min_depth: u32, max_depth: u32, min_breadth: u32, max_breadth: u32) -> Self {
        Self {
            min_depth,
            max_depth,
            min_breadth,
            max_breadth,
        }
    }

    pub fn with_depth(mut self, min_depth: u32, max_depth: u32) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    pub fn with_breadth(mut self, min_breadth: u32, max_breadth: u32) -> Self {
        self.min_breadth = min_breadth;
        self.max_breadth = max_breadth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_depth > self.max_depth {
            return Err(GenerationError::InvalidBounds(format!(
                "min_depth ({}) must be <= max_depth ({})",
                self.min_depth, self.max_depth
            )));
        }
        if self.min_breadth > self.max_breadth {
            return Err(GenerationError::InvalidBounds(format!(
                "min_breadth ({}) must be <= max_breadth ({})",
                self.min_breadth, self.max_breadth
            )));
        }
        Ok(())
    }

    /// Bounds of the child template: both depths drop by one, floored at zero.
    pub fn descend(&self) -> Self {
        Self {
            min_depth: self.min_depth.saturating_sub(1),
            max_depth: self.max_depth.saturating_sub(1),
            ..*self
        }
    }

    pub fn allows_leaf(&self) -> bool {
        self.min_depth == 0
    }

    pub fn allows_composite(&self) -> bool {
        self.max_depth > 0
    }

    /// Instance attribute lookup used before falling back to config.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        match name {
            "min_depth" => Some(self.min_depth),
            "max_depth" => Some(self.max_depth),
            "min_breadth" => Some(self.min_breadth),
            "max_breadth" => Some(self.max_breadth),
            _ => None,
        }
    }
}

fn default_min_depth() -> u32 {
    DEFAULT_MIN_DEPTH
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_min_breadth() -> u32 {
    DEFAULT_MIN_BREADTH
}

fn default_max_breadth() -> u32 {
    DEFAULT_MAX_BREADTH
}
