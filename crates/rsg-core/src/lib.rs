//! Core contracts for rsg.
//!
//! This crate defines the generated value tree, the error taxonomy, depth and
//! breadth bounds, generator configuration, declarative rule parameters and
//! the on-disk profile format shared by the engine and the CLI.

pub mod bounds;
pub mod config;
pub mod error;
pub mod params;
pub mod profile;
pub mod value;

pub use bounds::Bounds;
pub use config::{CHANCE_SUFFIX, Config, DEFAULT_CHANCE};
pub use error::{GenerationError, ProfileError, Result};
pub use params::{ParamDefault, ParamKind, ParamSpec, Params, resolve_params};
pub use profile::{ConflictPolicy, Profile, load_profile, profile_json_schema};
pub use value::Value;

/// Current contract version for profile files.
pub const PROFILE_VERSION: &str = "0.1";
