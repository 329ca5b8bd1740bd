// src/config/mod.rs

//! Configuration loading and validation for minibuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate paths, globs and the build graph (`validate.rs`).
//! - Capture environment variables once and hand out immutable
//!   snapshots (`env.rs`).

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::{EnvLoader, EnvSnapshot};
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CompileSection, ConfigFile, EnvSection, GraphSection, MarkupSection, PathsSection,
    RawConfigFile, RemapSection, StaticSection, StyleSection, WatchSection,
};
