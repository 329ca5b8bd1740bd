// src/pipeline/stages/mod.rs

//! Built-in stages.
//!
//! - [`rename`] rewrites the file extension only.
//! - [`remap`] rewrites `@alias/` references to root-absolute `/alias/`.
//! - [`prepend`] injects a fixed header (the style variables import).
//! - [`command`] pipes contents through an external tool.
//! - [`template`] replaces `__NAME__` placeholders from a variable map.
//! - [`json_edit`] overwrites selected top-level keys of a JSON document.

pub mod command;
pub mod json_edit;
pub mod prepend;
pub mod remap;
pub mod rename;
pub mod template;

pub use command::ExternalCommand;
pub use json_edit::JsonEdit;
pub use prepend::Prepend;
pub use remap::PathRemap;
pub use rename::RenameExtension;
pub use template::{Substitution, TemplateSubstitution, substitute};
