// src/compose/mod.rs

//! Task composition.
//!
//! - [`graph`] is the `series` / `parallel` expression tree and its parser.
//! - [`composer`] executes an expression against a [`TaskRegistry`] and
//!   aggregates the outcome.
//!
//! [`TaskRegistry`]: crate::task::TaskRegistry

pub mod composer;
pub mod graph;

pub use composer::{Composer, RunSummary, TaskFailure};
pub use graph::{GraphExpr, parallel, series, task};
