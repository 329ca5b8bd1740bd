// src/watch/mod.rs

//! Watch mode.
//!
//! - [`binding`] pairs a path pattern set with the graph it retriggers.
//! - [`hash`] optionally drops events whose file content did not change.
//! - [`watcher`] turns `notify` events into per-path [`ChangeEvent`]s.
//! - [`controller`] dispatches change events to composer runs.

pub mod binding;
pub mod controller;
pub mod hash;
pub mod watcher;

pub use binding::{WatchBinding, relative_str};
pub use controller::{BindingState, RunOutcome, WatchController, WatchNotice};
pub use hash::ContentHashes;
pub use watcher::{ChangeEvent, WatcherHandle, spawn_watcher};
