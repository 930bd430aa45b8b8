//! tasktable - Task Table Library
//!
//! This library provides the core functionality for the tasktable CLI,
//! a sortable, filterable, paginated view over an in-memory task list.
//!
//! # Core Concepts
//!
//! - **Task list**: the canonical collection, fetched once and mutated in place
//! - **Derivation**: filter, sort and window recomputed on every read
//! - **Display modes**: numbered pages or an accumulating scroll window
//! - **Load more**: a delayed, cancellable append of the next chunk
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tasktable.toml`
//! - `error`: Error types and result aliases
//! - `output`: Human and JSON output for commands
//! - `pipeline`: Filter, sort and windowing stages
//! - `scroll`: Infinite-scroll trigger and load-more timer
//! - `source`: Where the task list comes from
//! - `task`: Task records and mutations
//! - `ui`: Interactive terminal view

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod scroll;
pub mod source;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
