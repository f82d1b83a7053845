//! verso-core library.
//!
//! Versioned history for generated creative content: every snapshot is an
//! immutable [`model::Version`] inside a per-content [`model::Lineage`], and
//! [`engine::LineageEngine`] exposes branching, rollback, diffing, search
//! and generation analytics over that history.
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`error::LineageError`]; config
//!   loading uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Mutation**: state only changes through [`store::VersionStore::apply`].

pub mod analytics;
pub mod branch;
pub mod clock;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod journal;
pub mod lock;
pub mod model;
pub mod search;
pub mod store;
pub mod tree;

pub use engine::LineageEngine;
pub use error::{ErrorCode, LineageError};
