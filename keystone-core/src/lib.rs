//! Core library for Keystone.
//!
//! This crate provides the citation ledger, the cost rollup and GFA parsing
//! rules, and the database operations that persist them, independent of any
//! transport layer (HTTP, MCP, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use keystone_core::db::Database;
//! use keystone_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let project = db.create_project(CreateProjectInput {
//!     name: "Basement finish".into(),
//! })?;
//! let ledger = db.load_ledger(project.id)?;
//! assert_eq!(ledger.version(), 1);
//! # Ok::<(), keystone_core::Error>(())
//! ```

pub mod catalog;
pub mod db;
pub mod dna;
pub mod error;
pub mod gfa;
pub mod ledger;
pub mod models;
pub mod rollup;
pub mod schedule;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use rollup::{CostSummary, Pricing};
