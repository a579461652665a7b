//! Keystone server: HTTP API, MCP tools and blob storage on top of
//! `keystone-core`.

pub mod api;
pub mod config;
pub mod generator;
pub mod mcp;
pub mod storage;

pub use keystone_core::{db, models};
