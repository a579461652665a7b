use thiserror::Error;
use uuid::Uuid;

use crate::models::CiteType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("citation {0} not found")]
    CitationNotFound(Uuid),

    #[error("template item {0} not found")]
    ItemNotFound(Uuid),

    #[error("team member {0} not found")]
    MemberNotFound(Uuid),

    #[error("ledger version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("project is missing required facts: {}", format_types(.0))]
    Incomplete(Vec<CiteType>),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("database lock poisoned")]
    LockPoisoned,
}

fn format_types(types: &[CiteType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
