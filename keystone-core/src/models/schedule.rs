use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gantt row derived from the project dates, site condition and template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseTask {
    pub phase: Phase,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration_days: i64,
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Demolition,
    Preparation,
    Installation,
    Finishing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demolition => "demolition",
            Self::Preparation => "preparation",
            Self::Installation => "installation",
            Self::Finishing => "finishing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Demolition => "Demolition & Removal",
            Self::Preparation => "Site Preparation",
            Self::Installation => "Installation",
            Self::Finishing => "Finishing & Cleanup",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}
