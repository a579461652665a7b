use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::template::{SiteCondition, TemplateSettings, Trade};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Sequence number of the last citation committed to this project's ledger.
    pub ledger_version: u64,
    pub settings: TemplateSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
}

/// Typed view of a project's live citations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectDna {
    pub project_id: Uuid,
    pub name: Option<String>,
    pub location: Option<String>,
    pub work_type: Option<String>,
    pub gfa_sqft: Option<f64>,
    pub trade: Option<Trade>,
    pub site_condition: SiteCondition,
    pub demolition_unit_price: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Pre-tax net total captured by the template lock.
    pub template_net_total: Option<f64>,
    pub team_invites: usize,
    pub uploads: usize,
    pub finalized: bool,
    pub ledger_version: u64,
    pub citation_count: usize,
}
