use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An immutable record of one user-confirmed project fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Position in the project's ledger. Strictly increasing, starts at 1.
    pub seq: u64,
    pub cite_type: CiteType,
    pub question_key: String,
    pub answer: String,
    pub value: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Chat message this fact was confirmed in, if any.
    pub message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub superseded_at: Option<DateTime<Utc>>,
}

impl Citation {
    pub fn is_live(&self) -> bool {
        self.superseded_at.is_none()
    }

    /// Numeric `value`, if the citation carries one.
    pub fn value_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CiteType {
    ProjectName,
    Location,
    WorkType,
    GfaLock,
    TradeSelection,
    TemplateLock,
    TeamSize,
    ExecutionMode,
    SiteCondition,
    DemolitionPrice,
    Timeline,
    EndDate,
    BlueprintUpload,
    SitePhoto,
    VisualVerification,
    DnaFinalized,
    TeamMemberInvite,
    TeamStructure,
    TeamPermissionSet,
    Contract,
}

/// Whether a newer citation of the same type replaces the older one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Singleton,
    Multi,
}

/// The onboarding step a fact belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    Identity,
    Area,
    Trade,
    Template,
    Team,
    Conditions,
    Schedule,
    Verification,
    Finalization,
}

impl CiteType {
    pub const ALL: [CiteType; 20] = [
        Self::ProjectName,
        Self::Location,
        Self::WorkType,
        Self::GfaLock,
        Self::TradeSelection,
        Self::TemplateLock,
        Self::TeamSize,
        Self::ExecutionMode,
        Self::SiteCondition,
        Self::DemolitionPrice,
        Self::Timeline,
        Self::EndDate,
        Self::BlueprintUpload,
        Self::SitePhoto,
        Self::VisualVerification,
        Self::DnaFinalized,
        Self::TeamMemberInvite,
        Self::TeamStructure,
        Self::TeamPermissionSet,
        Self::Contract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectName => "PROJECT_NAME",
            Self::Location => "LOCATION",
            Self::WorkType => "WORK_TYPE",
            Self::GfaLock => "GFA_LOCK",
            Self::TradeSelection => "TRADE_SELECTION",
            Self::TemplateLock => "TEMPLATE_LOCK",
            Self::TeamSize => "TEAM_SIZE",
            Self::ExecutionMode => "EXECUTION_MODE",
            Self::SiteCondition => "SITE_CONDITION",
            Self::DemolitionPrice => "DEMOLITION_PRICE",
            Self::Timeline => "TIMELINE",
            Self::EndDate => "END_DATE",
            Self::BlueprintUpload => "BLUEPRINT_UPLOAD",
            Self::SitePhoto => "SITE_PHOTO",
            Self::VisualVerification => "VISUAL_VERIFICATION",
            Self::DnaFinalized => "DNA_FINALIZED",
            Self::TeamMemberInvite => "TEAM_MEMBER_INVITE",
            Self::TeamStructure => "TEAM_STRUCTURE",
            Self::TeamPermissionSet => "TEAM_PERMISSION_SET",
            Self::Contract => "CONTRACT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::TeamMemberInvite | Self::BlueprintUpload | Self::SitePhoto | Self::Contract => {
                Cardinality::Multi
            }
            _ => Cardinality::Singleton,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.cardinality() == Cardinality::Singleton
    }

    /// Types that carry a mirror row or a derived value and are therefore
    /// only written by their own operation (template lock, finalize, invite,
    /// upload), never through a generic fact write.
    pub fn is_managed(&self) -> bool {
        matches!(
            self,
            Self::TemplateLock
                | Self::DnaFinalized
                | Self::TeamMemberInvite
                | Self::BlueprintUpload
                | Self::SitePhoto
                | Self::Contract
        )
    }

    pub fn stage(&self) -> WizardStage {
        match self {
            Self::ProjectName | Self::Location | Self::WorkType => WizardStage::Identity,
            Self::GfaLock => WizardStage::Area,
            Self::TradeSelection => WizardStage::Trade,
            Self::TemplateLock => WizardStage::Template,
            Self::TeamSize
            | Self::ExecutionMode
            | Self::TeamMemberInvite
            | Self::TeamStructure
            | Self::TeamPermissionSet => WizardStage::Team,
            Self::SiteCondition | Self::DemolitionPrice => WizardStage::Conditions,
            Self::Timeline | Self::EndDate => WizardStage::Schedule,
            Self::BlueprintUpload
            | Self::SitePhoto
            | Self::VisualVerification
            | Self::Contract => WizardStage::Verification,
            Self::DnaFinalized => WizardStage::Finalization,
        }
    }
}

/// The caller-supplied part of a citation. Identity, sequence and
/// timestamps are assigned when it is committed to a ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCitation {
    pub cite_type: CiteType,
    #[serde(default)]
    pub question_key: String,
    pub answer: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

impl NewCitation {
    pub fn new(cite_type: CiteType, answer: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            cite_type,
            question_key: cite_type.as_str().to_ascii_lowercase(),
            answer: answer.into(),
            value: value.into(),
            metadata: Map::new(),
            message_id: None,
        }
    }

    pub fn question(mut self, key: impl Into<String>) -> Self {
        self.question_key = key.into();
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn from_message(mut self, message_id: Uuid) -> Self {
        self.message_id = Some(message_id);
        self
    }
}

/// Body of a ledger write that may carry the version the caller read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCitationInput {
    #[serde(flatten)]
    pub citation: NewCitation,
    #[serde(default)]
    pub expected_version: Option<u64>,
}
