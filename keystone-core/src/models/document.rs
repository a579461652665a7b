use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::citation::CiteType;

/// Metadata for a file kept in blob storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: DocumentKind,
    pub file_name: String,
    /// Object key in the form `{project_id}/{document_id}-{file_name}`.
    pub storage_path: String,
    pub size_bytes: u64,
    pub citation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Blueprint,
    SitePhoto,
    Contract,
    TemplateSnapshot,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blueprint => "blueprint",
            Self::SitePhoto => "site_photo",
            Self::Contract => "contract",
            Self::TemplateSnapshot => "template_snapshot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "blueprint" => Some(Self::Blueprint),
            "site_photo" => Some(Self::SitePhoto),
            "contract" => Some(Self::Contract),
            "template_snapshot" => Some(Self::TemplateSnapshot),
            _ => None,
        }
    }

    /// Citation recorded when a file of this kind is uploaded. Template
    /// snapshots hang off the TEMPLATE_LOCK citation instead.
    pub fn upload_cite_type(&self) -> Option<CiteType> {
        match self {
            Self::Blueprint => Some(CiteType::BlueprintUpload),
            Self::SitePhoto => Some(CiteType::SitePhoto),
            Self::Contract => Some(CiteType::Contract),
            Self::TemplateSnapshot => None,
        }
    }
}

/// Object key for a stored file. The document id keeps two uploads of the
/// same file name from sharing bytes.
pub fn storage_path(project_id: Uuid, document_id: Uuid, file_name: &str) -> String {
    format!("{}/{}-{}", project_id, document_id, file_name)
}

/// A plain file name: no separators, no NUL, not `.` or `..`.
pub fn is_valid_file_name(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0'))
}

/// Metadata for a file whose bytes are already stored under
/// [`storage_path`] with the same document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDocumentInput {
    pub kind: DocumentKind,
    pub file_name: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}
