use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::citations::commit_citation_tx;
use super::projects::fetch_project;
use super::{get_enum, get_opt_uuid, get_ts, get_u64, get_uuid, now, ts, Database};
use crate::error::{Error, Result};
use crate::models::*;

const DOCUMENT_COLUMNS: &str =
    "id, project_id, kind, file_name, storage_path, size_bytes, citation_id, created_at";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: get_uuid(row, 0)?,
        project_id: get_uuid(row, 1)?,
        kind: get_enum(row, 2, DocumentKind::from_str)?,
        file_name: row.get(3)?,
        storage_path: row.get(4)?,
        size_bytes: get_u64(row, 5)?,
        citation_id: get_opt_uuid(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}

pub(crate) fn insert_document_tx(
    conn: &Connection,
    id: Uuid,
    project_id: Uuid,
    kind: DocumentKind,
    file_name: &str,
    size_bytes: u64,
    citation_id: Option<Uuid>,
) -> Result<Document> {
    let stored_size = i64::try_from(size_bytes)
        .map_err(|_| Error::InvalidInput(format!("file size {size_bytes} is too large")))?;
    let document = Document {
        id,
        project_id,
        kind,
        file_name: file_name.to_string(),
        storage_path: storage_path(project_id, id, file_name),
        size_bytes,
        citation_id,
        created_at: now(),
    };

    conn.execute(
        &format!("INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            document.id.to_string(),
            project_id.to_string(),
            kind.as_str(),
            document.file_name,
            document.storage_path,
            stored_size,
            citation_id.map(|c| c.to_string()),
            ts(&document.created_at),
        ],
    )?;

    Ok(document)
}

/// Reject names that would escape the `{project_id}/` prefix.
fn validate_file_name(name: &str) -> Result<()> {
    if !is_valid_file_name(name) {
        return Err(Error::InvalidInput(format!("invalid file name {name:?}")));
    }
    Ok(())
}

impl Database {
    /// Record an uploaded file and, for blueprint/photo/contract uploads, the
    /// matching citation. The bytes are expected to be stored already under
    /// `storage_path(project_id, document_id, file_name)`.
    pub fn record_document(
        &self,
        project_id: Uuid,
        document_id: Uuid,
        input: RecordDocumentInput,
    ) -> Result<(Document, Option<Citation>)> {
        validate_file_name(&input.file_name)?;

        self.transaction(|tx| {
            fetch_project(tx, project_id)?;

            let citation = match input.kind.upload_cite_type() {
                Some(cite_type) => {
                    let mut new = NewCitation::new(
                        cite_type,
                        input.file_name.clone(),
                        storage_path(project_id, document_id, &input.file_name),
                    )
                    .question(input.kind.as_str())
                    .meta("file_name", input.file_name.as_str())
                    .meta("size_bytes", input.size_bytes);
                    new.message_id = input.message_id;
                    Some(commit_citation_tx(tx, project_id, None, new)?)
                }
                None => None,
            };

            let document = insert_document_tx(
                tx,
                document_id,
                project_id,
                input.kind,
                &input.file_name,
                input.size_bytes,
                citation.as_ref().map(|c| c.id),
            )?;

            tracing::info!(
                project_id = %project_id,
                kind = input.kind.as_str(),
                path = %document.storage_path,
                "document recorded"
            );
            Ok((document, citation))
        })
    }

    pub fn list_documents(&self, project_id: Uuid) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        fetch_project(&conn, project_id)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE project_id = ?1 ORDER BY created_at"
        ))?;
        let docs = stmt
            .query_map(params![project_id.to_string()], document_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }
}
