use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{get_enum, get_json, get_opt_ts, get_opt_uuid, get_ts, get_u64, get_uuid, ts, Database};
use crate::error::{Error, Result};
use crate::ledger::{validate_fact, Ledger};
use crate::models::*;

const CITATION_COLUMNS: &str = "id, project_id, seq, cite_type, question_key, answer, value, \
                                metadata, message_id, created_at, superseded_at";

fn citation_from_row(row: &Row<'_>) -> rusqlite::Result<Citation> {
    Ok(Citation {
        id: get_uuid(row, 0)?,
        project_id: get_uuid(row, 1)?,
        seq: get_u64(row, 2)?,
        cite_type: get_enum(row, 3, CiteType::from_str)?,
        question_key: row.get(4)?,
        answer: row.get(5)?,
        value: get_json(row, 6)?,
        metadata: get_json(row, 7)?,
        message_id: get_opt_uuid(row, 8)?,
        created_at: get_ts(row, 9)?,
        superseded_at: get_opt_ts(row, 10)?,
    })
}

pub(crate) fn load_ledger_tx(conn: &Connection, project_id: Uuid) -> Result<Ledger> {
    let version: i64 = conn
        .query_row(
            "SELECT ledger_version FROM projects WHERE id = ?1",
            params![project_id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::ProjectNotFound(project_id))?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CITATION_COLUMNS} FROM citations
         WHERE project_id = ?1 AND superseded_at IS NULL
         ORDER BY seq"
    ))?;
    let entries = stmt
        .query_map(params![project_id.to_string()], citation_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Ledger::from_entries(project_id, version as u64, entries))
}

/// A citation may only point at a chat message of its own project.
fn check_message_tx(conn: &Connection, project_id: Uuid, message_id: Uuid) -> Result<()> {
    let found = conn
        .query_row(
            "SELECT 1 FROM chat_messages WHERE id = ?1 AND project_id = ?2",
            params![message_id.to_string(), project_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    found.ok_or_else(|| {
        Error::InvalidInput(format!("message {message_id} does not belong to this project"))
    })
}

/// Read, check, append and write back within the caller's transaction.
///
/// Superseded rows are stamped before the insert so the partial unique
/// index on live singletons never sees two live rows.
pub(crate) fn commit_citation_tx(
    conn: &Connection,
    project_id: Uuid,
    expected_version: Option<u64>,
    new: NewCitation,
) -> Result<Citation> {
    let mut ledger = load_ledger_tx(conn, project_id)?;
    if let Some(message_id) = new.message_id {
        check_message_tx(conn, project_id, message_id)?;
    }
    let applied = ledger.apply(expected_version, new)?;
    let c = &applied.citation;
    let stamp = ts(&c.created_at);

    for id in &applied.superseded {
        conn.execute(
            "UPDATE citations SET superseded_at = ?1 WHERE id = ?2",
            params![stamp, id.to_string()],
        )?;
    }

    conn.execute(
        &format!(
            "INSERT INTO citations ({CITATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL)"
        ),
        params![
            c.id.to_string(),
            project_id.to_string(),
            c.seq as i64,
            c.cite_type.as_str(),
            c.question_key,
            c.answer,
            serde_json::to_string(&c.value)?,
            serde_json::to_string(&c.metadata)?,
            c.message_id.map(|m| m.to_string()),
            stamp,
        ],
    )?;

    conn.execute(
        "UPDATE projects SET ledger_version = ?1, updated_at = ?2 WHERE id = ?3",
        params![c.seq as i64, stamp, project_id.to_string()],
    )?;

    // The projects table mirrors the current name for listings.
    if c.cite_type == CiteType::ProjectName {
        conn.execute(
            "UPDATE projects SET name = ?1 WHERE id = ?2",
            params![c.answer, project_id.to_string()],
        )?;
    }

    tracing::info!(
        project_id = %project_id,
        citation_id = %c.id,
        cite_type = c.cite_type.as_str(),
        seq = c.seq,
        "citation recorded"
    );

    Ok(applied.citation)
}

impl Database {
    pub fn load_ledger(&self, project_id: Uuid) -> Result<Ledger> {
        let conn = self.conn()?;
        load_ledger_tx(&conn, project_id)
    }

    /// Commit one citation. When `expected_version` is given and another
    /// writer has committed since, the write is rejected with
    /// [`Error::VersionConflict`].
    pub fn record_citation(
        &self,
        project_id: Uuid,
        expected_version: Option<u64>,
        new: NewCitation,
    ) -> Result<Citation> {
        validate_fact(&new)?;
        self.transaction(|tx| commit_citation_tx(tx, project_id, expected_version, new))
    }

    /// Record the site condition and, when given, the demolition unit price
    /// as one answer: both citations commit together or not at all.
    pub fn set_site_condition(
        &self,
        project_id: Uuid,
        expected_version: Option<u64>,
        condition: SiteCondition,
        demolition_unit_price: Option<f64>,
        message_id: Option<Uuid>,
    ) -> Result<Vec<Citation>> {
        let answer = match condition {
            SiteCondition::Clear => "Site is clear",
            SiteCondition::Demolition => "Demolition required",
        };
        let mut facts = vec![NewCitation::new(CiteType::SiteCondition, answer, condition.as_str())
            .question("site_condition")];
        if let Some(price) = demolition_unit_price {
            facts.push(
                NewCitation::new(
                    CiteType::DemolitionPrice,
                    format!("${price:.2} per sq ft"),
                    price,
                )
                .question("demolition_price"),
            );
        }
        for fact in &mut facts {
            fact.message_id = message_id;
            validate_fact(fact)?;
        }

        self.transaction(|tx| {
            let mut expected = expected_version;
            let mut recorded = Vec::with_capacity(facts.len());
            for fact in facts {
                let citation = commit_citation_tx(tx, project_id, expected, fact)?;
                expected = expected.map(|_| citation.seq);
                recorded.push(citation);
            }
            Ok(recorded)
        })
    }

    /// Every citation ever committed, superseded ones included, in ledger order.
    pub fn citation_history(&self, project_id: Uuid) -> Result<Vec<Citation>> {
        let conn = self.conn()?;
        super::projects::fetch_project(&conn, project_id)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CITATION_COLUMNS} FROM citations WHERE project_id = ?1 ORDER BY seq"
        ))?;
        let rows = stmt
            .query_map(params![project_id.to_string()], citation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_citation(&self, id: Uuid) -> Result<Option<Citation>> {
        let conn = self.conn()?;
        let citation = conn
            .query_row(
                &format!("SELECT {CITATION_COLUMNS} FROM citations WHERE id = ?1"),
                params![id.to_string()],
                citation_from_row,
            )
            .optional()?;
        Ok(citation)
    }

    pub fn project_dna(&self, project_id: Uuid) -> Result<ProjectDna> {
        Ok(ProjectDna::from_ledger(&self.load_ledger(project_id)?))
    }
}
