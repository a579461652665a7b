use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{get_ts, get_u64, get_uuid, now, ts, Database};
use crate::error::{Error, Result};
use crate::models::*;
use crate::rollup;

const PROJECT_COLUMNS: &str =
    "id, name, ledger_version, waste_percent, markup_percent, created_at, updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        ledger_version: get_u64(row, 2)?,
        settings: TemplateSettings {
            waste_percent: row.get(3)?,
            markup_percent: row.get(4)?,
        },
        created_at: get_ts(row, 5)?,
        updated_at: get_ts(row, 6)?,
    })
}

pub(crate) fn fetch_project(conn: &Connection, id: Uuid) -> Result<Project> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id.to_string()],
        project_from_row,
    )
    .optional()?
    .ok_or(Error::ProjectNotFound(id))
}

pub(crate) fn touch_project(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
        params![ts(&now()), id.to_string()],
    )?;
    Ok(())
}

fn validate_percent(label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{label} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

impl Database {
    /// Create a project and record its PROJECT_NAME citation as ledger entry 1.
    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("project name must not be empty".into()));
        }

        let id = Uuid::new_v4();
        let created = now();
        let defaults = TemplateSettings::default();

        let project = self.transaction(|tx| {
            tx.execute(
                "INSERT INTO projects (id, name, ledger_version, waste_percent, markup_percent, created_at, updated_at)
                 VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5)",
                params![
                    id.to_string(),
                    name,
                    defaults.waste_percent,
                    defaults.markup_percent,
                    ts(&created),
                ],
            )?;

            let citation = NewCitation::new(CiteType::ProjectName, name.clone(), name.clone())
                .question("project_name");
            super::citations::commit_citation_tx(tx, id, Some(0), citation)?;

            fetch_project(tx, id)
        })?;

        tracing::info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn()?;
        match fetch_project(&conn, id) {
            Ok(project) => Ok(Some(project)),
            Err(Error::ProjectNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY updated_at DESC, created_at DESC"
        ))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// Change waste/markup percentages. A new waste percentage is re-applied
    /// to every template item in the same transaction.
    pub fn update_settings(&self, id: Uuid, input: UpdateSettingsInput) -> Result<Project> {
        if let Some(w) = input.waste_percent {
            validate_percent("waste_percent", w)?;
        }
        if let Some(m) = input.markup_percent {
            validate_percent("markup_percent", m)?;
        }

        self.transaction(|tx| {
            let current = fetch_project(tx, id)?;
            let settings = TemplateSettings {
                waste_percent: input.waste_percent.unwrap_or(current.settings.waste_percent),
                markup_percent: input
                    .markup_percent
                    .unwrap_or(current.settings.markup_percent),
            };

            tx.execute(
                "UPDATE projects SET waste_percent = ?1, markup_percent = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    settings.waste_percent,
                    settings.markup_percent,
                    ts(&now()),
                    id.to_string()
                ],
            )?;

            if settings.waste_percent != current.settings.waste_percent {
                let mut items = super::template::fetch_items(tx, id)?;
                rollup::apply_waste(&mut items, settings.waste_percent);
                for item in &items {
                    super::template::write_item(tx, item)?;
                }
            }

            fetch_project(tx, id)
        })
    }

    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
        if rows > 0 {
            tracing::info!(project_id = %id, "project deleted");
        }
        Ok(rows > 0)
    }
}
