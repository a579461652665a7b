use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::citations::{commit_citation_tx, load_ledger_tx};
use super::documents::insert_document_tx;
use super::projects::{fetch_project, touch_project};
use super::{get_enum, get_uuid, now, ts, Database};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::*;
use crate::rollup::{self, CostInputs, CostSummary, Pricing};
use crate::schedule;

const ITEM_COLUMNS: &str = "id, project_id, name, category, base_quantity, quantity, unit, \
                            unit_price, total_price, apply_waste, position";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<TemplateItem> {
    Ok(TemplateItem {
        id: get_uuid(row, 0)?,
        project_id: get_uuid(row, 1)?,
        name: row.get(2)?,
        category: get_enum(row, 3, ItemCategory::from_str)?,
        base_quantity: row.get(4)?,
        quantity: row.get(5)?,
        unit: row.get(6)?,
        unit_price: row.get(7)?,
        total_price: row.get(8)?,
        apply_waste: row.get(9)?,
        position: row.get(10)?,
    })
}

pub(crate) fn fetch_items(conn: &Connection, project_id: Uuid) -> Result<Vec<TemplateItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM template_items WHERE project_id = ?1 ORDER BY position, created_at"
    ))?;
    let items = stmt
        .query_map(params![project_id.to_string()], item_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn fetch_item(conn: &Connection, project_id: Uuid, item_id: Uuid) -> Result<TemplateItem> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM template_items WHERE id = ?1 AND project_id = ?2"),
        params![item_id.to_string(), project_id.to_string()],
        item_from_row,
    )
    .optional()?
    .ok_or(Error::ItemNotFound(item_id))
}

/// Persist the derived fields and editable fields of an existing item.
pub(crate) fn write_item(conn: &Connection, item: &TemplateItem) -> Result<()> {
    conn.execute(
        "UPDATE template_items
         SET name = ?1, category = ?2, base_quantity = ?3, quantity = ?4, unit = ?5,
             unit_price = ?6, total_price = ?7, apply_waste = ?8
         WHERE id = ?9",
        params![
            item.name,
            item.category.as_str(),
            item.base_quantity,
            item.quantity,
            item.unit,
            item.unit_price,
            item.total_price,
            item.apply_waste,
            item.id.to_string(),
        ],
    )?;
    Ok(())
}

fn insert_item(conn: &Connection, item: &TemplateItem) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO template_items ({ITEM_COLUMNS}, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            item.id.to_string(),
            item.project_id.to_string(),
            item.name,
            item.category.as_str(),
            item.base_quantity,
            item.quantity,
            item.unit,
            item.unit_price,
            item.total_price,
            item.apply_waste,
            item.position,
            ts(&now()),
        ],
    )?;
    Ok(())
}

fn validate_item(name: &str, base_quantity: f64, unit_price: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("item name must not be empty".into()));
    }
    if !base_quantity.is_finite() || base_quantity < 0.0 {
        return Err(Error::InvalidInput(format!(
            "quantity must be non-negative, got {base_quantity}"
        )));
    }
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(Error::InvalidInput(format!(
            "unit price must be non-negative, got {unit_price}"
        )));
    }
    Ok(())
}

fn build_item(project_id: Uuid, position: i64, new: NewTemplateItem, waste_percent: f64) -> TemplateItem {
    let mut item = TemplateItem {
        id: Uuid::new_v4(),
        project_id,
        name: new.name.trim().to_string(),
        category: new.category,
        base_quantity: new.base_quantity,
        quantity: new.base_quantity,
        unit: new.unit,
        unit_price: new.unit_price,
        total_price: 0.0,
        apply_waste: new.apply_waste,
        position,
    };
    rollup::recompute_item(&mut item, waste_percent);
    item
}

pub(crate) fn cost_inputs(
    ledger: &Ledger,
    settings: &TemplateSettings,
    pricing: &Pricing,
) -> CostInputs {
    let dna = ProjectDna::from_ledger(ledger);
    CostInputs {
        gfa_sqft: dna.gfa_sqft.unwrap_or(0.0),
        site_condition: dna.site_condition,
        demolition_unit_price: dna
            .demolition_unit_price
            .unwrap_or(pricing.default_demolition_unit_price),
        markup_percent: settings.markup_percent,
        tax_rate: pricing.tax_rate,
    }
}

/// Cost confirmed by the live TEMPLATE_LOCK. Edits made to the working
/// template afterwards do not change it.
fn locked_cost(ledger: &Ledger) -> Result<CostSummary> {
    let lock = ledger
        .latest(CiteType::TemplateLock)
        .ok_or_else(|| Error::Incomplete(vec![CiteType::TemplateLock]))?;
    let cost = lock
        .metadata
        .get("cost")
        .cloned()
        .ok_or_else(|| Error::Corrupt(format!("template lock {} has no cost", lock.id)))?;
    Ok(serde_json::from_value(cost)?)
}

/// Frozen snapshot captured when a template is locked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLock {
    pub citation: Citation,
    pub document: Document,
    pub items: Vec<TemplateItem>,
    pub cost: CostSummary,
    /// JSON body to store at `document.storage_path`.
    pub snapshot: serde_json::Value,
}

impl Database {
    /// Replace the working template with freshly generated items.
    pub fn replace_template(
        &self,
        project_id: Uuid,
        items: Vec<NewTemplateItem>,
    ) -> Result<Vec<TemplateItem>> {
        for item in &items {
            validate_item(&item.name, item.base_quantity, item.unit_price)?;
        }

        self.transaction(|tx| {
            let project = fetch_project(tx, project_id)?;
            tx.execute(
                "DELETE FROM template_items WHERE project_id = ?1",
                params![project_id.to_string()],
            )?;
            for (position, new) in items.into_iter().enumerate() {
                let item = build_item(
                    project_id,
                    position as i64,
                    new,
                    project.settings.waste_percent,
                );
                insert_item(tx, &item)?;
            }
            touch_project(tx, project_id)?;
            let saved = fetch_items(tx, project_id)?;
            tracing::info!(project_id = %project_id, items = saved.len(), "template replaced");
            Ok(saved)
        })
    }

    pub fn list_template_items(&self, project_id: Uuid) -> Result<Vec<TemplateItem>> {
        let conn = self.conn()?;
        fetch_project(&conn, project_id)?;
        fetch_items(&conn, project_id)
    }

    pub fn add_template_item(&self, project_id: Uuid, new: NewTemplateItem) -> Result<TemplateItem> {
        validate_item(&new.name, new.base_quantity, new.unit_price)?;
        self.transaction(|tx| {
            let project = fetch_project(tx, project_id)?;
            let position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM template_items WHERE project_id = ?1",
                params![project_id.to_string()],
                |row| row.get(0),
            )?;
            let item = build_item(project_id, position, new, project.settings.waste_percent);
            insert_item(tx, &item)?;
            touch_project(tx, project_id)?;
            Ok(item)
        })
    }

    pub fn update_template_item(
        &self,
        project_id: Uuid,
        item_id: Uuid,
        input: UpdateTemplateItemInput,
    ) -> Result<TemplateItem> {
        self.transaction(|tx| {
            let project = fetch_project(tx, project_id)?;
            let mut item = fetch_item(tx, project_id, item_id)?;

            if let Some(name) = input.name {
                item.name = name.trim().to_string();
            }
            if let Some(category) = input.category {
                item.category = category;
            }
            if let Some(q) = input.base_quantity {
                item.base_quantity = q;
            }
            if let Some(unit) = input.unit {
                item.unit = unit;
            }
            if let Some(price) = input.unit_price {
                item.unit_price = price;
            }
            if let Some(apply_waste) = input.apply_waste {
                item.apply_waste = apply_waste;
            }
            validate_item(&item.name, item.base_quantity, item.unit_price)?;

            rollup::recompute_item(&mut item, project.settings.waste_percent);
            write_item(tx, &item)?;
            touch_project(tx, project_id)?;
            Ok(item)
        })
    }

    pub fn delete_template_item(&self, project_id: Uuid, item_id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM template_items WHERE id = ?1 AND project_id = ?2",
            params![item_id.to_string(), project_id.to_string()],
        )?;
        if rows > 0 {
            touch_project(&conn, project_id)?;
        }
        Ok(rows > 0)
    }

    /// Store a new waste percentage and re-derive every item's quantity.
    pub fn apply_waste_percent(
        &self,
        project_id: Uuid,
        waste_percent: f64,
    ) -> Result<Vec<TemplateItem>> {
        self.update_settings(
            project_id,
            UpdateSettingsInput {
                waste_percent: Some(waste_percent),
                markup_percent: None,
            },
        )?;
        self.list_template_items(project_id)
    }

    pub fn cost_summary(&self, project_id: Uuid, pricing: &Pricing) -> Result<CostSummary> {
        let conn = self.conn()?;
        let project = fetch_project(&conn, project_id)?;
        let ledger = load_ledger_tx(&conn, project_id)?;
        let items = fetch_items(&conn, project_id)?;
        let inputs = cost_inputs(&ledger, &project.settings, pricing);
        Ok(rollup::summarize(&items, &inputs))
    }

    /// Freeze the current template into a TEMPLATE_LOCK citation and record
    /// the snapshot document that mirrors it, in one transaction.
    ///
    /// The citation's `value` is the pre-tax net total.
    pub fn lock_template(
        &self,
        project_id: Uuid,
        expected_version: Option<u64>,
        pricing: &Pricing,
        message_id: Option<Uuid>,
    ) -> Result<TemplateLock> {
        self.transaction(|tx| {
            let project = fetch_project(tx, project_id)?;
            let ledger = load_ledger_tx(tx, project_id)?;
            ledger.check_version(expected_version)?;

            let items = fetch_items(tx, project_id)?;
            if items.is_empty() {
                return Err(Error::InvalidInput("cannot lock an empty template".into()));
            }

            let cost = rollup::summarize(&items, &cost_inputs(&ledger, &project.settings, pricing));
            let trade = ledger
                .latest(CiteType::TradeSelection)
                .and_then(|c| c.value_str().map(str::to_string));

            let mut citation = NewCitation::new(
                CiteType::TemplateLock,
                format!(
                    "{} items locked at ${:.2} before tax",
                    items.len(),
                    cost.net_total
                ),
                cost.net_total,
            )
            .question("template_lock")
            .meta("items", serde_json::to_value(&items)?)
            .meta("cost", serde_json::to_value(cost)?)
            .meta("waste_percent", project.settings.waste_percent)
            .meta("trade", trade.clone());
            citation.message_id = message_id;

            let citation = commit_citation_tx(tx, project_id, expected_version, citation)?;

            let snapshot = json!({
                "project_id": project_id,
                "citation_id": citation.id,
                "seq": citation.seq,
                "trade": trade,
                "settings": project.settings,
                "items": items,
                "cost": cost,
                "locked_at": citation.created_at,
            });
            let body = serde_json::to_vec_pretty(&snapshot)?;
            let document = insert_document_tx(
                tx,
                Uuid::new_v4(),
                project_id,
                DocumentKind::TemplateSnapshot,
                &format!("template-lock-{}.json", citation.seq),
                body.len() as u64,
                Some(citation.id),
            )?;

            Ok(TemplateLock {
                citation,
                document,
                items,
                cost,
                snapshot,
            })
        })
    }

    /// Phase schedule derived from TIMELINE/END_DATE, SITE_CONDITION and the
    /// current template.
    pub fn schedule(&self, project_id: Uuid) -> Result<Vec<PhaseTask>> {
        let conn = self.conn()?;
        let dna = ProjectDna::from_ledger(&load_ledger_tx(&conn, project_id)?);
        let (start, end) = match (dna.start_date, dna.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(Error::Incomplete(vec![CiteType::Timeline]));
            }
        };
        let items = fetch_items(&conn, project_id)?;
        schedule::derive_schedule(start, end, dna.site_condition, &items)
    }

    /// Record DNA_FINALIZED once area, trade and template are all locked.
    /// The recorded cost is the one confirmed at lock time.
    pub fn finalize_dna(&self, project_id: Uuid, expected_version: Option<u64>) -> Result<Citation> {
        self.transaction(|tx| {
            let ledger = load_ledger_tx(tx, project_id)?;
            ledger.check_version(expected_version)?;

            let missing = ProjectDna::missing_for_finalize(&ledger);
            if !missing.is_empty() {
                return Err(Error::Incomplete(missing));
            }

            let cost = locked_cost(&ledger)?;
            let dna = ProjectDna::from_ledger(&ledger);
            let citation = crate::dna::finalize_citation(&dna, &cost)?;
            commit_citation_tx(tx, project_id, expected_version, citation)
        })
    }
}
