use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use keystone_core::db::TemplateLock;
use keystone_core::models::*;
use keystone_core::{CostSummary, Error as CoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::generator::TemplateSource;

pub async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TemplateItem>>> {
    Ok(Json(state.db.list_template_items(id)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Free-form project context passed through to a remote generator.
    #[serde(default)]
    pub context: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub source: TemplateSource,
    pub items: Vec<TemplateItem>,
}

/// Build a fresh template from the locked area and trade.
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let dna = state.db.project_dna(id)?;

    let (gfa, trade) = match (dna.gfa_sqft, dna.trade) {
        (Some(gfa), Some(trade)) => (gfa, trade),
        (gfa, trade) => {
            let mut missing = Vec::new();
            if gfa.is_none() {
                missing.push(CiteType::GfaLock);
            }
            if trade.is_none() {
                missing.push(CiteType::TradeSelection);
            }
            return Err(CoreError::Incomplete(missing).into());
        }
    };

    let (new_items, source) = state.generator.generate(trade, gfa, &req.context).await;
    let items = state.db.replace_template(id, new_items)?;
    Ok((StatusCode::CREATED, Json(GenerateResponse { source, items })))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewTemplateItem>,
) -> ApiResult<(StatusCode, Json<TemplateItem>)> {
    let item = state.db.add_template_item(id, input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateTemplateItemInput>,
) -> ApiResult<Json<TemplateItem>> {
    Ok(Json(state.db.update_template_item(id, item_id, input)?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    if state.db.delete_template_item(id, item_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("template item {item_id} not found")))
    }
}

#[derive(Debug, Deserialize)]
pub struct WasteRequest {
    pub waste_percent: f64,
}

pub async fn apply_waste(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WasteRequest>,
) -> ApiResult<Json<Vec<TemplateItem>>> {
    Ok(Json(state.db.apply_waste_percent(id, req.waste_percent)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct LockRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

pub async fn lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<LockRequest>>,
) -> ApiResult<(StatusCode, Json<TemplateLock>)> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let locked = state
        .db
        .lock_template(id, req.expected_version, &state.pricing, req.message_id)?;

    // The ledger row is authoritative; a missing snapshot file can be rebuilt
    // from the citation metadata.
    match serde_json::to_vec_pretty(&locked.snapshot) {
        Ok(bytes) => {
            if let Err(e) = state.blobs.put(&locked.document.storage_path, &bytes).await {
                tracing::warn!(
                    error = %e,
                    path = %locked.document.storage_path,
                    "failed to write template snapshot"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to encode template snapshot"),
    }

    Ok((StatusCode::CREATED, Json(locked)))
}

pub async fn costs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CostSummary>> {
    Ok(Json(state.db.cost_summary(id, &state.pricing)?))
}
