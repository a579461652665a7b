use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use keystone_core::gfa::{parse_gfa_input, GfaReading};
use keystone_core::models::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub project_id: Uuid,
    pub version: u64,
    pub citations: Vec<Citation>,
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LedgerResponse>> {
    let ledger = state.db.load_ledger(id)?;
    Ok(Json(LedgerResponse {
        project_id: id,
        version: ledger.version(),
        citations: ledger.entries().to_vec(),
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Citation>>> {
    Ok(Json(state.db.citation_history(id)?))
}

pub async fn record_citation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RecordCitationInput>,
) -> ApiResult<(StatusCode, Json<Citation>)> {
    let citation = state
        .db
        .record_citation(id, input.expected_version, input.citation)?;
    Ok((StatusCode::CREATED, Json(citation)))
}

pub async fn get_citation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Citation>> {
    state
        .db
        .get_citation(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("citation {id} not found")))
}

pub async fn get_citation_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ChatMessage>> {
    state
        .db
        .citation_source(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("citation {id} has no source message")))
}

#[derive(Debug, Deserialize)]
pub struct GfaRequest {
    pub input: String,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GfaResponse {
    pub reading: GfaReading,
    pub citation: Citation,
}

pub async fn lock_gfa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GfaRequest>,
) -> ApiResult<(StatusCode, Json<GfaResponse>)> {
    let reading = parse_gfa_input(&req.input).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "could not read a positive floor area from {:?}",
            req.input
        ))
    })?;

    let mut new = reading.to_citation(&req.input);
    new.message_id = req.message_id;
    let citation = state.db.record_citation(id, req.expected_version, new)?;
    Ok((StatusCode::CREATED, Json(GfaResponse { reading, citation })))
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub trade: String,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

pub async fn select_trade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TradeRequest>,
) -> ApiResult<(StatusCode, Json<Citation>)> {
    let trade = Trade::from_str(&req.trade)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown trade {:?}", req.trade)))?;

    let mut new = NewCitation::new(CiteType::TradeSelection, trade.label(), trade.as_str())
        .question("trade");
    new.message_id = req.message_id;
    let citation = state.db.record_citation(id, req.expected_version, new)?;
    Ok((StatusCode::CREATED, Json(citation)))
}

#[derive(Debug, Deserialize)]
pub struct SiteConditionRequest {
    pub condition: SiteCondition,
    /// Price per square foot, recorded as DEMOLITION_PRICE when present.
    #[serde(default)]
    pub demolition_unit_price: Option<f64>,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

pub async fn set_site_condition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SiteConditionRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Citation>>)> {
    if let Some(price) = req.demolition_unit_price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::BadRequest(format!(
                "demolition price must be non-negative, got {price}"
            )));
        }
    }

    let recorded = state.db.set_site_condition(
        id,
        req.expected_version,
        req.condition,
        req.demolition_unit_price,
        req.message_id,
    )?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn set_timeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TimelineInput>,
) -> ApiResult<(StatusCode, Json<Citation>)> {
    if req.end < req.start {
        return Err(ApiError::BadRequest(format!(
            "end date {} is before start date {}",
            req.end, req.start
        )));
    }

    let days = (req.end - req.start).num_days() + 1;
    let mut new = NewCitation::new(
        CiteType::Timeline,
        format!("{} to {} ({} days)", req.start, req.end, days),
        json!({
            "start": req.start.format("%Y-%m-%d").to_string(),
            "end": req.end.format("%Y-%m-%d").to_string(),
        }),
    )
    .question("timeline")
    .meta("duration_days", days);
    new.message_id = req.message_id;

    let citation = state.db.record_citation(id, req.expected_version, new)?;
    Ok((StatusCode::CREATED, Json(citation)))
}
