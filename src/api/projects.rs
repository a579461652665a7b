use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use keystone_core::models::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub dna: ProjectDna,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionedRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.db.list_projects()?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.db.create_project(input)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = state
        .db
        .get_project(id)?
        .ok_or_else(|| ApiError::NotFound(format!("project {id} not found")))?;
    let dna = state.db.project_dna(id)?;
    Ok(Json(ProjectDetail { project, dna }))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.db.delete_project(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("project {id} not found")))
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSettingsInput>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.db.update_settings(id, input)?))
}

pub async fn get_dna(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDna>> {
    Ok(Json(state.db.project_dna(id)?))
}

pub async fn finalize_dna(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<VersionedRequest>>,
) -> ApiResult<(StatusCode, Json<Citation>)> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let citation = state.db.finalize_dna(id, req.expected_version)?;
    Ok((StatusCode::CREATED, Json(citation)))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PhaseTask>>> {
    Ok(Json(state.db.schedule(id)?))
}
