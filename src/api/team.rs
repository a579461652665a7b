//! Team invitations, uploaded documents and the chat transcript.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use keystone_core::models::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};

pub async fn list_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TeamMember>>> {
    Ok(Json(state.db.list_team(id)?))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<InviteMemberInput>,
) -> ApiResult<(StatusCode, Json<TeamMember>)> {
    let member = state.db.invite_member(id, input)?;
    // Delivery is outside this service; the invite is only recorded.
    tracing::info!(
        project_id = %id,
        email = %member.email,
        role = member.role.as_str(),
        "team member invited"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateMemberStatusInput>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.db.set_member_status(id, member_id, input.status)?))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.db.list_documents(id)?))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub kind: DocumentKind,
    pub file_name: String,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document: Document,
    pub citation: Option<Citation>,
}

/// Store the raw request body, then record it against the project.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("upload body is empty".into()));
    }
    if query.kind == DocumentKind::TemplateSnapshot {
        return Err(ApiError::BadRequest(
            "template snapshots are written by the template lock".into(),
        ));
    }

    if !is_valid_file_name(&query.file_name) {
        return Err(ApiError::BadRequest(format!(
            "invalid file name {:?}",
            query.file_name
        )));
    }
    if state.db.get_project(id)?.is_none() {
        return Err(ApiError::NotFound(format!("project {id} not found")));
    }

    // Bytes land first so a recorded citation always has its file.
    let document_id = Uuid::new_v4();
    let key = storage_path(id, document_id, &query.file_name);
    state.blobs.put(&key, &body).await?;

    let recorded = state.db.record_document(
        id,
        document_id,
        RecordDocumentInput {
            kind: query.kind,
            file_name: query.file_name,
            size_bytes: body.len() as u64,
            message_id: query.message_id,
        },
    );
    let (document, citation) = match recorded {
        Ok(recorded) => recorded,
        Err(e) => {
            if let Err(cleanup) = state.blobs.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "orphaned upload left in storage");
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(UploadResponse { document, citation })))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(state.db.list_messages(id)?))
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PostMessageInput>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let message = state.db.post_message(id, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}
