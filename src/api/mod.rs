//! HTTP API.

mod error;
mod ledger;
mod projects;
mod team;
mod template;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use keystone_core::{Database, Pricing};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{ApiError, ApiResult};

use crate::generator::TemplateGenerator;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub blobs: BlobStore,
    pub generator: TemplateGenerator,
    pub pricing: Pricing,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/projects/{id}/settings", patch(projects::update_settings))
        .route("/projects/{id}/dna", get(projects::get_dna))
        .route("/projects/{id}/dna/finalize", post(projects::finalize_dna))
        .route("/projects/{id}/schedule", get(projects::get_schedule))
        .route(
            "/projects/{id}/ledger",
            get(ledger::get_ledger).post(ledger::record_citation),
        )
        .route("/projects/{id}/ledger/history", get(ledger::get_history))
        .route("/projects/{id}/gfa", post(ledger::lock_gfa))
        .route("/projects/{id}/trade", post(ledger::select_trade))
        .route("/projects/{id}/site-condition", post(ledger::set_site_condition))
        .route("/projects/{id}/timeline", post(ledger::set_timeline))
        .route("/projects/{id}/template", get(template::list_items))
        .route("/projects/{id}/template/generate", post(template::generate))
        .route("/projects/{id}/template/items", post(template::add_item))
        .route(
            "/projects/{id}/template/items/{item_id}",
            patch(template::update_item).delete(template::delete_item),
        )
        .route("/projects/{id}/template/waste", post(template::apply_waste))
        .route("/projects/{id}/template/lock", post(template::lock))
        .route("/projects/{id}/costs", get(template::costs))
        .route(
            "/projects/{id}/team",
            get(team::list_team).post(team::invite_member),
        )
        .route("/projects/{id}/team/{member_id}", patch(team::update_member))
        .route(
            "/projects/{id}/documents",
            get(team::list_documents).post(team::upload_document),
        )
        .route(
            "/projects/{id}/messages",
            get(team::list_messages).post(team::post_message),
        )
        .route("/citations/{id}", get(ledger::get_citation))
        .route("/citations/{id}/source", get(ledger::get_citation_source));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
