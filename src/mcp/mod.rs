use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;
use keystone_core::{Error as CoreError, Pricing};

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    pricing: Pricing,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectRequest {
    #[schemars(description = "The project ID")]
    pub project_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCitationsRequest {
    #[schemars(description = "The project ID")]
    pub project_id: String,
    #[schemars(description = "Include superseded citations in sequence order")]
    #[serde(default)]
    pub include_superseded: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecordFactRequest {
    #[schemars(description = "The project ID")]
    pub project_id: String,
    #[schemars(description = "Citation type, e.g. LOCATION, WORK_TYPE, END_DATE")]
    pub cite_type: String,
    #[schemars(description = "Human-readable answer as given by the user")]
    pub answer: String,
    #[schemars(description = "Machine value; defaults to the answer text")]
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[schemars(description = "Ledger version the caller last saw; rejected if stale")]
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CitationList {
    version: u64,
    citations: Vec<Citation>,
}

fn internal(e: CoreError) -> McpError {
    match e {
        CoreError::ProjectNotFound(_) | CoreError::InvalidInput(_) | CoreError::Incomplete(_) => {
            McpError::invalid_params(e.to_string(), None)
        }
        CoreError::VersionConflict { .. } => McpError::invalid_request(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

impl McpServer {
    pub fn new(db: Database, pricing: Pricing) -> Self {
        Self {
            db,
            pricing,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Get the typed project DNA derived from the live citation ledger")]
    async fn get_project_dna(
        &self,
        params: Parameters<ProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project_id = Self::parse_uuid(&params.0.project_id)?;
        let dna = self.db.project_dna(project_id).map_err(internal)?;
        json_result(&dna)
    }

    #[tool(description = "List a project's citations, live only unless include_superseded is set")]
    async fn list_citations(
        &self,
        params: Parameters<ListCitationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let project_id = Self::parse_uuid(&req.project_id)?;
        let ledger = self.db.load_ledger(project_id).map_err(internal)?;
        let citations = if req.include_superseded {
            self.db.citation_history(project_id).map_err(internal)?
        } else {
            ledger.entries().to_vec()
        };
        json_result(&CitationList {
            version: ledger.version(),
            citations,
        })
    }

    #[tool(description = "Record a project fact as a citation; singleton types replace the previous value. Template locks, finalization, invites and uploads have their own operations")]
    async fn record_fact(
        &self,
        params: Parameters<RecordFactRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let project_id = Self::parse_uuid(&req.project_id)?;
        let cite_type = CiteType::from_str(&req.cite_type).ok_or_else(|| {
            McpError::invalid_params(format!("Unknown citation type: {}", req.cite_type), None)
        })?;

        let value = req
            .value
            .unwrap_or_else(|| serde_json::Value::String(req.answer.clone()));
        let citation = self
            .db
            .record_citation(
                project_id,
                req.expected_version,
                NewCitation::new(cite_type, req.answer, value),
            )
            .map_err(internal)?;
        json_result(&citation)
    }

    #[tool(description = "Get the material, labor, demolition, markup and tax rollup for a project")]
    async fn get_cost_summary(
        &self,
        params: Parameters<ProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project_id = Self::parse_uuid(&params.0.project_id)?;
        let cost = self
            .db
            .cost_summary(project_id, &self.pricing)
            .map_err(internal)?;
        json_result(&cost)
    }

    #[tool(description = "Get the phase schedule derived from the timeline and template")]
    async fn get_schedule(
        &self,
        params: Parameters<ProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project_id = Self::parse_uuid(&params.0.project_id)?;
        let tasks = self.db.schedule(project_id).map_err(internal)?;
        json_result(&tasks)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Keystone MCP server: read and record construction project facts".into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database, pricing: Pricing) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db, pricing);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
