//! HTTP routes and server setup.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;

use super::page::{self, PageView};
use super::types::{CapabilityInfo, HealthResponse, ResearchForm, ToolsResponse};
use crate::config::Config;
use crate::controller::{InteractionController, ResearchOutcome, ResearchRequest};
use crate::error::{ErrorKind, ResearchError};
use crate::tools::{select_tools, validate_mapping, Capability, ToolRegistry};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub controller: InteractionController,
    pub registry: ToolRegistry,
}

impl AppState {
    pub fn new(config: Config, registry: ToolRegistry) -> Self {
        let controller = InteractionController::from_config(&config, registry.clone());
        Self {
            config,
            controller,
            registry,
        }
    }
}

/// Start the HTTP server.
///
/// Builds the tool registry once and refuses to start if any capability
/// label does not map to exactly one adapter.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let registry = ToolRegistry::build_all(&config.tools)?;
    validate_mapping(registry.tools())?;
    tracing::info!("Registered tools: {}", registry.names().join(", "));

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, registry));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/research", axum::routing::post(research))
        .route("/api/tools", get(list_tools))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(page::render(&PageView::default()))
}

async fn submit_form(State(state): State<Arc<AppState>>, body: Bytes) -> Html<String> {
    let form = ResearchForm::parse(&body);
    let query = form.query.clone();
    let selected = form.tools.clone();

    let outcome = state
        .controller
        .handle(ResearchRequest {
            api_key: form.api_key,
            tools: form.tools,
            query: form.query,
        })
        .await;

    Html(page::render(&PageView {
        query: &query,
        selected: Some(&selected),
        outcome: Some(&outcome),
    }))
}

async fn research(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> (StatusCode, Json<ResearchOutcome>) {
    let outcome = match payload {
        Ok(Json(request)) => state.controller.handle(request).await,
        Err(rejection) => {
            // The body may carry a credential, so only the status is logged.
            tracing::warn!(status = %rejection.status(), "Rejected research request body");
            ResearchError::InvalidRequest(rejection.body_text()).into()
        }
    };
    (status_for(&outcome), Json(outcome))
}

fn status_for(outcome: &ResearchOutcome) -> StatusCode {
    match outcome {
        ResearchOutcome::Succeeded { .. } => StatusCode::OK,
        ResearchOutcome::Failed { kind, .. } => match kind {
            ErrorKind::Configuration => StatusCode::BAD_REQUEST,
            ErrorKind::Construction | ErrorKind::Execution => StatusCode::BAD_GATEWAY,
        },
    }
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    let tools = Capability::ALL
        .into_iter()
        .map(|capability| {
            let bound = select_tools(&[capability], state.registry.tools());
            let mut info = CapabilityInfo::new(capability);
            if let Some(tool) = bound.first() {
                info.tool = Some(tool.name().to_string());
                info.description = Some(tool.description().to_string());
            }
            info
        })
        .collect();

    Json(ToolsResponse { tools })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.llm.model.clone(),
    })
}
