use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    error::ConversionError,
    pipeline::{StandardPipeline, TextPipeline},
    stats::TextStatistics,
};

const INDEX_PAGE: &str = include_str!("../html/index.html");
const STATS_PAGE: &str = include_str!("../html/stats.html");
const ABOUT_PAGE: &str = include_str!("../html/about.html");

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<dyn TextPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<dyn TextPipeline>) -> Self {
        Self { pipeline }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(StandardPipeline))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlRequest {
    pub html: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownRequest {
    pub markdown: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct MarkdownResponse {
    pub success: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HtmlResponse {
    pub success: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TextStatistics>,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/stats", get(stats_page))
        .route("/about", get(about_page))
        .route("/health", get(health))
        .route("/convert", post(convert_html))
        .route("/convert/markdown", post(convert_markdown))
        .route("/analyze", post(analyze_text))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthCheck> {
    Json(HealthCheck { status: "ok" })
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn stats_page() -> Html<&'static str> {
    Html(STATS_PAGE)
}

async fn about_page() -> Html<&'static str> {
    Html(ABOUT_PAGE)
}

async fn convert_html(
    State(state): State<AppState>,
    Json(HtmlRequest { html }): Json<HtmlRequest>,
) -> Json<MarkdownResponse> {
    tracing::debug!(input_len = html.len(), "converting html to markdown");
    let pipeline = state.pipeline.clone();
    let result = run_blocking(move || pipeline.html_to_markdown(&html)).await;
    let markdown = settle("html_to_markdown", result);
    Json(MarkdownResponse {
        success: outcome(&markdown),
        markdown,
    })
}

async fn convert_markdown(
    State(state): State<AppState>,
    Json(MarkdownRequest { markdown }): Json<MarkdownRequest>,
) -> Json<HtmlResponse> {
    tracing::debug!(input_len = markdown.len(), "converting markdown to html");
    let pipeline = state.pipeline.clone();
    let result = run_blocking(move || pipeline.markdown_to_html(&markdown)).await;
    let html = settle("markdown_to_html", result);
    Json(HtmlResponse {
        success: outcome(&html),
        html,
    })
}

async fn analyze_text(
    State(state): State<AppState>,
    Json(TextRequest { text }): Json<TextRequest>,
) -> Json<AnalyzeResponse> {
    tracing::debug!(input_len = text.len(), "analyzing text");
    let pipeline = state.pipeline.clone();
    let result = run_blocking(move || pipeline.analyze(&text)).await;
    let stats = settle("analyze", result);
    Json(AnalyzeResponse {
        success: outcome(&stats),
        stats,
    })
}

/// Runs a pipeline call off the async workers. A panic inside the call is
/// reported as an internal failure.
async fn run_blocking<T, F>(job: F) -> Result<T, ConversionError>
where
    F: FnOnce() -> Result<T, ConversionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ConversionError::Internal(format!("conversion task failed: {e}")))?
}

/// Logs a failure and drops its detail; clients only see the outcome.
fn settle<T>(operation: &'static str, result: Result<T, ConversionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::error!(operation, %error, "conversion failed");
            None
        }
    }
}

fn outcome<T>(payload: &Option<T>) -> Outcome {
    if payload.is_some() {
        Outcome::Ok
    } else {
        Outcome::Error
    }
}
