use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::chart::{render_html, ChartData, ChartHints, ChartPoint, Selection, SelectionError};
use crate::error::PerformanceError;
use crate::section::{ExtractOptions, Period, SectionError, SectionTable};
use crate::services::{PerformanceService, SectionSummary, WorkbookSummary};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub performance_service: PerformanceService,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Result of a chart request; `status` is "ok", "nothing_selected" or
/// "empty_range"
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub status: String,
    pub message: Option<String>,
    pub points: Vec<ChartPoint>,
    pub hints: Option<ChartHints>,
    pub vega_lite: Option<Value>,
}

impl ChartResponse {
    fn ok(chart: ChartData) -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
            vega_lite: Some(chart.vega_lite()),
            points: chart.points,
            hints: Some(chart.hints),
        }
    }

    fn info(kind: &str, err: &SelectionError) -> Self {
        Self {
            status: kind.to_string(),
            message: Some(err.to_string()),
            points: Vec::new(),
            hints: None,
            vega_lite: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TableParams {
    pub section: String,
    #[serde(default)]
    pub drop_annual_sum: bool,
}

/// Query form of [`Selection`] for the HTML chart page; `sites` is a comma
/// separated list
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub section: String,
    #[serde(default)]
    pub sites: String,
    pub from: Option<Period>,
    pub to: Option<Period>,
    #[serde(default)]
    pub drop_annual_sum: bool,
    #[serde(default)]
    pub sort_by_mean: bool,
}

impl From<ChartQuery> for Selection {
    fn from(query: ChartQuery) -> Self {
        let sites: Vec<String> = query
            .sites
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let mut selection = Selection::new(query.section)
            .with_sites(sites)
            .dropping_annual_sum(query.drop_annual_sum)
            .sorted_by_mean(query.sort_by_mean);
        match (query.from, query.to) {
            (Some(from), Some(to)) => selection = selection.with_month_range(from, to),
            (None, None) => {}
            _ => warn!("Both 'from' and 'to' are needed for a month range, ignoring it"),
        }
        selection
    }
}

/// Maps service errors onto HTTP responses with a JSON body
pub struct ApiError(PerformanceError);

impl From<PerformanceError> for ApiError {
    fn from(err: PerformanceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PerformanceError::Section(SectionError::UnknownSection(_))
            | PerformanceError::WorkbookNotFound(_) => StatusCode::NOT_FOUND,
            PerformanceError::Load(_) | PerformanceError::Section(_) => StatusCode::BAD_REQUEST,
            PerformanceError::Selection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        error_response(status, self.0.kind(), self.0.to_string())
    }
}

pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    let api_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/workbooks",
            post(upload_workbook).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/workbooks/{workbook_id}/sections", get(get_sections))
        .route("/workbooks/{workbook_id}/table", get(get_table))
        .route("/workbooks/{workbook_id}/chart", post(post_chart))
        .route("/workbooks/{workbook_id}/chart.html", get(get_chart_html))
        .with_state(state);

    Router::new()
        .route("/", get(index))
        .nest("/api/v1", api_routes)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

#[instrument(skip(state, body))]
async fn upload_workbook(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WorkbookSummary>, Response> {
    let body = body.map_err(|rejection| {
        let status = rejection.status();
        warn!("Rejected workbook upload body ({}): {}", status, rejection);
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            error_response(
                status,
                "payload_too_large",
                format!(
                    "Die Datei ist zu groß (maximal {} Bytes).",
                    state.max_upload_bytes
                ),
            )
        } else {
            error_response(status, "invalid_body", rejection.body_text())
        }
    })?;
    debug!("Received workbook upload of {} bytes", body.len());

    let service = state.performance_service.clone();
    // calamine parsing is synchronous
    let summary = tokio::task::spawn_blocking(move || service.load_workbook(&body))
        .await
        .map_err(|e| {
            error!("Workbook parsing task failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Die Datei konnte nicht verarbeitet werden.",
            )
        })?
        .map_err(|e| {
            warn!("Rejected workbook upload: {}", e);
            ApiError(e).into_response()
        })?;

    info!(
        "Workbook {} loaded with {} sections",
        summary.workbook_id,
        summary.sections.len()
    );
    Ok(Json(summary))
}

#[instrument(skip(state), fields(workbook_id = %workbook_id))]
async fn get_sections(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
) -> Result<Json<Vec<SectionSummary>>, ApiError> {
    let sections = state.performance_service.sections(&workbook_id)?;
    debug!("Workbook {} has {} sections", workbook_id, sections.len());
    Ok(Json(sections))
}

#[instrument(skip(state), fields(workbook_id = %workbook_id, section = %params.section))]
async fn get_table(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
    Query(params): Query<TableParams>,
) -> Result<Json<SectionTable>, ApiError> {
    let options = ExtractOptions {
        drop_annual_sum: params.drop_annual_sum,
        reorder_months: true,
    };
    let table = state
        .performance_service
        .section_table(&workbook_id, &params.section, options)
        .map_err(|e| {
            warn!("Failed to extract section '{}': {}", params.section, e);
            e
        })?;

    info!(
        "Returning section '{}' with {} rows",
        table.label,
        table.rows.len()
    );
    Ok(Json(table.as_ref().clone()))
}

#[instrument(skip(state, selection), fields(workbook_id = %workbook_id))]
async fn post_chart(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
    Json(selection): Json<Selection>,
) -> Result<Json<ChartResponse>, ApiError> {
    chart_response(&state, &workbook_id, &selection).map(Json)
}

#[instrument(skip(state, query), fields(workbook_id = %workbook_id))]
async fn get_chart_html(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, ApiError> {
    let selection = Selection::from(query);
    match state.performance_service.chart(&workbook_id, &selection) {
        Ok(chart) => Ok(Html(render_html(&chart)).into_response()),
        Err(PerformanceError::Selection(e)) => {
            Ok(Html(format!("<!DOCTYPE html><p>{e}</p>")).into_response())
        }
        Err(e) => Err(ApiError(e)),
    }
}

/// Empty selections and empty ranges are informational, not failures
fn chart_response(
    state: &AppState,
    workbook_id: &str,
    selection: &Selection,
) -> Result<ChartResponse, ApiError> {
    match state.performance_service.chart(workbook_id, selection) {
        Ok(chart) => Ok(ChartResponse::ok(chart)),
        Err(PerformanceError::Selection(e)) => {
            info!("Chart request for '{}' yields no data: {}", selection.section, e);
            let kind = PerformanceError::Selection(e.clone()).kind();
            Ok(ChartResponse::info(kind, &e))
        }
        Err(e) => {
            warn!("Chart request for '{}' failed: {}", selection.section, e);
            Err(ApiError(e))
        }
    }
}
