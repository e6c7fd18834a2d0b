//! HTTP handlers for the ranking service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::align::{rank_resources, AlignRequest, AlignSettings};
use crate::classifier::Classifier;
use crate::error::AlignError;
use crate::repository::RepositorySnapshot;
use crate::scoring::EvidenceRecord;

/// Shared application state
pub struct AppState<C> {
    /// Repository loaded at startup; never mutated
    pub snapshot: Arc<RepositorySnapshot>,
    pub classifier: Arc<C>,
    pub settings: Arc<AlignSettings>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            classifier: Arc::clone(&self.classifier),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Query parameters of `GET /align`; list values are comma separated
#[derive(Debug, Deserialize)]
pub struct AlignParams {
    #[serde(alias = "learning_area")]
    pub area: Option<String>,
    pub year: Option<String>,
    /// Statement allow-list
    pub item: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned from a handler
#[derive(Debug)]
pub struct AppError(AlignError);

impl From<AlignError> for AppError {
    fn from(e: AlignError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AlignError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AlignError::StatementFilter(_) => StatusCode::BAD_GATEWAY,
            AlignError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// GET /align - rank resources for a learning area and year
async fn align<C: Classifier + 'static>(
    State(state): State<AppState<C>>,
    Query(params): Query<AlignParams>,
) -> Result<Json<Vec<EvidenceRecord>>, AppError> {
    debug!(?params, "align request");
    let request = AlignRequest::from_params(
        params.area.as_deref(),
        params.year.as_deref(),
        params.item.as_deref(),
        params.limit,
        &state.settings,
    )?;

    let ranked = rank_resources(
        &state.snapshot,
        state.classifier.as_ref(),
        &request,
        &state.settings,
    )
    .await?;
    Ok(Json(ranked))
}

/// GET /health
async fn health<C: Classifier + 'static>(State(state): State<AppState<C>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        entries: state.snapshot.len(),
    })
}

/// Create the axum router with all routes
pub fn create_router<C: Classifier + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/align", get(align::<C>))
        .route("/health", get(health::<C>))
        .with_state(state)
}
