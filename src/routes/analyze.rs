// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Analysis route handlers.

use crate::app::AppState;
use crate::models::analyze::AnalyzeRequest;
use crate::models::error::AnalysisError;
use crate::models::report::SiteReport;
use crate::services::pipeline::AnalysisPipeline;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, info};

/// Create the router with the analysis routes.
pub fn analyze_router() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_handler))
}

/// Run one analysis and return its report.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis report", body = SiteReport),
        (status = 400, description = "Invalid URL", body = String),
        (status = 502, description = "Page could not be fetched", body = String),
        (status = 500, description = "Fetcher could not be built", body = String)
    ),
    tag = "analysis"
)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<SiteReport>, (StatusCode, String)> {
    let config = payload.config.unwrap_or_else(|| state.config.clone());

    let fetcher = state.fetchers.build(&config).map_err(|e| {
        error!("Failed to build fetcher: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Fetcher error: {e}"))
    })?;

    info!("Analyzing {}", payload.url);
    let mut pipeline = AnalysisPipeline::new(fetcher, config);
    pipeline
        .run(&payload.url)
        .await
        .map(Json)
        .map_err(|e| (status_for(&e), e.to_string()))
}

fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
        AnalysisError::Fetch { .. } => StatusCode::BAD_GATEWAY,
    }
}
