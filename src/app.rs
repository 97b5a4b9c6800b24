// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, the version handler, OpenAPI document and router
//! construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::analyze::AnalyzeRequest;
use crate::models::config::{AnalysisConfig, RenderThresholds, WaitPolicy};
use crate::models::report::{
    CategoryCount, FeedKind, FeedRef, MenuItem, MenuSummary, RenderMode, RenderSignals, SiteReport,
};
use crate::models::version::VersionResponse;
use crate::routes::analyze_router;
use crate::services::fetcher::FetcherFactory;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `MENU_SCOUT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("MENU_SCOUT_VERSION");

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Used when a request carries no config of its own
    pub config: AnalysisConfig,
    pub fetchers: Arc<dyn FetcherFactory>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Service version", body = VersionResponse)),
    tag = "meta"
)]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "menu-scout".to_string(),
        version: VERSION.to_string(),
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(version_handler, crate::routes::analyze::analyze_handler),
    components(schemas(
        AnalyzeRequest,
        AnalysisConfig,
        RenderThresholds,
        WaitPolicy,
        SiteReport,
        RenderMode,
        FeedRef,
        FeedKind,
        MenuItem,
        RenderSignals,
        MenuSummary,
        CategoryCount,
        VersionResponse
    )),
    tags(
        (name = "analysis", description = "Site accessibility analysis"),
        (name = "meta", description = "Service information")
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router with Swagger UI at `/swagger-ui`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .merge(analyze_router())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
