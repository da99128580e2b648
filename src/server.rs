//! Web server - Axum routes in front of the scan pipeline

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::ScanError;
use crate::profiles::{ScanKind, PROFILES};
use crate::response::ScanResponse;
use crate::scan_types::{ProfileInfo, ScanRequest};
use crate::scanner::Scanner;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state
pub struct AppState {
    pub scanner: Scanner,
    pub templates_path: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            scanner: Scanner::new(config),
            templates_path: config.templates_path.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan", post(full_scan))
        .route("/quick", post(quick_scan))
        .route("/cves", post(cve_scan))
        .route("/technologies", post(technology_scan))
        .route("/exposures", post(exposure_scan))
        .route("/misconfigs", post(misconfig_scan))
        .route("/templates", get(list_templates))
        .route("/profiles", get(list_profiles))
        .route("/version", get(version))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the web server
pub async fn run(config: Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.results_dir)
        .await
        .with_context(|| format!("creating results dir {}", config.results_dir.display()))?;

    let state = Arc::new(AppState::new(&config));
    tracing::info!(
        "Engine {} with {} slots, templates at {}",
        state.scanner.engine().display(),
        config.max_concurrent_scans,
        state.templates_path.display()
    );

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================
// SCAN HANDLERS
// ============================================

type ScanBody = Result<Json<ScanRequest>, JsonRejection>;

async fn run_profile(
    state: &AppState,
    kind: ScanKind,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    let Json(request) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => ScanError::validation("target required"),
        other => ScanError::validation(format!("invalid request body: {}", other.body_text())),
    })?;
    let response = state.scanner.scan(kind, &request).await?;
    Ok(Json(response))
}

async fn full_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Custom, body).await
}

async fn quick_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Quick, body).await
}

async fn cve_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Cves, body).await
}

async fn technology_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Technologies, body).await
}

async fn exposure_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Exposures, body).await
}

async fn misconfig_scan(
    State(state): State<Arc<AppState>>,
    body: ScanBody,
) -> Result<Json<ScanResponse>, ScanError> {
    run_profile(&state, ScanKind::Misconfigs, body).await
}

// ============================================
// METADATA HANDLERS
// ============================================

#[derive(Serialize)]
struct VersionResponse {
    version: String,
}

async fn list_templates(State(state): State<Arc<AppState>>) -> Result<Json<Catalog>, ScanError> {
    let root = state.templates_path.clone();
    // Directory walk is blocking, keep it off the async workers
    let catalog = tokio::task::spawn_blocking(move || catalog::read_catalog(&root))
        .await
        .map_err(|_| ScanError::Internal("catalog task panicked".into()))??;
    Ok(Json(catalog))
}

async fn list_profiles() -> Json<Vec<ProfileInfo>> {
    Json(PROFILES.iter().map(|p| p.info()).collect())
}

async fn version(State(state): State<Arc<AppState>>) -> Result<Json<VersionResponse>, ScanError> {
    let version = state.scanner.version().await?;
    Ok(Json(VersionResponse { version }))
}

async fn health_check() -> &'static str {
    "ok"
}
