//! Route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use super::dto::{HealthResponse, OptimizeRequest, ProbeRequest, ScanRequest, ScanStarted};
use super::error::{AppError, AppResult};
use super::state::AppState;
use crate::application::optimize::{test_optimization_config, OptimizationResult, ProbeReport};
use crate::domain::card::validate_buylist;
use crate::domain::scan::ScanJobView;
use crate::domain::{JobId, SiteDescriptor};
use crate::error::{Error, OptimizeError};

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let sites = state.catalog.list().await?.len();
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sites,
        scan_jobs: state.scans.job_count(),
    }))
}

// ---------------------------------------------------------------------------
// GET /sites
// ---------------------------------------------------------------------------

pub async fn list_sites(State(state): State<AppState>) -> AppResult<Json<Vec<SiteDescriptor>>> {
    Ok(Json(state.catalog.list().await?))
}

// ---------------------------------------------------------------------------
// Scans
// ---------------------------------------------------------------------------

/// POST /scan -- start a scan and return its job id.
pub async fn start_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> AppResult<impl IntoResponse> {
    let sites = if request.site_ids.is_empty() {
        state.catalog.scannable().await?
    } else {
        state.catalog.select(&request.site_ids).await?
    };
    let site_count = sites.len();
    let job_id = state.scans.start_scan(request.card_list, sites)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ScanStarted {
            job_id,
            sites: site_count,
        }),
    ))
}

/// GET /scan/{job_id} -- current snapshot.
pub async fn scan_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.scans.get_status(job_id)?;
    let body = serde_json::to_value(ScanJobView::from(&job)).map_err(Error::from)?;
    Ok(Json(body))
}

/// POST /scan/{job_id}/cancel
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<StatusCode> {
    state.scans.cancel(job_id).await?;
    Ok(StatusCode::ACCEPTED)
}

// ---------------------------------------------------------------------------
// Optimization
// ---------------------------------------------------------------------------

/// POST /optimize
///
/// Dropping the connection drops the engine future, which cancels the run.
pub async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> AppResult<Json<OptimizationResult>> {
    validate_buylist(&request.card_list).map_err(Error::from)?;
    let config = request.resolve_config(state.optimizer.settings())?;

    let pool = match request.scan_job_id {
        Some(job_id) => {
            let scanned = state
                .scans
                .candidates(job_id)?
                .ok_or_else(|| AppError::Conflict(format!("scan {job_id} has not completed")))?;
            if request.card_list.is_empty() {
                scanned
            } else {
                Arc::new(
                    state
                        .aggregator
                        .aggregate_flat(&request.card_list, scanned.listings().iter().cloned()),
                )
            }
        }
        None if request.card_list.is_empty() => {
            return Err(AppError::BadRequest(
                "card_list is required unless scan_job_id is given".into(),
            ))
        }
        None => Arc::new(request.inline_pool(&state.aggregator)),
    };

    info!(
        algorithm = %config.algorithm(),
        cards = pool.cards().len(),
        listings = pool.listings().len(),
        "Optimization requested"
    );
    let result = state.optimizer.optimize(pool, config).await?;
    Ok(Json(result))
}

/// POST /test_optimization_config
pub async fn probe_config(
    State(state): State<AppState>,
    Json(request): Json<ProbeRequest>,
) -> AppResult<Json<ProbeReport>> {
    let engine = Arc::clone(&state.optimizer);
    let report = tokio::task::spawn_blocking(move || {
        test_optimization_config(&engine, &request.overrides)
    })
    .await
    .map_err(|e| AppError::from(OptimizeError::Internal(e.to_string())))?;
    Ok(Json(report))
}
