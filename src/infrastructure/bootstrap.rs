//! Composition root: wires configuration into services and the HTTP server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::adapter::inbound::http::{build_router, AppState};
use crate::adapter::outbound::catalog::StaticSiteCatalog;
use crate::adapter::outbound::fetch::FetcherRegistry;
use crate::adapter::outbound::solver::HiGHSSolver;
use crate::application::{ListingAggregator, OptimizationEngine, ScanOrchestrator};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::{SiteCatalog, Solver};

/// Built-in fetchers sharing one HTTP client configured from `[http]`.
#[must_use]
pub fn build_fetchers(config: &Config) -> FetcherRegistry {
    FetcherRegistry::builder()
        .http(config.http.clone())
        .with_builtin()
        .build()
}

/// Optimization engine with the HiGHS backend.
#[must_use]
pub fn build_optimizer(config: &Config) -> OptimizationEngine {
    let solver: Arc<dyn Solver> = Arc::new(HiGHSSolver::new());
    OptimizationEngine::from_config(&config.optimizer, solver)
}

/// Application state with the production adapters.
#[must_use]
pub fn build_state(config: &Config) -> AppState {
    build_state_with(
        config,
        build_fetchers(config),
        Arc::new(build_optimizer(config)),
        Arc::new(StaticSiteCatalog::new(config.sites.clone())),
    )
}

/// Application state with caller-supplied adapters.
#[must_use]
pub fn build_state_with(
    config: &Config,
    fetchers: FetcherRegistry,
    optimizer: Arc<OptimizationEngine>,
    catalog: Arc<dyn SiteCatalog>,
) -> AppState {
    let aggregator = ListingAggregator::new(config.optimizer.acceptance);
    let scans = Arc::new(ScanOrchestrator::new(
        fetchers,
        aggregator,
        config.scan.clone(),
    ));
    AppState {
        scans,
        optimizer,
        catalog,
        aggregator,
    }
}

/// Serve the HTTP API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.server.socket_addr()?;
    let state = build_state(&config);
    let router = build_router(state, &config.server);

    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        sites = config.sites.len(),
        max_concurrent_fetches = config.scan.max_concurrent_fetches,
        max_concurrent_runs = config.optimizer.max_concurrent_runs,
        "HTTP API listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
