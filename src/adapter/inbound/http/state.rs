use std::sync::Arc;

use crate::application::{ListingAggregator, OptimizationEngine, ScanOrchestrator};
use crate::port::SiteCatalog;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub scans: Arc<ScanOrchestrator>,
    pub optimizer: Arc<OptimizationEngine>,
    pub catalog: Arc<dyn SiteCatalog>,
    /// Acceptance rules applied to inline optimize requests.
    pub aggregator: ListingAggregator,
}
