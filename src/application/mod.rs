//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases: scanning vendor sites,
//! aggregating their listings and optimizing purchase plans.

pub mod aggregate;
pub mod optimize;
pub mod scan;

pub use aggregate::{AcceptanceRules, ListingAggregator};
pub use optimize::{OptimizationEngine, OptimizationResult, OptimizerConfig};
pub use scan::{ScanConfig, ScanOrchestrator};
