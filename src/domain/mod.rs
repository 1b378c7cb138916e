//! Core domain types: buylists, sites, listings, scan state,
//! optimization settings, purchase plans and Pareto dominance.

pub mod card;
pub mod constraint;
pub mod error;
pub mod id;
pub mod listing;
pub mod optimization;
pub mod pareto;
pub mod pool;
pub mod scan;
pub mod site;
pub mod solution;

pub use card::{normalize_name, BuylistCard, Quality};
pub use error::DomainError;
pub use id::{JobId, SiteId};
pub use listing::MarketplaceListing;
pub use optimization::{Algorithm, MonitoringFlags, OptimizationConfig};
pub use pareto::ParetoFront;
pub use pool::{CandidatePool, CardCandidates};
pub use scan::{ScanJob, ScanStatus, SiteSubtask, SubtaskStatus};
pub use site::{ParseMethod, SiteDescriptor, SiteType};
pub use solution::{CardAssignment, Objectives, Pick, Solution};
