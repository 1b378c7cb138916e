//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (vendor sites, solver backends, the site-management service).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │  Fetch  │            │   Solver    │              │  Catalog  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`SiteFetcher`], [`ProgressSink`] - Per-site fetch capability
//! - [`Solver`] - ILP optimization backend
//! - [`SiteCatalog`] - Vendor site descriptors
//! - [`OptimizationStrategy`] - Interchangeable optimization algorithms

pub mod inbound;
pub mod outbound;

pub use inbound::strategy::{OptimizationStrategy, StrategyOutput};
pub use outbound::catalog::SiteCatalog;
pub use outbound::fetch::{NoopProgress, ProgressSink, SiteFetcher};
pub use outbound::solver::{
    Constraint, ConstraintSense, IlpProblem, LpProblem, LpSolution, SolutionStatus, SolveLimits,
    Solver, VariableBounds,
};
