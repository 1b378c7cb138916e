//! Optimization engine: algorithm selection, exact and evolutionary
//! strategies, fallback coordination and the configuration probe.

pub mod config;
pub mod engine;
pub mod evolution;
pub mod genome;
pub mod hybrid;
pub mod milp;
pub mod moead;
pub mod nsga2;
pub mod probe;
pub mod registry;
pub mod result;
pub mod selection;

pub use config::{ConfigOverrides, OptimizerConfig, SearchParams};
pub use engine::OptimizationEngine;
pub use hybrid::{Execution, ExecutionFailure, HybridCoordinator};
pub use milp::{MilpStrategy, PurchaseModel};
pub use moead::MoeadStrategy;
pub use nsga2::Nsga2Strategy;
pub use probe::{test_optimization_config, ProbeReport, ProbeRun};
pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use result::{Attempt, AttemptOutcome, OptimizationResult, RunMetrics};
pub use selection::{plan, select_for_size, Budget, PlannedRun};
