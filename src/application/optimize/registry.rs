use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::config::{OptimizerConfig, SearchParams};
use super::milp::MilpStrategy;
use super::moead::MoeadStrategy;
use super::nsga2::Nsga2Strategy;
use crate::domain::Algorithm;
use crate::port::{OptimizationStrategy, Solver};

/// Concrete optimization strategies keyed by algorithm.
///
/// Use [`StrategyRegistryBuilder`] for convenient construction from config.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<Algorithm, Arc<dyn OptimizationStrategy>>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Register a strategy under its own algorithm, replacing any earlier one.
    pub fn register(&mut self, strategy: Arc<dyn OptimizationStrategy>) {
        self.strategies.insert(strategy.algorithm(), strategy);
    }

    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<Arc<dyn OptimizationStrategy>> {
        self.strategies.get(&algorithm).cloned()
    }

    /// Registered algorithms in a stable order.
    #[must_use]
    pub fn algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms: Vec<_> = self.strategies.keys().copied().collect();
        algorithms.sort_by_key(|a| a.as_str());
        algorithms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}

/// Builder for [`StrategyRegistry`].
///
/// # Example
///
/// ```ignore
/// let registry = StrategyRegistry::builder()
///     .config(&config.optimizer)
///     .solver(Arc::new(HiGHSSolver::new()))
///     .build();
/// ```
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    solver: Option<Arc<dyn Solver>>,
    store_penalty: Decimal,
    search: SearchParams,
    extra: Vec<Arc<dyn OptimizationStrategy>>,
}

impl StrategyRegistryBuilder {
    /// Take store penalty and search parameters from config.
    #[must_use]
    pub fn config(mut self, config: &OptimizerConfig) -> Self {
        self.store_penalty = config.store_penalty;
        self.search = config.search_params();
        self
    }

    /// ILP backend for the MILP strategy. Without one, `milp` is not registered.
    #[must_use]
    pub fn solver(mut self, solver: Arc<dyn Solver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Add or override a strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn OptimizationStrategy>) -> Self {
        self.extra.push(strategy);
        self
    }

    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();
        if let Some(solver) = self.solver {
            registry.register(Arc::new(MilpStrategy::new(solver, self.store_penalty)));
        }
        registry.register(Arc::new(Nsga2Strategy::new(self.search)));
        registry.register(Arc::new(MoeadStrategy::new(self.search)));
        for strategy in self.extra {
            registry.register(strategy);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::solver::HiGHSSolver;

    #[test]
    fn builder_registers_all_concrete_algorithms() {
        let registry = StrategyRegistry::builder()
            .config(&OptimizerConfig::default())
            .solver(Arc::new(HiGHSSolver::new()))
            .build();
        assert_eq!(
            registry.algorithms(),
            vec![Algorithm::Milp, Algorithm::Moead, Algorithm::Nsga2]
        );
    }

    #[test]
    fn milp_needs_a_solver() {
        let registry = StrategyRegistry::builder().build();
        assert!(registry.get(Algorithm::Milp).is_none());
        assert_eq!(registry.len(), 2);
    }
}
