//! Optimizer configuration: consumed user settings plus engine tunables.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::aggregate::AcceptanceRules;
use crate::domain::optimization::OptimizationConfigBuilder;
use crate::domain::{Algorithm, DomainError, MonitoringFlags, OptimizationConfig};
use crate::error::ConfigError;

/// `[optimizer]` section.
///
/// The first block mirrors the user settings owned by the settings UI and
/// accepts their camelCase names. The rest tune the engine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default, alias = "defaultOptimizationStrategy")]
    pub default_strategy: Algorithm,
    #[serde(default = "default_fallback", alias = "fallbackOptimizationStrategy")]
    pub fallback_strategy: Algorithm,
    /// Seconds.
    #[serde(default = "default_time_limit", alias = "defaultTimeLimit")]
    pub default_time_limit: u64,
    #[serde(default = "default_population_size", alias = "defaultPopulationSize")]
    pub default_population_size: usize,
    #[serde(
        default = "default_convergence_threshold",
        alias = "defaultConvergenceThreshold"
    )]
    pub default_convergence_threshold: f64,
    #[serde(default, alias = "enablePerformanceMonitoring")]
    pub enable_performance_monitoring: bool,
    #[serde(default, alias = "enableAlgorithmComparison")]
    pub enable_algorithm_comparison: bool,
    #[serde(default, alias = "logOptimizationDetails")]
    pub log_optimization_details: bool,

    /// Linear cost added per distinct site in the MILP objective.
    #[serde(default = "default_store_penalty")]
    pub store_penalty: Decimal,
    /// `auto` picks MILP below this cards × listings-per-card product.
    #[serde(default = "default_small_problem_threshold")]
    pub small_problem_threshold: f64,
    /// Share of the time limit `hybrid` gives its MILP stage.
    #[serde(default = "default_hybrid_milp_fraction")]
    pub hybrid_milp_fraction: f64,
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Consecutive low-change generations before a heuristic stops.
    #[serde(default = "default_stall_generations")]
    pub stall_generations: usize,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Optimization runs allowed at once.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
    #[serde(default)]
    pub acceptance: AcceptanceRules,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_strategy: Algorithm::Auto,
            fallback_strategy: default_fallback(),
            default_time_limit: default_time_limit(),
            default_population_size: default_population_size(),
            default_convergence_threshold: default_convergence_threshold(),
            enable_performance_monitoring: false,
            enable_algorithm_comparison: false,
            log_optimization_details: false,
            store_penalty: default_store_penalty(),
            small_problem_threshold: default_small_problem_threshold(),
            hybrid_milp_fraction: default_hybrid_milp_fraction(),
            max_generations: default_max_generations(),
            stall_generations: default_stall_generations(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            max_concurrent_runs: default_max_concurrent_runs(),
            acceptance: AcceptanceRules::default(),
        }
    }
}

const fn default_fallback() -> Algorithm {
    Algorithm::Nsga2
}

const fn default_time_limit() -> u64 {
    300
}

const fn default_population_size() -> usize {
    100
}

const fn default_convergence_threshold() -> f64 {
    1e-3
}

const fn default_store_penalty() -> Decimal {
    dec!(0.50)
}

const fn default_small_problem_threshold() -> f64 {
    400.0
}

const fn default_hybrid_milp_fraction() -> f64 {
    0.5
}

const fn default_max_generations() -> usize {
    250
}

const fn default_stall_generations() -> usize {
    10
}

const fn default_mutation_rate() -> f64 {
    0.1
}

const fn default_crossover_rate() -> f64 {
    0.9
}

fn default_max_concurrent_runs() -> usize {
    num_cpus::get().max(1)
}

impl OptimizerConfig {
    /// Monitoring flags from the user settings.
    #[must_use]
    pub const fn monitoring(&self) -> MonitoringFlags {
        MonitoringFlags {
            performance_monitoring: self.enable_performance_monitoring,
            algorithm_comparison: self.enable_algorithm_comparison,
            detailed_logging: self.log_optimization_details,
        }
    }

    /// Builder pre-filled with the user's defaults.
    #[must_use]
    pub fn request_builder(&self) -> OptimizationConfigBuilder {
        OptimizationConfig::builder()
            .algorithm(self.default_strategy)
            .fallback(self.fallback_strategy)
            .time_limit_secs(self.default_time_limit)
            .population_size(self.default_population_size)
            .convergence_threshold(self.default_convergence_threshold)
            .monitoring(self.monitoring())
    }

    /// Heuristic search parameters.
    #[must_use]
    pub const fn search_params(&self) -> SearchParams {
        SearchParams {
            max_generations: self.max_generations,
            stall_generations: self.stall_generations,
            mutation_rate: self.mutation_rate,
            crossover_rate: self.crossover_rate,
        }
    }

    /// Validate tunables and the default request.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(err) = self.request_builder().violations().into_iter().next() {
            return Err(ConfigError::InvalidValue {
                field: "optimizer",
                reason: err.to_string(),
            });
        }
        if self.store_penalty < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "optimizer.store_penalty",
                reason: "must be non-negative".into(),
            });
        }
        if !(self.small_problem_threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "optimizer.small_problem_threshold",
                reason: "must be positive".into(),
            });
        }
        if !(self.hybrid_milp_fraction > 0.0 && self.hybrid_milp_fraction < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "optimizer.hybrid_milp_fraction",
                reason: "must be in (0, 1)".into(),
            });
        }
        for (field, rate) in [
            ("optimizer.mutation_rate", self.mutation_rate),
            ("optimizer.crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be in [0, 1]".into(),
                });
            }
        }
        for (field, value) in [
            ("optimizer.max_generations", self.max_generations),
            ("optimizer.stall_generations", self.stall_generations),
            ("optimizer.max_concurrent_runs", self.max_concurrent_runs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }
}

/// Knobs shared by the evolutionary strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub max_generations: usize,
    pub stall_generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        OptimizerConfig::default().search_params()
    }
}

/// Per-request overrides. Missing fields fall back to [`OptimizerConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, alias = "strategy", alias = "primary_algorithm")]
    pub algorithm: Option<Algorithm>,
    #[serde(default, alias = "fallback_algorithm")]
    pub fallback: Option<Algorithm>,
    #[serde(default, alias = "timeLimit")]
    pub time_limit: Option<u64>,
    #[serde(default, alias = "populationSize")]
    pub population_size: Option<usize>,
    #[serde(default, alias = "convergenceThreshold")]
    pub convergence_threshold: Option<f64>,
    #[serde(default)]
    pub performance_monitoring: Option<bool>,
    #[serde(default)]
    pub algorithm_comparison: Option<bool>,
    #[serde(default)]
    pub detailed_logging: Option<bool>,
}

impl ConfigOverrides {
    /// Merge onto the defaults without validating.
    #[must_use]
    pub fn apply(&self, defaults: &OptimizerConfig, seed: Option<u64>) -> OptimizationConfigBuilder {
        let base = defaults.monitoring();
        let monitoring = MonitoringFlags {
            performance_monitoring: self
                .performance_monitoring
                .unwrap_or(base.performance_monitoring),
            algorithm_comparison: self.algorithm_comparison.unwrap_or(base.algorithm_comparison),
            detailed_logging: self.detailed_logging.unwrap_or(base.detailed_logging),
        };
        let mut builder = defaults.request_builder().monitoring(monitoring).seed(seed);
        if let Some(algorithm) = self.algorithm {
            builder = builder.algorithm(algorithm);
        }
        if let Some(fallback) = self.fallback {
            builder = builder.fallback(fallback);
        }
        if let Some(secs) = self.time_limit {
            builder = builder.time_limit_secs(secs);
        }
        if let Some(size) = self.population_size {
            builder = builder.population_size(size);
        }
        if let Some(threshold) = self.convergence_threshold {
            builder = builder.convergence_threshold(threshold);
        }
        builder
    }

    /// Merge onto the defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns the first violated range or fallback rule.
    pub fn resolve(
        &self,
        defaults: &OptimizerConfig,
        seed: Option<u64>,
    ) -> Result<OptimizationConfig, DomainError> {
        self.apply(defaults, seed).build()
    }
}
