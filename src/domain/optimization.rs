//! Optimization configuration with validated ranges.
//!
//! [`OptimizationConfig`] can only be obtained through its builder, which
//! rejects out-of-range values up front.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Allowed optimization time limit, in seconds.
pub const TIME_LIMIT_SECS: RangeInclusive<u64> = 60..=3600;
/// Allowed heuristic population size.
pub const POPULATION_SIZE: RangeInclusive<usize> = 50..=1000;
/// Allowed convergence threshold.
pub const CONVERGENCE_THRESHOLD: RangeInclusive<f64> = 1e-4..=1e-1;

/// Optimization algorithm selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Pick `milp` or `nsga2` from the problem size.
    #[default]
    Auto,
    /// Exact mixed-integer linear program.
    Milp,
    /// NSGA-II multi-objective genetic search.
    Nsga2,
    /// MOEA/D decomposition-based multi-objective search.
    Moead,
    /// MILP first with a share of the time budget, then the fallback.
    Hybrid,
}

impl Algorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Milp => "milp",
            Self::Nsga2 => "nsga2",
            Self::Moead => "moead",
            Self::Hybrid => "hybrid",
        }
    }

    /// Returns `true` for algorithms that run directly, without delegating.
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        matches!(self, Self::Milp | Self::Nsga2 | Self::Moead)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "milp" => Ok(Self::Milp),
            "nsga2" | "nsga-ii" | "nsgaii" => Ok(Self::Nsga2),
            "moead" | "moea/d" => Ok(Self::Moead),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(DomainError::UnknownVariant {
                kind: "algorithm",
                value: s.to_string(),
            }),
        }
    }
}

/// Monitoring switches. They only affect logging, never results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringFlags {
    #[serde(default)]
    pub performance_monitoring: bool,
    #[serde(default)]
    pub algorithm_comparison: bool,
    #[serde(default)]
    pub detailed_logging: bool,
}

/// Validated optimization settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationConfig {
    algorithm: Algorithm,
    fallback: Algorithm,
    #[serde(with = "duration_secs")]
    time_limit: Duration,
    population_size: usize,
    convergence_threshold: f64,
    monitoring: MonitoringFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl OptimizationConfig {
    #[must_use]
    pub fn builder() -> OptimizationConfigBuilder {
        OptimizationConfigBuilder::default()
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub const fn fallback(&self) -> Algorithm {
        self.fallback
    }

    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    #[must_use]
    pub const fn population_size(&self) -> usize {
        self.population_size
    }

    #[must_use]
    pub const fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    #[must_use]
    pub const fn monitoring(&self) -> MonitoringFlags {
        self.monitoring
    }

    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Copy of this config running `algorithm` with a different time budget.
    ///
    /// Used by the engine to hand a derived budget to a delegate strategy.
    #[must_use]
    pub fn delegate(&self, algorithm: Algorithm, time_limit: Duration) -> Self {
        Self {
            algorithm,
            time_limit,
            ..self.clone()
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        let builder = OptimizationConfigBuilder::default();
        Self {
            algorithm: builder.algorithm,
            fallback: builder.fallback,
            time_limit: Duration::from_secs(builder.time_limit_secs),
            population_size: builder.population_size,
            convergence_threshold: builder.convergence_threshold,
            monitoring: builder.monitoring,
            seed: None,
        }
    }
}

/// Builder for [`OptimizationConfig`].
#[derive(Debug, Clone)]
pub struct OptimizationConfigBuilder {
    algorithm: Algorithm,
    fallback: Algorithm,
    time_limit_secs: u64,
    population_size: usize,
    convergence_threshold: f64,
    monitoring: MonitoringFlags,
    seed: Option<u64>,
}

impl Default for OptimizationConfigBuilder {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Auto,
            fallback: Algorithm::Nsga2,
            time_limit_secs: 300,
            population_size: 100,
            convergence_threshold: 1e-3,
            monitoring: MonitoringFlags::default(),
            seed: None,
        }
    }
}

impl OptimizationConfigBuilder {
    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn fallback(mut self, fallback: Algorithm) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    #[must_use]
    pub fn convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    #[must_use]
    pub fn monitoring(mut self, monitoring: MonitoringFlags) -> Self {
        self.monitoring = monitoring;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Collect every violated rule instead of stopping at the first.
    #[must_use]
    pub fn violations(&self) -> Vec<DomainError> {
        let mut errors = Vec::new();
        if !self.fallback.is_concrete() {
            errors.push(DomainError::InvalidFallback(self.fallback.to_string()));
        }
        if !TIME_LIMIT_SECS.contains(&self.time_limit_secs) {
            errors.push(DomainError::out_of_range(
                "time_limit",
                self.time_limit_secs,
                TIME_LIMIT_SECS.start(),
                TIME_LIMIT_SECS.end(),
            ));
        }
        if !POPULATION_SIZE.contains(&self.population_size) {
            errors.push(DomainError::out_of_range(
                "population_size",
                self.population_size,
                POPULATION_SIZE.start(),
                POPULATION_SIZE.end(),
            ));
        }
        if !CONVERGENCE_THRESHOLD.contains(&self.convergence_threshold) {
            errors.push(DomainError::out_of_range(
                "convergence_threshold",
                self.convergence_threshold,
                CONVERGENCE_THRESHOLD.start(),
                CONVERGENCE_THRESHOLD.end(),
            ));
        }
        errors
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn build(self) -> Result<OptimizationConfig, DomainError> {
        if let Some(err) = self.violations().into_iter().next() {
            return Err(err);
        }
        Ok(OptimizationConfig {
            algorithm: self.algorithm,
            fallback: self.fallback,
            time_limit: Duration::from_secs(self.time_limit_secs),
            population_size: self.population_size,
            convergence_threshold: self.convergence_threshold,
            monitoring: self.monitoring,
            seed: self.seed,
        })
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
