//! Buylist optimizer - card vendor scanning and purchase-plan optimization.
//!
//! Given a buylist of trading cards, the crate scans vendor sites for
//! matching listings, pools the acceptable ones per card, and computes
//! purchase plans that trade off total cost, card quality, availability
//! and the number of stores involved.
//!
//! # Architecture
//!
//! The crate follows a ports-and-adapters layout:
//!
//! - **`domain`** - Buylist cards, listings, sites, scan jobs, solutions and
//!   the Pareto front. No I/O.
//! - **`port`** - Traits at the seams: [`port::SiteFetcher`],
//!   [`port::SiteCatalog`], [`port::Solver`] and
//!   [`port::OptimizationStrategy`].
//! - **`application`** - Scan orchestration, listing aggregation and the
//!   optimization engine (MILP, NSGA-II, MOEA/D, hybrid fallback).
//! - **`adapter`** - HTTP API and CLI inbound; vendor fetchers, the static
//!   site catalog and the HiGHS solver outbound.
//! - **`infrastructure`** - TOML configuration, logging and runtime wiring.
//!
//! # Features
//!
//! - `testkit` - Scripted fetchers, solvers and fixtures for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use buylist_optimizer::application::ListingAggregator;
//! use buylist_optimizer::infrastructure::bootstrap::build_optimizer;
//! use buylist_optimizer::infrastructure::config::Config;
//! use buylist_optimizer::domain::{BuylistCard, MarketplaceListing, OptimizationConfig, Quality};
//! use rust_decimal_macros::dec;
//!
//! # async fn run() -> buylist_optimizer::error::Result<()> {
//! let config = Config::default();
//! let buylist = vec![BuylistCard::new("Lightning Bolt", 4)];
//! let listings = vec![MarketplaceListing::try_new("store-a", "Lightning Bolt", Quality::Nm, 4, dec!(1.00))?];
//!
//! let pool = ListingAggregator::default().aggregate_flat(&buylist, listings);
//! let engine = Arc::new(build_optimizer(&config));
//! let result = engine.optimize(Arc::new(pool), OptimizationConfig::default()).await?;
//! println!("{} plans", result.solutions.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
