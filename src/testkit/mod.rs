//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fetch`] - Scripted [`SiteFetcher`](crate::port::SiteFetcher): canned
//!   listings, failures, slow and hanging sites, panics.
//! - [`solver`] - Scripted [`Solver`](crate::port::Solver) returning a fixed
//!   status or error.
//! - [`domain`] - Builders for sites, listings, buylists and pools.
//! - [`config`] - Canonical test configurations and a ready [`AppState`](crate::adapter::inbound::http::AppState).

pub mod config;
pub mod domain;
pub mod fetch;
pub mod solver;
