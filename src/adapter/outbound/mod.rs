//! Outbound adapters: solver backends, vendor-site fetchers, site catalog.

pub mod catalog;
pub mod fetch;
pub mod solver;
