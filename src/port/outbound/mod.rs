//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as vendor
//! sites, solver backends and the site catalog.

pub mod catalog;
pub mod fetch;
pub mod solver;
