//! ILP solver backends.

mod highs;

pub use highs::HiGHSSolver;
