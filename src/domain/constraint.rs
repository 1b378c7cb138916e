//! Linear constraint types for the purchase-plan integer program.
//!
//! Constraints are stored sparsely: a buylist model touches only a handful
//! of variables per row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single linear constraint: `sum(coef * x[var]) {>=, <=, =} rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// `(variable index, coefficient)` pairs. Absent variables have coefficient 0.
    pub terms: Vec<(usize, Decimal)>,
    /// Constraint sense (>=, <=, =).
    pub sense: ConstraintSense,
    /// Right-hand side value.
    pub rhs: Decimal,
}

impl Constraint {
    /// Create a >= constraint.
    #[must_use]
    pub const fn geq(terms: Vec<(usize, Decimal)>, rhs: Decimal) -> Self {
        Self {
            terms,
            sense: ConstraintSense::GreaterEqual,
            rhs,
        }
    }

    /// Create a <= constraint.
    #[must_use]
    pub const fn leq(terms: Vec<(usize, Decimal)>, rhs: Decimal) -> Self {
        Self {
            terms,
            sense: ConstraintSense::LessEqual,
            rhs,
        }
    }

    /// Create an = constraint.
    #[must_use]
    pub const fn eq(terms: Vec<(usize, Decimal)>, rhs: Decimal) -> Self {
        Self {
            terms,
            sense: ConstraintSense::Equal,
            rhs,
        }
    }

    /// Evaluate the left-hand side at `values`.
    #[must_use]
    pub fn lhs(&self, values: &[Decimal]) -> Decimal {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values.get(var).copied().unwrap_or_default())
            .sum()
    }

    /// Returns `true` if `values` satisfy the constraint within `tolerance`.
    #[must_use]
    pub fn is_satisfied(&self, values: &[Decimal], tolerance: Decimal) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            ConstraintSense::GreaterEqual => lhs >= self.rhs - tolerance,
            ConstraintSense::LessEqual => lhs <= self.rhs + tolerance,
            ConstraintSense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Constraint sense (comparison operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    /// Greater than or equal (>=).
    GreaterEqual,
    /// Less than or equal (<=).
    LessEqual,
    /// Equal (=).
    Equal,
}

/// Bounds on a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    /// Lower bound (None = -infinity).
    pub lower: Option<Decimal>,
    /// Upper bound (None = +infinity).
    pub upper: Option<Decimal>,
}

impl Default for VariableBounds {
    fn default() -> Self {
        Self {
            lower: Some(Decimal::ZERO),
            upper: None,
        }
    }
}

impl VariableBounds {
    /// Binary variable bounds [0, 1].
    #[must_use]
    pub const fn binary() -> Self {
        Self {
            lower: Some(Decimal::ZERO),
            upper: Some(Decimal::ONE),
        }
    }

    /// Non-negative variable [0, +inf).
    #[must_use]
    pub fn non_negative() -> Self {
        Self::default()
    }

    /// Bounded variable [lower, upper].
    #[must_use]
    pub const fn bounded(lower: Decimal, upper: Decimal) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Returns `true` if `value` lies within the bounds (with `tolerance`).
    #[must_use]
    pub fn contains(&self, value: Decimal, tolerance: Decimal) -> bool {
        self.lower.map_or(true, |lb| value >= lb - tolerance)
            && self.upper.map_or(true, |ub| value <= ub + tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sparse_lhs_ignores_missing_variables() {
        let c = Constraint::eq(vec![(0, dec!(2)), (2, dec!(1))], dec!(5));
        assert_eq!(c.lhs(&[dec!(2), dec!(100), dec!(1)]), dec!(5));
        assert!(c.is_satisfied(&[dec!(2), dec!(0), dec!(1)], dec!(0.001)));
    }

    #[test]
    fn senses_check_the_right_side() {
        let values = [dec!(3)];
        assert!(Constraint::geq(vec![(0, dec!(1))], dec!(2)).is_satisfied(&values, dec!(0)));
        assert!(!Constraint::leq(vec![(0, dec!(1))], dec!(2)).is_satisfied(&values, dec!(0)));
    }

    #[test]
    fn bounds_contain() {
        assert!(VariableBounds::binary().contains(dec!(1), dec!(0)));
        assert!(!VariableBounds::binary().contains(dec!(2), dec!(0)));
        assert!(VariableBounds::non_negative().contains(dec!(1000), dec!(0)));
    }
}
