use buylist_optimizer::domain::pareto::solution_dominates;
use buylist_optimizer::domain::Solution;
use rust_decimal::Decimal;

pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// No member dominates another and members are sorted by cost.
pub fn assert_valid_front(front: &[Solution]) {
    for (i, a) in front.iter().enumerate() {
        for (j, b) in front.iter().enumerate() {
            assert!(
                i == j || !solution_dominates(a, b),
                "front member {i} dominates member {j}"
            );
        }
    }
    assert!(
        front.windows(2).all(|w| w[0].total_cost <= w[1].total_cost),
        "front is not sorted by total_cost"
    );
}
