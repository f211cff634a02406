/// Amounts whose magnitude is below this are treated as exactly zero.
///
/// Expense shares are computed with plain `f64` division, so balances pick up
/// rounding noise. Both the balance view and the settlement planner compare
/// against this constant instead of against `0.0`.
pub const EPSILON: f64 = 0.01;

pub fn is_negligible(amount: f64) -> bool {
    amount.abs() < EPSILON
}

pub fn round_to_2_decimals(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_below_epsilon_are_negligible() {
        assert!(is_negligible(0.0));
        assert!(is_negligible(0.009));
        assert!(is_negligible(-0.009));
        assert!(!is_negligible(0.01));
        assert!(!is_negligible(-0.5));
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_to_2_decimals(10.0 / 3.0), 3.33);
        assert_eq!(round_to_2_decimals(-20.0 / 3.0), -6.67);
        assert_eq!(round_to_2_decimals(12.345_1), 12.35);
    }
}
