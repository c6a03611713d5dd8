//! Monthly cost model

use crate::models::PlanResult;

/// Hours in a billing month; providers are compared over a fixed 31-day month
pub const HOURS_PER_MONTH: f64 = 24.0 * 31.0;

/// Monthly price of running `node_count` nodes at `hourly_price` each
pub fn monthly_cost(hourly_price: f64, node_count: u32) -> f64 {
    hourly_price * f64::from(node_count) * HOURS_PER_MONTH
}

impl PlanResult {
    /// Price a converged node count
    pub fn priced(instance_type: impl Into<String>, hourly_price: f64, node_count: u32) -> Self {
        Self {
            instance_type: instance_type.into(),
            node_count,
            hourly_price,
            total_price_per_month: monthly_cost(hourly_price, node_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_per_month() {
        assert_eq!(HOURS_PER_MONTH, 744.0);
    }

    #[test]
    fn test_monthly_cost() {
        assert_eq!(monthly_cost(0.10, 5), 0.10 * 5.0 * 744.0);
        assert!((monthly_cost(0.10, 5) - 372.0).abs() < 1e-9);
        assert_eq!(monthly_cost(0.096, 0), 0.0);
        assert_eq!(monthly_cost(0.0, 12), 0.0);
    }

    #[test]
    fn test_priced_result() {
        let result = PlanResult::priced("m5.large", 0.20, 2);
        assert_eq!(result.instance_type, "m5.large");
        assert_eq!(result.node_count, 2);
        assert!((result.total_price_per_month - 297.6).abs() < 1e-9);
    }
}
