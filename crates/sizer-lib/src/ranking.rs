//! Result ranking

use crate::models::PlanResult;

/// Order plan results cheapest first
///
/// Equal prices fall back to the smaller node count; anything still tied
/// keeps its input order.
pub fn rank(mut results: Vec<PlanResult>) -> Vec<PlanResult> {
    results.sort_by(|a, b| {
        a.total_price_per_month
            .total_cmp(&b.total_price_per_month)
            .then_with(|| a.node_count.cmp(&b.node_count))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, node_count: u32, monthly: f64) -> PlanResult {
        PlanResult {
            instance_type: name.to_string(),
            node_count,
            hourly_price: 0.0,
            total_price_per_month: monthly,
        }
    }

    fn names(results: &[PlanResult]) -> Vec<&str> {
        results.iter().map(|r| r.instance_type.as_str()).collect()
    }

    #[test]
    fn test_cheapest_first() {
        let ranked = rank(vec![
            result("a", 4, 300.0),
            result("b", 3, 150.0),
            result("c", 6, 300.0),
        ]);

        assert_eq!(names(&ranked), ["b", "a", "c"]);
    }

    #[test]
    fn test_ties_break_on_node_count() {
        let ranked = rank(vec![result("more", 6, 100.0), result("fewer", 3, 100.0)]);
        assert_eq!(names(&ranked), ["fewer", "more"]);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let ranked = rank(vec![
            result("first", 2, 50.0),
            result("second", 2, 50.0),
            result("third", 2, 50.0),
        ]);
        assert_eq!(names(&ranked), ["first", "second", "third"]);
    }

    #[test]
    fn test_idempotent() {
        let once = rank(vec![
            result("x", 5, 90.0),
            result("y", 2, 120.0),
            result("z", 3, 90.0),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
