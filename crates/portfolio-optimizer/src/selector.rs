use crate::models::InterventionRoi;

/// Picks a subset of ranked interventions that fits a budget.
///
/// Implementations must never return a selection whose summed cost exceeds
/// `budget`. An exact knapsack or ILP solver can be plugged in here.
pub trait BudgetSelector: Send + Sync {
    fn select(&self, ranked: Vec<InterventionRoi>, budget: f64) -> Vec<InterventionRoi>;
}

/// Walks the ranking once and takes every item that still fits.
///
/// No partial acceptance and no backtracking, so the result can be worse
/// than the best possible packing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySelector;

impl BudgetSelector for GreedySelector {
    fn select(&self, ranked: Vec<InterventionRoi>, budget: f64) -> Vec<InterventionRoi> {
        let mut remaining = budget;
        let mut selected = Vec::new();
        for item in ranked {
            if item.is_fundable() && item.cost <= remaining {
                remaining -= item.cost;
                selected.push(item);
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, cost: f64) -> InterventionRoi {
        InterventionRoi {
            id: id.to_string(),
            intervention_type: "Outreach".to_string(),
            target_measure: "BCS".to_string(),
            expected_gap_closure: 5.0,
            cost,
            member_count: 100,
            star_weight: 0.1,
            estimated_closures: 5,
            cost_per_closure: cost / 5.0,
            revenue_from_closures: 500.0,
            star_rating_bonus: 0.0,
            financial_impact: 500.0,
            net_roi: 500.0 - cost,
            roi_ratio: 1.0,
            confidence_score: 85.0,
        }
    }

    #[test]
    fn test_greedy_skips_items_that_do_not_fit() {
        let selected = GreedySelector.select(
            vec![item("a", 60.0), item("b", 50.0), item("c", 40.0)],
            100.0,
        );
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_greedy_ignores_free_items() {
        let selected = GreedySelector.select(vec![item("free", 0.0), item("a", 10.0)], 100.0);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_exact_fit_accepted() {
        let selected = GreedySelector.select(vec![item("a", 100.0)], 100.0);
        assert_eq!(selected.len(), 1);
    }
}
