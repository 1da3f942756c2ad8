use quality_core::{
    stats, AggregateTotals, DataProvider, EngineError, EngineResult, Period, ScenarioConfig,
};
use roi_calculator::RoiCalculator;
use tracing::{debug, info};

use crate::models::*;
use crate::pareto::pareto_front;

/// Projects outcomes for budget/staffing inputs against a historical baseline
#[derive(Debug, Clone)]
pub struct ScenarioModeler {
    config: ScenarioConfig,
    revenue_per_closure: f64,
    baseline: Baseline,
}

impl ScenarioModeler {
    /// Load the baseline from every measure's aggregates in `period`
    pub fn new<P: DataProvider>(
        provider: &P,
        period: &Period,
        config: ScenarioConfig,
        revenue_per_closure: f64,
    ) -> EngineResult<Self> {
        config.validate()?;
        let rows = provider.get_aggregates(None, period)?;
        let baseline = Baseline::from_totals(&AggregateTotals::from_rows(&rows), &config);
        if !baseline.from_data {
            debug!("no baseline data in {}, using default cost and rate", period.key());
        }
        Self::with_baseline(baseline, config, revenue_per_closure)
    }

    /// Share the ROI calculator's provider and revenue assumption
    pub fn from_roi_calculator<P: DataProvider>(
        calculator: &RoiCalculator<P>,
        period: &Period,
        config: ScenarioConfig,
    ) -> EngineResult<Self> {
        Self::new(
            calculator.provider(),
            period,
            config,
            calculator.assumptions().revenue_per_closure,
        )
    }

    pub fn with_baseline(
        baseline: Baseline,
        config: ScenarioConfig,
        revenue_per_closure: f64,
    ) -> EngineResult<Self> {
        config.validate()?;
        if !(revenue_per_closure.is_finite() && revenue_per_closure >= 0.0) {
            return Err(EngineError::Configuration(format!(
                "revenue_per_closure must be non-negative, got {}",
                revenue_per_closure
            )));
        }
        let avg_cost = baseline.avg_cost_per_intervention;
        if avg_cost.is_nan() || avg_cost <= 0.0 {
            return Err(EngineError::Configuration(
                "baseline cost per intervention must be positive".to_string(),
            ));
        }
        Ok(Self {
            config,
            revenue_per_closure,
            baseline,
        })
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Project one scenario. Budget and FTE are clamped to the configured bounds.
    pub fn calculate_scenario(
        &self,
        budget: f64,
        fte_count: u32,
        strategy: Strategy,
    ) -> ScenarioResult {
        let c = &self.config;
        let budget = if budget.is_finite() {
            budget.clamp(c.min_budget, c.max_budget)
        } else {
            c.min_budget
        };
        let fte_count = fte_count.clamp(c.min_fte, c.max_fte);
        let avg_cost = self.baseline.avg_cost_per_intervention;

        let max_capacity = fte_count as u64 * c.per_fte_capacity as u64;
        let budget_constrained = (budget / avg_cost).floor() as u64;
        let predicted_interventions = budget_constrained.min(max_capacity);
        let binding_constraint = if budget_constrained < max_capacity {
            BindingConstraint::Budget
        } else {
            BindingConstraint::Capacity
        };

        let success_rate = (self.baseline.success_rate * strategy.multiplier())
            .clamp(c.min_success_rate, c.max_success_rate);
        let predicted_closures =
            (predicted_interventions as f64 * success_rate / 100.0).floor() as u64;
        let predicted_revenue = predicted_closures as f64 * self.revenue_per_closure;
        let actual_cost = budget.min(predicted_interventions as f64 * avg_cost);

        ScenarioResult {
            budget,
            fte_count,
            strategy,
            max_capacity,
            budget_constrained_interventions: budget_constrained,
            predicted_interventions,
            predicted_closures,
            predicted_success_rate: success_rate,
            predicted_revenue,
            actual_cost,
            roi_ratio: stats::safe_ratio(predicted_revenue, actual_cost),
            net_benefit: predicted_revenue - actual_cost,
            budget_utilization: stats::safe_ratio(actual_cost, budget) * 100.0,
            capacity_utilization: stats::safe_ratio(
                predicted_interventions as f64,
                max_capacity as f64,
            ) * 100.0,
            binding_constraint,
            avg_cost_per_intervention: avg_cost,
            revenue_per_closure: self.revenue_per_closure,
        }
    }

    /// Sample `num_points` balanced scenarios and keep the non-dominated ones.
    ///
    /// The first half sweeps budget with FTE fixed at the range midpoint; the
    /// second half sweeps FTE with budget fixed at its midpoint. The frontier
    /// is sorted by ROI ratio, highest first.
    pub fn generate_pareto_frontier(
        &self,
        budget_range: (f64, f64),
        fte_range: (u32, u32),
        num_points: usize,
    ) -> EngineResult<Vec<ScenarioResult>> {
        let (budget_lo, budget_hi) = budget_range;
        let (fte_lo, fte_hi) = fte_range;
        if num_points < 2 {
            return Err(EngineError::Validation(format!(
                "pareto frontier needs at least 2 points, got {}",
                num_points
            )));
        }
        if !(budget_lo.is_finite() && budget_hi.is_finite()) || budget_hi < budget_lo {
            return Err(EngineError::Validation(format!(
                "invalid budget range {}..{}",
                budget_lo, budget_hi
            )));
        }
        if fte_hi < fte_lo {
            return Err(EngineError::Validation(format!(
                "invalid fte range {}..{}",
                fte_lo, fte_hi
            )));
        }

        let half = num_points / 2;
        let budget_step = (budget_hi - budget_lo) / half as f64;
        let fte_step = (fte_hi - fte_lo) as f64 / half as f64;
        let fte_mid = (fte_lo + fte_hi) / 2;
        let budget_mid = (budget_lo + budget_hi) / 2.0;

        let points: Vec<ScenarioResult> = (0..num_points)
            .map(|i| {
                if i < half {
                    let budget = budget_lo + i as f64 * budget_step;
                    self.calculate_scenario(budget, fte_mid, Strategy::Balanced)
                } else {
                    let fte = fte_lo + ((i - half) as f64 * fte_step).floor() as u32;
                    self.calculate_scenario(budget_mid, fte, Strategy::Balanced)
                }
            })
            .collect();

        let mut frontier = pareto_front(points, |s| (s.roi_ratio, s.predicted_closures));
        frontier.sort_by(|a, b| b.roi_ratio.total_cmp(&a.roi_ratio));
        debug!("pareto frontier: {} of {} points", frontier.len(), num_points);
        Ok(frontier)
    }

    /// Evaluate several inputs side by side
    pub fn compare_scenarios(&self, inputs: &[ScenarioInput]) -> Vec<NamedScenario> {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| NamedScenario {
                name: input
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Scenario {}", i + 1)),
                result: self.calculate_scenario(input.budget, input.fte_count, input.strategy),
            })
            .collect()
    }

    /// Exhaustive grid search over budget x FTE for the best balanced scenario.
    ///
    /// Budgets step by the configured grid step from the minimum up to and
    /// including the budget cap; FTE counts cover every integer up to the FTE
    /// cap. Ties keep the first scenario scanned.
    pub fn get_optimal_scenario(
        &self,
        constraints: SearchConstraints,
        objective: Objective,
    ) -> ScenarioResult {
        let c = &self.config;
        let budget_cap = constraints
            .max_budget
            .filter(|b| b.is_finite())
            .unwrap_or(c.max_budget)
            .clamp(c.min_budget, c.max_budget);
        let fte_cap = constraints.max_fte.unwrap_or(c.max_fte).clamp(c.min_fte, c.max_fte);

        let steps = ((budget_cap - c.min_budget) / c.grid_budget_step + 1e-9).floor() as u64;
        let mut best: Option<(f64, ScenarioResult)> = None;

        for k in 0..=steps {
            let budget = c.min_budget + k as f64 * c.grid_budget_step;
            for fte in c.min_fte..=fte_cap {
                let scenario = self.calculate_scenario(budget, fte, Strategy::Balanced);
                let value = objective.score(&scenario);
                let better = match &best {
                    Some((best_value, _)) => value > *best_value,
                    None => true,
                };
                if better {
                    best = Some((value, scenario));
                }
            }
        }

        match best {
            Some((value, scenario)) => {
                info!(
                    "optimal scenario: budget {:.0}, {} FTE ({:?} = {:.2})",
                    scenario.budget, scenario.fte_count, objective, value
                );
                scenario
            }
            // The grid always holds at least (min_budget, min_fte)
            None => self.calculate_scenario(c.min_budget, c.min_fte, Strategy::Balanced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use quality_core::{InMemoryProvider, InterventionAggregate};

    fn modeler() -> ScenarioModeler {
        ScenarioModeler::with_baseline(
            Baseline::defaults(&ScenarioConfig::default()),
            ScenarioConfig::default(),
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn test_capacity_bound_example() {
        let s = modeler().calculate_scenario(100_000.0, 1, Strategy::Balanced);
        assert_eq!(s.budget_constrained_interventions, 2000);
        assert_eq!(s.max_capacity, 200);
        assert_eq!(s.predicted_interventions, 200);
        assert_eq!(s.binding_constraint, BindingConstraint::Capacity);
        assert_relative_eq!(s.actual_cost, 10_000.0);
        assert_eq!(s.predicted_closures, 150);
        assert_relative_eq!(s.predicted_revenue, 15_000.0);
        assert_relative_eq!(s.roi_ratio, 1.5);
        assert_relative_eq!(s.budget_utilization, 10.0);
        assert_relative_eq!(s.capacity_utilization, 100.0);
    }

    #[test]
    fn test_budget_bound() {
        let s = modeler().calculate_scenario(50_000.0, 10, Strategy::Balanced);
        assert_eq!(s.budget_constrained_interventions, 1000);
        assert_eq!(s.predicted_interventions, 1000);
        assert_eq!(s.binding_constraint, BindingConstraint::Budget);
        assert_relative_eq!(s.actual_cost, 50_000.0);
        assert_relative_eq!(s.capacity_utilization, 50.0);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let s = modeler().calculate_scenario(1_000.0, 0, Strategy::Balanced);
        assert_eq!(s.budget, 50_000.0);
        assert_eq!(s.fte_count, 1);

        let s = modeler().calculate_scenario(9_000_000.0, 99, Strategy::Balanced);
        assert_eq!(s.budget, 500_000.0);
        assert_eq!(s.fte_count, 10);
    }

    #[test]
    fn test_strategy_rate_clamped() {
        let high = ScenarioModeler::with_baseline(
            Baseline {
                avg_cost_per_intervention: 50.0,
                success_rate: 90.0,
                from_data: true,
            },
            ScenarioConfig::default(),
            100.0,
        )
        .unwrap();
        let s = high.calculate_scenario(100_000.0, 5, Strategy::HighRoi);
        assert_relative_eq!(s.predicted_success_rate, 95.0);

        let s = modeler().calculate_scenario(100_000.0, 5, Strategy::HighVolume);
        assert_relative_eq!(s.predicted_success_rate, 71.25);
    }

    #[test]
    fn test_scenario_invariants_hold_across_grid() {
        let m = modeler();
        for budget in [50_000.0, 75_000.0, 212_345.0, 500_000.0] {
            for fte in 1..=10 {
                for strategy in [Strategy::Balanced, Strategy::HighRoi, Strategy::HighVolume] {
                    let s = m.calculate_scenario(budget, fte, strategy);
                    assert!(s.actual_cost <= s.budget);
                    assert!(s.predicted_interventions <= s.max_capacity);
                    assert!(s.predicted_closures <= s.predicted_interventions);
                    assert!(s.budget_utilization <= 100.0);
                }
            }
        }
    }

    #[test]
    fn test_baseline_loaded_from_provider() {
        let day = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let provider = InMemoryProvider::new().with_aggregate(
            InterventionAggregate::new("CDC", day, 100, 80, 12_000.0, 8_000.0).unwrap(),
        );
        let period = Period::last_days(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), 90);
        let m = ScenarioModeler::new(&provider, &period, ScenarioConfig::default(), 100.0).unwrap();
        assert_relative_eq!(m.baseline().avg_cost_per_intervention, 80.0);
        assert_relative_eq!(m.baseline().success_rate, 80.0);
    }

    #[test]
    fn test_pareto_frontier_non_dominated_and_sorted() {
        let frontier = modeler()
            .generate_pareto_frontier((50_000.0, 500_000.0), (1, 10), 20)
            .unwrap();
        assert!(!frontier.is_empty());

        for p in &frontier {
            for q in &frontier {
                let dominates = q.roi_ratio >= p.roi_ratio
                    && q.predicted_closures >= p.predicted_closures
                    && (q.roi_ratio > p.roi_ratio || q.predicted_closures > p.predicted_closures);
                assert!(!dominates);
            }
        }
        for pair in frontier.windows(2) {
            assert!(pair[0].roi_ratio >= pair[1].roi_ratio);
        }
    }

    #[test]
    fn test_pareto_rejects_bad_input() {
        let m = modeler();
        assert!(m.generate_pareto_frontier((50_000.0, 500_000.0), (1, 10), 1).is_err());
        assert!(m.generate_pareto_frontier((500_000.0, 50_000.0), (1, 10), 10).is_err());
        assert!(m.generate_pareto_frontier((50_000.0, 500_000.0), (5, 2), 10).is_err());
    }

    #[test]
    fn test_optimal_scenario_objectives() {
        let m = modeler();

        // closures peak once budget covers full 10-FTE capacity: 2000 x 50 = 100k
        let most = m.get_optimal_scenario(SearchConstraints::default(), Objective::MaxClosures);
        assert_eq!(most.predicted_closures, 1500);
        assert_eq!(most.fte_count, 10);
        assert_relative_eq!(most.budget, 100_000.0);

        // every scenario has the same ratio, so the first scanned wins
        let roi = m.get_optimal_scenario(SearchConstraints::default(), Objective::MaxRoi);
        assert_relative_eq!(roi.budget, 50_000.0);
        assert_eq!(roi.fte_count, 1);
    }

    #[test]
    fn test_optimal_scenario_respects_caps() {
        let s = modeler().get_optimal_scenario(
            SearchConstraints {
                max_budget: Some(75_000.0),
                max_fte: Some(3),
            },
            Objective::MaxNetBenefit,
        );
        assert!(s.budget <= 75_000.0);
        assert!(s.fte_count <= 3);
        assert_eq!(s.predicted_interventions, 600);
    }

    #[test]
    fn test_compare_scenarios_default_names() {
        let results = modeler().compare_scenarios(&[
            ScenarioInput::new(100_000.0, 2, Strategy::Balanced).named("Status quo"),
            ScenarioInput::new(200_000.0, 4, Strategy::HighRoi),
        ]);
        assert_eq!(results[0].name, "Status quo");
        assert_eq!(results[1].name, "Scenario 2");
        assert_eq!(results[1].result.strategy, Strategy::HighRoi);
    }
}
