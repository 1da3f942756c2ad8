use quality_core::{DataProvider, EngineError, EngineResult, PortfolioConfig, RoiAssumptions};
use tracing::debug;

use crate::catalog::default_interventions;
use crate::models::*;
use crate::selector::{BudgetSelector, GreedySelector};

/// Measures carrying the higher star weight when no weight is known
const HIGH_WEIGHT_MEASURES: [&str; 5] = ["HBA1C", "BP", "CDC", "CBP", "EED"];
/// Star weight that maps a rate gain one-to-one onto star improvement
const REFERENCE_STAR_WEIGHT: f64 = 0.10;
const STAR_IMPROVEMENT_SCALE: f64 = 0.5;

pub struct PortfolioOptimizer<P> {
    provider: P,
    config: PortfolioConfig,
    revenue_per_closure: f64,
    bonus_per_star: f64,
    selector: Box<dyn BudgetSelector>,
}

impl<P: DataProvider> PortfolioOptimizer<P> {
    pub fn new(provider: P, config: PortfolioConfig, roi: &RoiAssumptions) -> EngineResult<Self> {
        config.validate()?;
        roi.validate()?;
        Ok(Self {
            provider,
            config,
            revenue_per_closure: roi.revenue_per_closure,
            bonus_per_star: roi.bonus_per_star,
            selector: Box::new(GreedySelector),
        })
    }

    pub fn with_defaults(provider: P) -> EngineResult<Self> {
        Self::new(provider, PortfolioConfig::default(), &RoiAssumptions::default())
    }

    /// Replace the greedy selection with another [`BudgetSelector`]
    pub fn with_selector(mut self, selector: impl BudgetSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Candidate weight, then the measure definition, then the fallback table
    pub fn resolve_star_weight(&self, candidate: &InterventionCandidate) -> EngineResult<f64> {
        if let Some(weight) = candidate.star_weight.filter(|w| *w > 0.0) {
            return Ok(weight);
        }
        if let Some(measure) = self.provider.get_measure_definition(&candidate.target_measure)? {
            return Ok(measure.star_weight);
        }
        let code = candidate.target_measure.to_ascii_uppercase();
        Ok(if HIGH_WEIGHT_MEASURES.contains(&code.as_str()) {
            self.config.high_star_weight
        } else {
            self.config.default_star_weight
        })
    }

    /// Closures, star bonus, ROI and confidence for one candidate.
    ///
    /// Candidates without cost or members score zero across the board.
    pub fn calculate_intervention_roi(
        &self,
        candidate: &InterventionCandidate,
    ) -> EngineResult<InterventionRoi> {
        let gap = candidate.expected_gap_closure;
        if !(0.0..=100.0).contains(&gap) {
            return Err(EngineError::Validation(format!(
                "{}: expected_gap_closure must be within 0-100, got {}",
                candidate.id, gap
            )));
        }
        let star_weight = self.resolve_star_weight(candidate)?;

        if candidate.cost <= 0.0 || candidate.member_count == 0 {
            return Ok(InterventionRoi {
                id: candidate.id.clone(),
                intervention_type: candidate.intervention_type.clone(),
                target_measure: candidate.target_measure.clone(),
                expected_gap_closure: gap,
                cost: candidate.cost.max(0.0),
                member_count: candidate.member_count,
                star_weight,
                estimated_closures: 0,
                cost_per_closure: 0.0,
                revenue_from_closures: 0.0,
                star_rating_bonus: 0.0,
                financial_impact: 0.0,
                net_roi: 0.0,
                roi_ratio: 0.0,
                confidence_score: 0.0,
            });
        }

        let members = candidate.member_count as f64;
        let estimated_closures = ((members * gap / 100.0).floor() as u64).max(1);
        let cost_per_closure = candidate.cost / estimated_closures as f64;
        let revenue_from_closures = estimated_closures as f64 * self.revenue_per_closure;

        let star_improvement =
            (gap / 100.0) * (star_weight / REFERENCE_STAR_WEIGHT) * STAR_IMPROVEMENT_SCALE;
        let star_rating_bonus = members * self.bonus_per_star * star_improvement;
        let financial_impact = revenue_from_closures + star_rating_bonus;

        let c = &self.config;
        let mut confidence = c.base_confidence;
        if cost_per_closure > c.high_cost_per_closure {
            confidence -= c.high_cost_penalty;
        }
        if gap > c.aggressive_gap_closure {
            confidence -= c.aggressive_gap_penalty;
        }

        Ok(InterventionRoi {
            id: candidate.id.clone(),
            intervention_type: candidate.intervention_type.clone(),
            target_measure: candidate.target_measure.clone(),
            expected_gap_closure: gap,
            cost: candidate.cost,
            member_count: candidate.member_count,
            star_weight,
            estimated_closures,
            cost_per_closure,
            revenue_from_closures,
            star_rating_bonus,
            financial_impact,
            net_roi: financial_impact - candidate.cost,
            roi_ratio: financial_impact / candidate.cost,
            confidence_score: confidence.clamp(c.min_confidence, c.max_confidence),
        })
    }

    /// Fill `budget` under the max-star, max-ROI and balanced strategies.
    ///
    /// An empty candidate list means the stock catalog.
    pub fn optimize_intervention_portfolio(
        &self,
        budget: f64,
        candidates: &[InterventionCandidate],
    ) -> EngineResult<PortfolioPlan> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(EngineError::Validation(format!(
                "budget must be a non-negative amount, got {}",
                budget
            )));
        }

        let catalog;
        let candidates = if candidates.is_empty() {
            catalog = default_interventions();
            &catalog[..]
        } else {
            candidates
        };

        let scored = candidates
            .iter()
            .map(|c| self.calculate_intervention_roi(c))
            .collect::<EngineResult<Vec<_>>>()?;

        let by_star = ranked(&scored, |a, b| b.star_rating_bonus.total_cmp(&a.star_rating_bonus));
        let by_roi = ranked(&scored, |a, b| b.roi_ratio.total_cmp(&a.roi_ratio));

        let pool_size = self.config.balanced_pool_size;
        let mut pool: Vec<InterventionRoi> = Vec::new();
        for item in by_roi.iter().take(pool_size).chain(by_star.iter().take(pool_size)) {
            if !pool.iter().any(|p| p.id == item.id) {
                pool.push(item.clone());
            }
        }
        pool.sort_by(|a, b| {
            b.roi_ratio
                .total_cmp(&a.roi_ratio)
                .then_with(|| b.star_rating_bonus.total_cmp(&a.star_rating_bonus))
        });

        let plan = PortfolioPlan {
            budget,
            max_star: PortfolioAllocation::from_selection(
                PortfolioStrategy::MaxStar,
                self.selector.select(by_star, budget),
            ),
            max_roi: PortfolioAllocation::from_selection(
                PortfolioStrategy::MaxRoi,
                self.selector.select(by_roi, budget),
            ),
            balanced: PortfolioAllocation::from_selection(
                PortfolioStrategy::Balanced,
                self.selector.select(pool, budget),
            ),
        };

        debug!(
            "portfolio for {:.0}: star {} items, roi {} items, balanced {} items",
            budget, plan.max_star.count, plan.max_roi.count, plan.balanced.count
        );
        Ok(plan)
    }
}

/// Stable sort of a copy of `items`
fn ranked<F>(items: &[InterventionRoi], cmp: F) -> Vec<InterventionRoi>
where
    F: FnMut(&InterventionRoi, &InterventionRoi) -> std::cmp::Ordering,
{
    let mut sorted = items.to_vec();
    sorted.sort_by(cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quality_core::{InMemoryProvider, MeasureDefinition};

    fn optimizer() -> PortfolioOptimizer<InMemoryProvider> {
        PortfolioOptimizer::with_defaults(InMemoryProvider::new()).unwrap()
    }

    #[test]
    fn test_intervention_roi_scoring() {
        let candidate = InterventionCandidate::new(
            "provider_diabetes",
            "Provider Education",
            "CDC",
            12.0,
            25_000.0,
            3000,
        );
        let roi = optimizer().calculate_intervention_roi(&candidate).unwrap();

        assert_eq!(roi.estimated_closures, 360);
        assert_relative_eq!(roi.star_weight, 0.15);
        assert_relative_eq!(roi.revenue_from_closures, 36_000.0);
        assert_relative_eq!(roi.star_rating_bonus, 13_500.0, epsilon = 1e-6);
        assert_relative_eq!(roi.roi_ratio, 1.98, epsilon = 1e-9);
        assert_relative_eq!(roi.confidence_score, 85.0);
    }

    #[test]
    fn test_closures_floor_at_one() {
        let candidate = InterventionCandidate::new("tiny", "Outreach", "COL", 1.0, 5_000.0, 10);
        let roi = optimizer().calculate_intervention_roi(&candidate).unwrap();
        assert_eq!(roi.estimated_closures, 1);
        // 5000 per closure is expensive
        assert_relative_eq!(roi.confidence_score, 75.0);
    }

    #[test]
    fn test_confidence_penalties_and_clamp() {
        let candidate = InterventionCandidate::new("big", "EHR", "COL", 20.0, 100_000.0, 100);
        let roi = optimizer().calculate_intervention_roi(&candidate).unwrap();
        assert_relative_eq!(roi.confidence_score, 70.0);
        assert!(roi.confidence_score >= 50.0 && roi.confidence_score <= 95.0);
    }

    #[test]
    fn test_zero_cost_candidate_scores_zero() {
        let candidate = InterventionCandidate::new("free", "Outreach", "BCS", 5.0, 0.0, 100);
        let roi = optimizer().calculate_intervention_roi(&candidate).unwrap();
        assert_eq!(roi.roi_ratio, 0.0);
        assert_eq!(roi.estimated_closures, 0);
        assert!(!roi.is_fundable());
    }

    #[test]
    fn test_weight_from_measure_definition() {
        let provider = InMemoryProvider::new()
            .with_measure(
                MeasureDefinition::new("COL", "Colorectal Screening", 0.3, 70.0).unwrap(),
            );
        let opt = PortfolioOptimizer::with_defaults(provider).unwrap();
        let candidate = InterventionCandidate::new("col", "Outreach", "COL", 5.0, 1_000.0, 100);
        assert_relative_eq!(opt.resolve_star_weight(&candidate).unwrap(), 0.3);

        let explicit = candidate.clone().with_star_weight(0.2);
        assert_relative_eq!(opt.resolve_star_weight(&explicit).unwrap(), 0.2);

        let unknown = InterventionCandidate::new("mam", "Outreach", "MAM", 5.0, 1_000.0, 100);
        assert_relative_eq!(opt.resolve_star_weight(&unknown).unwrap(), 0.10);
    }

    #[test]
    fn test_default_catalog_plan() {
        let plan = optimizer().optimize_intervention_portfolio(50_000.0, &[]).unwrap();

        assert_eq!(plan.max_roi.selected_ids(), vec!["lab_reminder", "bp_home"]);
        assert_relative_eq!(plan.max_roi.total_cost, 40_000.0);

        assert_eq!(plan.max_star.selected_ids(), vec!["ehr_cbp"]);
        assert_relative_eq!(plan.max_star.total_cost, 50_000.0);

        assert_eq!(plan.balanced.selected_ids(), vec!["lab_reminder", "bp_home"]);
        assert_eq!(plan.balanced.count, 2);
        assert_relative_eq!(
            plan.balanced.net_benefit,
            plan.balanced.total_financial_impact - plan.balanced.total_cost
        );
    }

    #[test]
    fn test_every_strategy_within_budget() {
        let opt = optimizer();
        for budget in [0.0, 10_000.0, 37_500.0, 80_000.0, 150_000.0, 1_000_000.0] {
            let plan = opt.optimize_intervention_portfolio(budget, &[]).unwrap();
            for strategy in [
                PortfolioStrategy::MaxStar,
                PortfolioStrategy::MaxRoi,
                PortfolioStrategy::Balanced,
            ] {
                let allocation = plan.allocation(strategy);
                let spent: f64 = allocation.selected_interventions.iter().map(|s| s.cost).sum();
                assert!(spent <= budget, "{:?} spent {} of {}", strategy, spent, budget);
                assert_eq!(allocation.count, allocation.selected_interventions.len());
            }
        }
    }

    #[test]
    fn test_negative_budget_rejected() {
        assert!(matches!(
            optimizer().optimize_intervention_portfolio(-1.0, &[]),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_custom_selector_is_used() {
        struct NothingSelector;
        impl BudgetSelector for NothingSelector {
            fn select(&self, _ranked: Vec<InterventionRoi>, _budget: f64) -> Vec<InterventionRoi> {
                Vec::new()
            }
        }

        let plan = optimizer()
            .with_selector(NothingSelector)
            .optimize_intervention_portfolio(100_000.0, &[])
            .unwrap();
        assert_eq!(plan.max_roi.count, 0);
        assert_eq!(plan.balanced.total_cost, 0.0);
    }
}
