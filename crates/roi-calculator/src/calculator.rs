use chrono::NaiveDate;
use quality_core::{
    stats, AggregateTotals, DataProvider, EngineError, EngineResult, Period, PortfolioSummary,
    RoiAssumptions,
};
use tracing::debug;

use crate::models::*;
use crate::report;

/// Share of the investment credited as admin efficiency by the comprehensive method
const ADMIN_SAVINGS_RATE: f64 = 0.15;
/// Quality bonus proxy used by the comprehensive method, in stars
const COMPREHENSIVE_STAR_PROXY: f64 = 0.5;
/// Star credit per star-equivalent in the CMS-focused method
const CMS_STAR_STEP: f64 = 0.2;
const MAX_STARS: f64 = 5.0;

/// Converts provider aggregates into cost/benefit/ROI figures
pub struct RoiCalculator<P> {
    provider: P,
    assumptions: RoiAssumptions,
    z: f64,
}

impl<P: DataProvider> RoiCalculator<P> {
    pub fn new(provider: P, assumptions: RoiAssumptions) -> EngineResult<Self> {
        assumptions.validate()?;
        let z = stats::z_for_confidence(assumptions.confidence_level)?;
        Ok(Self {
            provider,
            assumptions,
            z,
        })
    }

    pub fn with_defaults(provider: P) -> EngineResult<Self> {
        Self::new(provider, RoiAssumptions::default())
    }

    pub fn assumptions(&self) -> &RoiAssumptions {
        &self.assumptions
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// ROI for one measure over `period`.
    ///
    /// A measure with no rows yields [`RoiResult::empty`]; only provider
    /// failures are returned as errors.
    pub fn calculate_measure_roi(
        &self,
        measure_id: &str,
        period: &Period,
    ) -> EngineResult<RoiResult> {
        match self.try_calculate_measure_roi(measure_id, period) {
            Err(EngineError::DataUnavailable(reason)) => {
                debug!("{}, returning zeroed ROI", reason);
                Ok(RoiResult::empty(
                    measure_id,
                    *period,
                    self.assumptions.confidence_level,
                ))
            }
            other => other,
        }
    }

    /// Like [`calculate_measure_roi`](Self::calculate_measure_roi) but reports
    /// missing data as [`EngineError::DataUnavailable`]
    pub fn try_calculate_measure_roi(
        &self,
        measure_id: &str,
        period: &Period,
    ) -> EngineResult<RoiResult> {
        let rows = self.provider.get_aggregates(Some(measure_id), period)?;
        if rows.is_empty() {
            return Err(EngineError::DataUnavailable(format!(
                "no intervention data for {} in {}",
                measure_id,
                period.key()
            )));
        }

        let measure_name = self
            .provider
            .get_measure_definition(measure_id)?
            .map(|m| m.name)
            .unwrap_or_else(|| measure_id.to_string());

        let totals = AggregateTotals::from_rows(&rows);
        let result = self.roi_from_totals(measure_id, measure_name, *period, &totals);
        debug!(
            "{}: {} interventions, {:.1}% success, net ROI {:.2}",
            measure_id, result.total_interventions, result.success_rate, result.net_roi
        );
        Ok(result)
    }

    /// ROI for each measure, in the order given
    pub fn calculate_all_measures<I, S>(
        &self,
        measure_ids: I,
        period: &Period,
    ) -> EngineResult<Vec<RoiResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        measure_ids
            .into_iter()
            .map(|id| self.calculate_measure_roi(id.as_ref(), period))
            .collect()
    }

    /// Portfolio-wide KPIs across every measure in `period`
    pub fn portfolio_summary(&self, period: &Period) -> EngineResult<PortfolioSummary> {
        let rows = self.provider.get_aggregates(None, period)?;
        Ok(PortfolioSummary::from_rows(
            &rows,
            self.assumptions.revenue_per_closure,
        ))
    }

    /// Build a result from pre-summed totals
    pub fn roi_from_totals(
        &self,
        measure_id: &str,
        measure_name: String,
        period: Period,
        totals: &AggregateTotals,
    ) -> RoiResult {
        let costs = self.modeled_costs(totals.total_interventions, totals.completed_cost);
        self.assemble(
            measure_id.to_string(),
            measure_name,
            period,
            totals.total_interventions,
            totals.successful_closures,
            totals.success_rate(),
            costs,
        )
    }

    /// Staff, outreach and lab costs for `interventions`, plus the actual completed cost
    pub fn modeled_costs(&self, interventions: u64, completed_cost: f64) -> CostBreakdown {
        let a = &self.assumptions;
        let n = interventions as f64;
        let staff = n * a.staff_hours_per_intervention * a.staff_hourly_rate;
        let outreach = n * a.outreach_cost_per_member;
        let lab_tests = (n * a.lab_test_share).floor();
        let lab = lab_tests * a.lab_cost_per_test;
        CostBreakdown::new(staff, outreach, lab, completed_cost)
    }

    /// Score an investment under all three ROI methodologies
    pub fn calculate_roi_three_methods(
        &self,
        investment: f64,
        expected_closures: u64,
        membership: u64,
    ) -> EngineResult<ThreeMethodRoi> {
        if !investment.is_finite() || investment < 0.0 {
            return Err(EngineError::Validation(format!(
                "investment must be a non-negative amount, got {}",
                investment
            )));
        }

        let a = &self.assumptions;
        let inv = investment.max(1.0);
        let direct = expected_closures as f64 * a.revenue_per_closure;
        let members = membership as f64;

        let admin_savings = inv * ADMIN_SAVINGS_RATE;
        let star_proxy = members * a.bonus_per_star * COMPREHENSIVE_STAR_PROXY;

        let closure_base = (members * 0.01).max(1.0);
        let stars_equivalent =
            (expected_closures as f64 / closure_base * 10.0).clamp(0.0, MAX_STARS);
        let cms_bonus = members * a.bonus_per_star * stars_equivalent * CMS_STAR_STEP;

        let outcome = |method: RoiMethod, total_benefit: f64| MethodOutcome {
            method,
            total_benefit,
            net_roi: total_benefit - inv,
            roi_ratio: total_benefit / inv,
        };

        Ok(ThreeMethodRoi {
            investment,
            expected_closures,
            conservative: outcome(RoiMethod::Conservative, direct),
            comprehensive: outcome(
                RoiMethod::Comprehensive,
                direct + admin_savings + star_proxy,
            ),
            cms_focused: outcome(RoiMethod::CmsFocused, direct + cms_bonus),
        })
    }

    /// Re-run `base` under each what-if scenario.
    ///
    /// A success-rate override recomputes closures, revenue, star tier, quality
    /// bonus and the confidence bounds; a cost multiplier scales every cost
    /// component. Net ROI, ROI ratio and payback follow from both.
    pub fn sensitivity_analysis(
        &self,
        base: &RoiResult,
        scenarios: &[SensitivityScenario],
    ) -> EngineResult<Vec<SensitivityOutcome>> {
        scenarios
            .iter()
            .map(|scenario| {
                let multiplier = match scenario.cost_multiplier {
                    Some(m) if !m.is_finite() || m < 0.0 => {
                        return Err(EngineError::Validation(format!(
                            "{}: cost_multiplier must be non-negative, got {}",
                            scenario.name, m
                        )))
                    }
                    Some(m) => m,
                    None => 1.0,
                };

                let (closures, rate) = match scenario.success_rate {
                    Some(r) if !r.is_finite() => {
                        return Err(EngineError::Validation(format!(
                            "{}: success_rate must be a number",
                            scenario.name
                        )))
                    }
                    Some(r) => {
                        let rate = r.clamp(0.0, 100.0);
                        let closures =
                            (base.total_interventions as f64 * rate / 100.0).floor() as u64;
                        (closures.min(base.total_interventions), rate)
                    }
                    None => (base.successful_closures, base.success_rate),
                };

                let result = self.assemble(
                    base.measure_id.clone(),
                    base.measure_name.clone(),
                    base.period,
                    base.total_interventions,
                    closures,
                    rate,
                    base.cost_breakdown.scaled(multiplier),
                );

                Ok(SensitivityOutcome {
                    scenario_name: scenario.name.clone(),
                    change_from_base: result.net_roi - base.net_roi,
                    result,
                })
            })
            .collect()
    }

    /// Plain-text financial justification report
    pub fn generate_cfo_report(
        &self,
        results: &[RoiResult],
        summary: Option<&PortfolioSummary>,
        generated_on: NaiveDate,
    ) -> EngineResult<String> {
        report::render_cfo_report(results, summary, &self.assumptions, generated_on)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        measure_id: String,
        measure_name: String,
        period: Period,
        total_interventions: u64,
        successful_closures: u64,
        success_rate: f64,
        costs: CostBreakdown,
    ) -> RoiResult {
        let a = &self.assumptions;
        let n = total_interventions as f64;

        let total_revenue = successful_closures as f64 * a.revenue_per_closure;
        let (star_rating, quality_bonus) = if total_interventions == 0 {
            (NO_VOLUME_STAR_RATING, 0.0)
        } else {
            let tier = star_tier(success_rate);
            (
                tier,
                tier as f64 * a.members_per_measure as f64 * a.bonus_per_star,
            )
        };

        let confidence_interval = stats::wilson_interval(
            successful_closures,
            total_interventions,
            self.z,
            a.confidence_level,
        )
        .bracketing(success_rate);

        let revenue_ci_lower = (n * confidence_interval.lower / 100.0 * a.revenue_per_closure)
            .trunc()
            .min(total_revenue);
        let revenue_ci_upper = (n * confidence_interval.upper / 100.0 * a.revenue_per_closure)
            .trunc()
            .max(total_revenue);

        let total_costs = costs.total_cost;
        let total_benefit = total_revenue + quality_bonus;
        let payback_period_months = if total_benefit > 0.0 {
            Some(total_costs / (total_benefit / 3.0))
        } else {
            None
        };

        RoiResult {
            measure_id,
            measure_name,
            period,
            total_interventions,
            successful_closures,
            success_rate,
            confidence_interval,
            total_revenue,
            revenue_ci_lower,
            revenue_ci_upper,
            quality_bonus,
            star_rating,
            cost_breakdown: costs,
            total_costs,
            total_benefit,
            net_roi: total_benefit - total_costs,
            net_roi_ci_lower: revenue_ci_lower + quality_bonus - total_costs,
            net_roi_ci_upper: revenue_ci_upper + quality_bonus - total_costs,
            roi_ratio: stats::safe_ratio(total_benefit, total_costs),
            payback_period_months,
        }
    }
}

/// Which ROI methodology to present, keyed by audience and reporting context.
///
/// `org_type` is accepted for callers that track it; payers and providers
/// currently get the same recommendation.
pub fn recommend_roi_method(
    _org_type: OrgType,
    audience: Audience,
    reporting: ReportingContext,
) -> MethodRecommendation {
    let (recommended, explanation, alternative) =
        if reporting == ReportingContext::Cms || audience == Audience::Cmo {
            (
                RoiMethod::CmsFocused,
                "Use CMS-Focused when reporting to CMS or presenting to quality/CMO stakeholders. Emphasizes Star Rating bonus impact.",
                (audience == Audience::Cfo).then_some(RoiMethod::Comprehensive),
            )
        } else if audience == Audience::Cfo || reporting == ReportingContext::Board {
            (
                RoiMethod::Comprehensive,
                "Use Comprehensive for CFO and board. Shows full value including admin savings and quality bonus.",
                Some(RoiMethod::Conservative),
            )
        } else {
            (
                RoiMethod::Conservative,
                "Use Conservative for internal planning and when a defensible, single-number ROI is needed.",
                Some(RoiMethod::Comprehensive),
            )
        };

    MethodRecommendation {
        recommended,
        label: recommended.label().to_string(),
        explanation: explanation.to_string(),
        alternative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quality_core::{InMemoryProvider, InterventionAggregate, MeasureDefinition};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarter() -> Period {
        Period::new(d(2024, 10, 1), d(2024, 12, 31)).unwrap()
    }

    fn calculator() -> RoiCalculator<InMemoryProvider> {
        let provider = InMemoryProvider::new()
            .with_measure(
                MeasureDefinition::new("CBP", "Controlling High Blood Pressure", 0.15, 80.0)
                    .unwrap(),
            )
            .with_aggregates(vec![
                InterventionAggregate::new("CBP", d(2024, 10, 15), 600, 450, 9_000.0, 3_000.0)
                    .unwrap(),
                InterventionAggregate::new("CBP", d(2024, 11, 15), 400, 300, 6_000.0, 2_000.0)
                    .unwrap(),
            ]);
        RoiCalculator::with_defaults(provider).unwrap()
    }

    #[test]
    fn test_measure_roi_example() {
        let roi = calculator().calculate_measure_roi("CBP", &quarter()).unwrap();

        assert_eq!(roi.measure_name, "Controlling High Blood Pressure");
        assert_eq!(roi.total_interventions, 1000);
        assert_eq!(roi.successful_closures, 750);
        assert_relative_eq!(roi.success_rate, 75.0);
        assert_relative_eq!(roi.total_revenue, 75_000.0);
        assert_eq!(roi.star_rating, 2);
        assert_relative_eq!(roi.quality_bonus, 100_000.0);

        assert_relative_eq!(roi.cost_breakdown.staff_cost, 37_500.0);
        assert_relative_eq!(roi.cost_breakdown.outreach_cost, 15_000.0);
        assert_relative_eq!(roi.cost_breakdown.lab_cost, 12_500.0);
        assert_relative_eq!(roi.cost_breakdown.intervention_cost, 5_000.0);
        assert_relative_eq!(roi.total_costs, 70_000.0);

        assert_relative_eq!(roi.net_roi, 105_000.0);
        assert_relative_eq!(roi.roi_ratio, 2.5);
        assert_relative_eq!(roi.payback_period_months.unwrap(), 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_interval_brackets_success_rate() {
        let roi = calculator().calculate_measure_roi("CBP", &quarter()).unwrap();
        let ci = roi.confidence_interval;
        assert!(ci.lower <= roi.success_rate && roi.success_rate <= ci.upper);
        assert!(ci.lower >= 0.0 && ci.upper <= 100.0);
        assert!(roi.revenue_ci_lower <= roi.total_revenue);
        assert!(roi.revenue_ci_upper >= roi.total_revenue);
        assert!(roi.net_roi_ci_lower <= roi.net_roi && roi.net_roi <= roi.net_roi_ci_upper);
    }

    #[test]
    fn test_no_data_returns_zeroed_result() {
        let calc = calculator();
        let roi = calc.calculate_measure_roi("COL", &quarter()).unwrap();
        assert_eq!(roi.total_interventions, 0);
        assert_eq!(roi.roi_ratio, 0.0);
        assert_eq!(roi.net_roi, 0.0);
        assert!(!roi.has_volume());

        assert!(matches!(
            calc.try_calculate_measure_roi("COL", &quarter()),
            Err(EngineError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_zero_cost_ratio_is_zero() {
        let provider = InMemoryProvider::new().with_aggregate(
            InterventionAggregate::new("EED", d(2024, 10, 2), 0, 0, 0.0, 0.0).unwrap(),
        );
        let calc = RoiCalculator::with_defaults(provider).unwrap();
        let roi = calc.calculate_measure_roi("EED", &quarter()).unwrap();
        assert_eq!(roi.total_costs, 0.0);
        assert_eq!(roi.roi_ratio, 0.0);
        assert_eq!(roi.star_rating, NO_VOLUME_STAR_RATING);
    }

    #[test]
    fn test_invalid_confidence_level_fails_at_construction() {
        let assumptions = RoiAssumptions {
            confidence_level: 0.0,
            ..RoiAssumptions::default()
        };
        assert!(matches!(
            RoiCalculator::new(InMemoryProvider::new(), assumptions),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_three_methods() {
        let methods = calculator()
            .calculate_roi_three_methods(10_000.0, 200, 1000)
            .unwrap();

        assert_relative_eq!(methods.conservative.total_benefit, 20_000.0);
        assert_relative_eq!(methods.conservative.roi_ratio, 2.0);
        assert_relative_eq!(methods.comprehensive.total_benefit, 46_500.0);
        assert_relative_eq!(methods.cms_focused.total_benefit, 70_000.0);
        assert_relative_eq!(methods.get(RoiMethod::CmsFocused).net_roi, 60_000.0);
    }

    #[test]
    fn test_three_methods_zero_investment_uses_floor() {
        let methods = calculator().calculate_roi_three_methods(0.0, 1, 1000).unwrap();
        assert_relative_eq!(methods.conservative.roi_ratio, 100.0);
        assert!(calculator().calculate_roi_three_methods(-5.0, 1, 1000).is_err());
    }

    #[test]
    fn test_recommendation_table() {
        let cms = recommend_roi_method(OrgType::Payer, Audience::Cfo, ReportingContext::Cms);
        assert_eq!(cms.recommended, RoiMethod::CmsFocused);
        assert_eq!(cms.alternative, Some(RoiMethod::Comprehensive));

        let cmo = recommend_roi_method(OrgType::Payer, Audience::Cmo, ReportingContext::Internal);
        assert_eq!(cmo.recommended, RoiMethod::CmsFocused);
        assert_eq!(cmo.alternative, None);

        let board = recommend_roi_method(OrgType::Provider, Audience::Cio, ReportingContext::Board);
        assert_eq!(board.recommended, RoiMethod::Comprehensive);

        let internal =
            recommend_roi_method(OrgType::Provider, Audience::Cio, ReportingContext::Internal);
        assert_eq!(internal.recommended, RoiMethod::Conservative);
        assert_eq!(internal.alternative, Some(RoiMethod::Comprehensive));
    }

    #[test]
    fn test_sensitivity_recomputes_dependents() {
        let calc = calculator();
        let base = calc.calculate_measure_roi("CBP", &quarter()).unwrap();
        let outcomes = calc
            .sensitivity_analysis(
                &base,
                &[
                    SensitivityScenario::new("optimistic").with_success_rate(90.0),
                    SensitivityScenario::new("cost overrun").with_cost_multiplier(2.0),
                ],
            )
            .unwrap();

        let optimistic = &outcomes[0].result;
        assert_eq!(optimistic.successful_closures, 900);
        assert_relative_eq!(optimistic.total_revenue, 90_000.0);
        assert_eq!(optimistic.star_rating, 4);
        assert_relative_eq!(optimistic.quality_bonus, 200_000.0);
        assert_relative_eq!(optimistic.net_roi, 220_000.0);
        assert_relative_eq!(outcomes[0].change_from_base, 115_000.0);
        let ci = optimistic.confidence_interval;
        assert!(ci.lower <= 90.0 && 90.0 <= ci.upper);

        let overrun = &outcomes[1].result;
        assert_relative_eq!(overrun.total_costs, 140_000.0);
        assert_relative_eq!(overrun.cost_breakdown.staff_cost, 75_000.0);
        assert_relative_eq!(overrun.net_roi, 35_000.0);
        assert_relative_eq!(overrun.roi_ratio, 1.25);
        assert_relative_eq!(outcomes[1].change_from_base, -70_000.0);
    }

    #[test]
    fn test_sensitivity_rejects_negative_multiplier() {
        let calc = calculator();
        let base = calc.calculate_measure_roi("CBP", &quarter()).unwrap();
        let result = calc.sensitivity_analysis(
            &base,
            &[SensitivityScenario::new("bad").with_cost_multiplier(-1.0)],
        );
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_portfolio_summary() {
        let summary = calculator().portfolio_summary(&quarter()).unwrap();
        assert_eq!(summary.total_interventions, 1000);
        assert_relative_eq!(summary.revenue_impact, 75_000.0);
        assert_relative_eq!(summary.roi_ratio, 15.0);
    }
}
