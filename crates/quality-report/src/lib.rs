//! Runs every engine component over one data provider and gathers the
//! results into a single serializable report.

use std::collections::BTreeSet;

use alert_system::{Alert, AlertStats, AlertSystem};
use chrono::{DateTime, NaiveDate, Utc};
use historical_tracker::{ForecastPoint, HistoricalTracker, SeasonalPattern, StatusReport};
use portfolio_optimizer::{PortfolioOptimizer, PortfolioPlan};
use quality_core::{DataProvider, EngineConfig, EngineResult, Period, PortfolioSummary};
use roi_calculator::{RoiCalculator, RoiResult, ThreeMethodRoi};
use scenario_modeler::{Objective, ScenarioModeler, ScenarioResult, SearchConstraints, Strategy};
use serde::Serialize;
use tracing::info;

/// History loaded for trends, year-over-year and anomaly windows
pub const SNAPSHOT_HISTORY_DAYS: i64 = 760;
/// Open work loaded past the report date for the deadline and opportunity checks
pub const SNAPSHOT_LOOKAHEAD_DAYS: i64 = 60;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub as_of: NaiveDate,
    /// Length of the ROI and scenario baseline window ending at `as_of`
    pub period_days: i64,
    pub measure_id: Option<String>,
    pub budget: f64,
    pub fte_count: u32,
    pub strategy: Strategy,
    pub pareto_points: usize,
    pub objective: Objective,
}

impl ReportOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            period_days: 90,
            measure_id: None,
            budget: 100_000.0,
            fte_count: 2,
            strategy: Strategy::Balanced,
            pareto_points: 10,
            objective: Objective::MaxRoi,
        }
    }

    pub fn period(&self) -> Period {
        Period::last_days(self.as_of, self.period_days)
    }

    /// Window a store snapshot must cover for a full report
    pub fn snapshot_period(&self) -> Period {
        Period {
            start: self.as_of - chrono::Duration::days(SNAPSHOT_HISTORY_DAYS),
            end: self.as_of + chrono::Duration::days(SNAPSHOT_LOOKAHEAD_DAYS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub as_of: NaiveDate,
    pub period: Period,
    pub portfolio_summary: PortfolioSummary,
    pub measure_roi: Vec<RoiResult>,
    pub roi_methods: ThreeMethodRoi,
    pub scenario: ScenarioResult,
    pub optimal_scenario: ScenarioResult,
    pub pareto_frontier: Vec<ScenarioResult>,
    pub intervention_portfolio: PortfolioPlan,
    pub alerts: Vec<Alert>,
    pub alert_stats: AlertStats,
    pub measure_status: Vec<StatusReport>,
    pub forecast: Vec<ForecastPoint>,
    pub seasonality: SeasonalPattern,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Measures with activity in `period`, or just the requested one
pub fn report_measures<P: DataProvider>(
    provider: &P,
    period: &Period,
    measure_id: Option<&str>,
) -> EngineResult<Vec<String>> {
    if let Some(id) = measure_id {
        return Ok(vec![id.to_string()]);
    }
    let rows = provider.get_aggregates(None, period)?;
    let ids: BTreeSet<String> = rows.into_iter().map(|r| r.measure_id).collect();
    Ok(ids.into_iter().collect())
}

pub fn build_report<P: DataProvider>(
    provider: &P,
    config: &EngineConfig,
    options: &ReportOptions,
) -> EngineResult<EngineReport> {
    config.validate()?;
    let period = options.period();
    let measure = options.measure_id.as_deref();

    let roi = RoiCalculator::new(provider, config.roi.clone())?;
    let measure_ids = report_measures(provider, &period, measure)?;
    let measure_roi = roi.calculate_all_measures(&measure_ids, &period)?;
    let portfolio_summary = roi.portfolio_summary(&period)?;
    let roi_methods = roi.calculate_roi_three_methods(
        portfolio_summary.total_investment,
        portfolio_summary.total_closures,
        config.roi.members_per_measure,
    )?;

    let modeler = ScenarioModeler::from_roi_calculator(&roi, &period, config.scenario.clone())?;
    let scenario = modeler.calculate_scenario(options.budget, options.fte_count, options.strategy);
    let optimal_scenario =
        modeler.get_optimal_scenario(SearchConstraints::default(), options.objective);
    let pareto_frontier = modeler.generate_pareto_frontier(
        (config.scenario.min_budget, config.scenario.max_budget),
        (config.scenario.min_fte, config.scenario.max_fte),
        options.pareto_points,
    )?;

    let optimizer = PortfolioOptimizer::new(provider, config.portfolio.clone(), &config.roi)?;
    let intervention_portfolio = optimizer.optimize_intervention_portfolio(options.budget, &[])?;

    let alert_system = AlertSystem::new(provider, config.alerts.clone(), &config.roi)?;
    let alerts = alert_system.generate_all_alerts_at(start_of_day(options.as_of), None)?;
    let alert_stats = alert_system.get_alert_stats();

    let tracker = HistoricalTracker::new(provider, config.tracker.clone(), &config.roi)?;
    let measure_status = match measure {
        Some(id) => vec![tracker.calculate_status(id, options.as_of)?],
        None => tracker.get_all_measures_status(options.as_of)?,
    };
    let forecast = tracker.forecast_next_quarter(measure, options.as_of)?;
    let seasonality =
        tracker.detect_seasonal_patterns(measure, &Period::last_days(options.as_of, 365))?;

    info!(
        "Report for {}: {} measures, {} alerts, {} forecast months",
        period.key(),
        measure_roi.len(),
        alerts.len(),
        forecast.len()
    );

    Ok(EngineReport {
        as_of: options.as_of,
        period,
        portfolio_summary,
        measure_roi,
        roi_methods,
        scenario,
        optimal_scenario,
        pareto_frontier,
        intervention_portfolio,
        alerts,
        alert_stats,
        measure_status,
        forecast,
        seasonality,
    })
}

/// Plain-text CFO report for the measures active in the report period
pub fn build_cfo_report<P: DataProvider>(
    provider: &P,
    config: &EngineConfig,
    options: &ReportOptions,
) -> EngineResult<String> {
    let period = options.period();
    let roi = RoiCalculator::new(provider, config.roi.clone())?;
    let measure_ids = report_measures(provider, &period, options.measure_id.as_deref())?;
    let results = roi.calculate_all_measures(&measure_ids, &period)?;
    let summary = roi.portfolio_summary(&period)?;
    roi.generate_cfo_report(&results, Some(&summary), options.as_of)
}
