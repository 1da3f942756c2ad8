use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use quality_core::{
    add_months, month_name, stats, AggregateTotals, DataProvider, EngineError, EngineResult,
    InterventionAggregate, Period, RoiAssumptions, TrackerConfig,
};
use tracing::{debug, info};

use crate::models::*;

/// Tracks measure performance month over month
pub struct HistoricalTracker<P> {
    provider: P,
    config: TrackerConfig,
    revenue_per_closure: f64,
}

impl<P: DataProvider> HistoricalTracker<P> {
    pub fn new(
        provider: P,
        config: TrackerConfig,
        assumptions: &RoiAssumptions,
    ) -> EngineResult<Self> {
        config.validate()?;
        assumptions.validate()?;
        Ok(Self {
            provider,
            config,
            revenue_per_closure: assumptions.revenue_per_closure,
        })
    }

    pub fn with_defaults(provider: P) -> EngineResult<Self> {
        Self::new(provider, TrackerConfig::default(), &RoiAssumptions::default())
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Aggregates grouped by calendar month, oldest first.
    ///
    /// Without a measure id the months cover the whole portfolio.
    pub fn get_monthly_trends(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<MonthlyTrend>> {
        let rows = self.provider.get_aggregates(measure_id, period)?;
        let mut months: BTreeMap<NaiveDate, AggregateTotals> = BTreeMap::new();
        for row in &rows {
            months.entry(row.month_start()).or_default().add(row);
        }

        Ok(months
            .into_iter()
            .map(|(month, totals)| MonthlyTrend {
                month,
                total_interventions: totals.total_interventions,
                successful_closures: totals.successful_closures,
                success_rate: totals.success_rate(),
                total_cost: totals.completed_cost,
                revenue: totals.successful_closures as f64 * self.revenue_per_closure,
            })
            .collect())
    }

    /// Month-of-year averages and whether they vary enough to call seasonal
    pub fn detect_seasonal_patterns(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<SeasonalPattern> {
        let trends = self.get_monthly_trends(measure_id, period)?;

        let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for trend in &trends {
            by_month.entry(trend.month.month()).or_default().push(trend.success_rate);
        }
        if by_month.len() < self.config.min_history_months {
            return Ok(SeasonalPattern::none());
        }

        let monthly_averages: BTreeMap<u32, f64> = by_month
            .into_iter()
            .map(|(month, rates)| (month, stats::mean(&rates)))
            .collect();

        let mut peak: Option<(u32, f64)> = None;
        let mut low: Option<(u32, f64)> = None;
        for (&month, &avg) in &monthly_averages {
            if peak.map_or(true, |(_, best)| avg > best) {
                peak = Some((month, avg));
            }
            if low.map_or(true, |(_, worst)| avg < worst) {
                low = Some((month, avg));
            }
        }

        let averages: Vec<f64> = monthly_averages.values().copied().collect();
        let seasonal_variance = stats::std_dev(&averages);
        Ok(SeasonalPattern {
            has_seasonality: seasonal_variance > self.config.seasonality_threshold,
            peak_month: peak.and_then(|(m, _)| month_name(m)).map(str::to_string),
            low_month: low.and_then(|(m, _)| month_name(m)).map(str::to_string),
            seasonal_variance,
            monthly_averages,
        })
    }

    /// Linear-trend projection of the months after the last observed one.
    ///
    /// Success rate and volume are fitted separately over the trailing
    /// months and projected from the last observed values. Too little
    /// history gives an empty forecast.
    pub fn forecast_next_quarter(
        &self,
        measure_id: Option<&str>,
        as_of: NaiveDate,
    ) -> EngineResult<Vec<ForecastPoint>> {
        let history = Period::last_days(as_of, self.config.history_days);
        let trends = self.get_monthly_trends(measure_id, &history)?;
        let last = match trends.last() {
            Some(last) if trends.len() >= self.config.min_history_months => last,
            _ => {
                debug!(
                    "{} months of history for {}, not forecasting",
                    trends.len(),
                    measure_id.unwrap_or("portfolio")
                );
                return Ok(Vec::new());
            }
        };

        let recent = &trends[trends.len().saturating_sub(self.config.forecast_fit_months)..];
        let rates: Vec<f64> = recent.iter().map(|t| t.success_rate).collect();
        let volumes: Vec<f64> = recent.iter().map(|t| t.total_interventions as f64).collect();
        let rate_slope = stats::linear_trend(&rates).slope;
        let volume_slope = stats::linear_trend(&volumes).slope;

        let last_rate = last.success_rate;
        let last_volume = last.total_interventions as f64;

        Ok((1..=self.config.forecast_horizon_months)
            .map(|step| {
                let ahead = step as f64;
                let rate = (last_rate + rate_slope * ahead).clamp(0.0, 100.0);
                let interventions = (last_volume + volume_slope * ahead).max(0.0);
                let closures = (interventions * rate / 100.0).floor();
                ForecastPoint {
                    month: add_months(last.month, step),
                    measure_id: measure_id.map(str::to_string),
                    forecasted_interventions: interventions.floor() as u64,
                    forecasted_success_rate: rate,
                    forecasted_closures: closures as u64,
                    forecasted_revenue: closures * self.revenue_per_closure,
                }
            })
            .collect())
    }

    /// On-track / at-risk / critical classification as of `as_of`.
    ///
    /// The lookback widens from three months to a year until data shows up.
    /// A measure without completed interventions is `Unknown`, never
    /// `Critical`.
    pub fn calculate_status(
        &self,
        measure_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<StatusReport> {
        let measure_name = self.measure_name(measure_id)?;
        let target = self.config.target_success_rate;

        let mut trends = Vec::new();
        for &days in &self.config.status_lookback_days {
            trends = self.get_monthly_trends(Some(measure_id), &Period::last_days(as_of, days))?;
            if !trends.is_empty() {
                break;
            }
        }

        let recent = &trends[trends.len().saturating_sub(self.config.status_months)..];
        let completed: u64 = recent.iter().map(|t| t.successful_closures).sum();
        if completed == 0 {
            debug!("No completed interventions for {}, status unknown", measure_id);
            return Ok(StatusReport::unknown(measure_id, measure_name, target));
        }

        let rates: Vec<f64> = recent.iter().map(|t| t.success_rate).collect();
        let current_rate = stats::mean(&rates);
        let trend = match (rates.first(), rates.last()) {
            (Some(first), Some(last)) if rates.len() >= 2 => {
                Trend::from_slope((last - first) / rates.len() as f64, self.config.trend_deadband)
            }
            _ => Trend::Stable,
        };

        Ok(StatusReport {
            measure_id: measure_id.to_string(),
            measure_name,
            status: MeasureStatus::from_rate(current_rate, target, self.config.at_risk_ratio),
            current_rate,
            target_rate: target,
            variance: current_rate - target,
            trend,
            months_analyzed: recent.len(),
            has_data: true,
        })
    }

    /// Status of every measure with activity in the past year, by name
    pub fn get_all_measures_status(&self, as_of: NaiveDate) -> EngineResult<Vec<StatusReport>> {
        let rows = self
            .provider
            .get_aggregates(None, &Period::last_days(as_of, self.config.history_days))?;
        let measure_ids: BTreeSet<&str> = rows.iter().map(|r| r.measure_id.as_str()).collect();

        let mut reports = measure_ids
            .into_iter()
            .map(|id| self.calculate_status(id, as_of))
            .collect::<EngineResult<Vec<_>>>()?;
        reports.sort_by(|a, b| {
            a.measure_name
                .cmp(&b.measure_name)
                .then_with(|| a.measure_id.cmp(&b.measure_id))
        });

        info!("Computed status for {} measures", reports.len());
        Ok(reports)
    }

    /// `current_year` through `as_of` against the whole previous year.
    ///
    /// Only measures with activity in both periods are compared.
    pub fn get_year_over_year_comparison(
        &self,
        measure_id: Option<&str>,
        current_year: i32,
        as_of: NaiveDate,
    ) -> EngineResult<Vec<YearOverYear>> {
        let invalid_year = || EngineError::Validation(format!("invalid year {}", current_year));
        let current_full = Period::calendar_year(current_year).ok_or_else(invalid_year)?;
        let previous = Period::calendar_year(current_year - 1).ok_or_else(invalid_year)?;
        let current = Period::new(current_full.start, as_of.min(current_full.end))?;

        let current_totals =
            totals_by_measure(&self.provider.get_aggregates(measure_id, &current)?);
        let previous_totals =
            totals_by_measure(&self.provider.get_aggregates(measure_id, &previous)?);

        let mut comparisons = Vec::new();
        for (id, cur) in &current_totals {
            let Some(prev) = previous_totals.get(id) else {
                continue;
            };
            let current_revenue = cur.successful_closures as f64 * self.revenue_per_closure;
            let previous_revenue = prev.successful_closures as f64 * self.revenue_per_closure;
            let revenue_change = current_revenue - previous_revenue;

            comparisons.push(YearOverYear {
                measure_id: id.clone(),
                measure_name: self.measure_name(id)?,
                current_success_rate: cur.success_rate(),
                previous_success_rate: prev.success_rate(),
                success_rate_change: cur.success_rate() - prev.success_rate(),
                current_revenue,
                previous_revenue,
                revenue_change,
                revenue_change_pct: stats::safe_ratio(revenue_change, previous_revenue) * 100.0,
                current_interventions: cur.total_interventions,
                previous_interventions: prev.total_interventions,
            });
        }
        Ok(comparisons)
    }

    fn measure_name(&self, measure_id: &str) -> EngineResult<String> {
        Ok(self
            .provider
            .get_measure_definition(measure_id)?
            .map(|m| m.name)
            .unwrap_or_else(|| measure_id.to_string()))
    }
}

fn totals_by_measure(rows: &[InterventionAggregate]) -> BTreeMap<String, AggregateTotals> {
    let mut totals: BTreeMap<String, AggregateTotals> = BTreeMap::new();
    for row in rows {
        totals.entry(row.measure_id.clone()).or_default().add(row);
    }
    totals
}
