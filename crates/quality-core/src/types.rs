use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::stats;
use crate::{EngineError, EngineResult};

/// Inclusive date range used for every provider query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if end < start {
            return Err(EngineError::Validation(format!(
                "period end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `as_of`
    pub fn last_days(as_of: NaiveDate, days: i64) -> Self {
        Self {
            start: as_of - Duration::days(days.max(0)),
            end: as_of,
        }
    }

    /// From `as_of` forward `days` days
    pub fn next_days(as_of: NaiveDate, days: i64) -> Self {
        Self {
            start: as_of,
            end: as_of + Duration::days(days.max(0)),
        }
    }

    /// Calendar year `year`, January 1st through December 31st
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Window of the same length ending the day before this one starts.
    ///
    /// Both windows are inclusive, so no date falls in both.
    pub fn preceding(&self) -> Self {
        let end = self.start - Duration::days(1);
        Self {
            start: end - Duration::days(self.len_days()),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Cache/log friendly key, e.g. `2024-10-01..2024-12-31`
    pub fn key(&self) -> String {
        format!("{}..{}", self.start, self.end)
    }
}

/// One aggregated row from the data provider.
///
/// `period` is the bucket date the row summarizes (a day or a month start,
/// depending on the provider); the engine only relies on it for filtering and
/// calendar-month grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionAggregate {
    pub measure_id: String,
    pub period: NaiveDate,
    pub total_interventions: u64,
    pub successful_closures: u64,
    /// Cost of every intervention in the bucket
    pub total_cost: f64,
    /// Cost of the interventions that completed
    #[serde(default)]
    pub completed_cost: f64,
}

impl InterventionAggregate {
    pub fn new(
        measure_id: impl Into<String>,
        period: NaiveDate,
        total_interventions: u64,
        successful_closures: u64,
        total_cost: f64,
        completed_cost: f64,
    ) -> EngineResult<Self> {
        let measure_id = measure_id.into();
        if successful_closures > total_interventions {
            return Err(EngineError::Validation(format!(
                "{}: {} closures exceed {} interventions",
                measure_id, successful_closures, total_interventions
            )));
        }
        if total_cost < 0.0 || completed_cost < 0.0 {
            return Err(EngineError::Validation(format!(
                "{}: costs must be non-negative",
                measure_id
            )));
        }
        Ok(Self {
            measure_id,
            period,
            total_interventions,
            successful_closures,
            total_cost,
            completed_cost,
        })
    }

    /// Closure rate in percent, 0 when there were no interventions
    pub fn success_rate(&self) -> f64 {
        stats::success_rate(self.successful_closures, self.total_interventions)
    }

    /// First day of the calendar month this row falls in
    pub fn month_start(&self) -> NaiveDate {
        self.period.with_day(1).unwrap_or(self.period)
    }
}

/// Sums over a set of aggregate rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub total_interventions: u64,
    pub successful_closures: u64,
    pub total_cost: f64,
    pub completed_cost: f64,
}

impl AggregateTotals {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a InterventionAggregate>,
    {
        rows.into_iter().fold(Self::default(), |mut acc, row| {
            acc.add(row);
            acc
        })
    }

    pub fn add(&mut self, row: &InterventionAggregate) {
        self.total_interventions += row.total_interventions;
        self.successful_closures += row.successful_closures;
        self.total_cost += row.total_cost;
        self.completed_cost += row.completed_cost;
    }

    pub fn is_empty(&self) -> bool {
        self.total_interventions == 0
    }

    pub fn success_rate(&self) -> f64 {
        stats::success_rate(self.successful_closures, self.total_interventions)
    }
}

/// Immutable reference data for a HEDIS measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDefinition {
    pub measure_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub star_weight: f64,
    /// Benchmark closure rate (0-100)
    pub benchmark_rate: f64,
}

impl MeasureDefinition {
    pub fn new(
        measure_id: impl Into<String>,
        name: impl Into<String>,
        star_weight: f64,
        benchmark_rate: f64,
    ) -> EngineResult<Self> {
        let measure_id = measure_id.into();
        if star_weight <= 0.0 {
            return Err(EngineError::Validation(format!(
                "{}: star_weight must be positive",
                measure_id
            )));
        }
        if !(0.0..=100.0).contains(&benchmark_rate) {
            return Err(EngineError::Validation(format!(
                "{}: benchmark_rate must be within 0-100",
                measure_id
            )));
        }
        Ok(Self {
            measure_id,
            name: name.into(),
            category: None,
            star_weight,
            benchmark_rate,
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Pending,
    Scheduled,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Scheduled => "scheduled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PendingStatus::Pending),
            "scheduled" => Some(PendingStatus::Scheduled),
            _ => None,
        }
    }
}

/// An open intervention that has not closed its gap yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingIntervention {
    pub measure_id: String,
    pub member_id: String,
    pub due_date: NaiveDate,
    pub status: PendingStatus,
}

/// Confidence bounds on a percentage, in the same 0-100 scale as the estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Confidence level, e.g. 0.95
    pub level: f64,
}

impl ConfidenceInterval {
    pub fn zero(level: f64) -> Self {
        Self {
            lower: 0.0,
            upper: 0.0,
            level,
        }
    }

    /// Widen the bounds so they always bracket `point` and stay within 0-100
    pub fn bracketing(mut self, point: f64) -> Self {
        self.lower = self.lower.min(point).clamp(0.0, 100.0);
        self.upper = self.upper.max(point).clamp(0.0, 100.0);
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Portfolio-wide KPIs over a period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_interventions: u64,
    pub total_closures: u64,
    pub overall_success_rate: f64,
    /// Spend on completed interventions
    pub total_investment: f64,
    pub revenue_impact: f64,
    pub net_benefit: f64,
    pub roi_ratio: f64,
}

impl PortfolioSummary {
    pub fn from_rows(rows: &[InterventionAggregate], revenue_per_closure: f64) -> Self {
        let totals = AggregateTotals::from_rows(rows);
        let revenue_impact = totals.successful_closures as f64 * revenue_per_closure;
        let roi_ratio = if totals.completed_cost > 0.0 {
            revenue_impact / totals.completed_cost
        } else {
            0.0
        };

        Self {
            total_interventions: totals.total_interventions,
            total_closures: totals.successful_closures,
            overall_success_rate: totals.success_rate(),
            total_investment: totals.completed_cost,
            revenue_impact,
            net_benefit: revenue_impact - totals.completed_cost,
            roi_ratio,
        }
    }
}

/// Three-letter month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Name for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// First day of the month `months` after the month containing `date`
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.month0() + months;
    let year = date.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_aggregate_rejects_excess_closures() {
        let err = InterventionAggregate::new("CBP", d(2024, 10, 1), 10, 11, 100.0, 50.0);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_success_rate_zero_volume() {
        let row = InterventionAggregate::new("CBP", d(2024, 10, 1), 0, 0, 0.0, 0.0).unwrap();
        assert_eq!(row.success_rate(), 0.0);
    }

    #[test]
    fn test_preceding_period_same_length() {
        let current = Period::new(d(2024, 10, 15), d(2024, 10, 29)).unwrap();
        let previous = current.preceding();
        assert_eq!(previous.len_days(), current.len_days());
        assert_eq!(previous.start, d(2024, 9, 30));
        assert_eq!(previous.end, d(2024, 10, 14));
        assert!(!previous.contains(current.start));
    }

    #[test]
    fn test_add_months_wraps_year() {
        assert_eq!(add_months(d(2024, 11, 17), 1), d(2024, 12, 1));
        assert_eq!(add_months(d(2024, 11, 17), 3), d(2025, 2, 1));
    }

    #[test]
    fn test_portfolio_summary_no_cost() {
        let rows = vec![InterventionAggregate::new("CDC", d(2024, 1, 5), 10, 5, 0.0, 0.0).unwrap()];
        let summary = PortfolioSummary::from_rows(&rows, 100.0);
        assert_eq!(summary.revenue_impact, 500.0);
        assert_eq!(summary.roi_ratio, 0.0);
        assert_eq!(summary.overall_success_rate, 50.0);
    }

    #[test]
    fn test_interval_bracketing() {
        let ci = ConfidenceInterval { lower: 10.0, upper: 20.0, level: 0.95 }.bracketing(25.0);
        assert!(ci.contains(25.0));
        assert_eq!(ci.lower, 10.0);
    }
}
