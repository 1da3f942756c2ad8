use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar month of activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// First day of the month
    pub month: NaiveDate,
    pub total_interventions: u64,
    pub successful_closures: u64,
    pub success_rate: f64,
    /// Spend on completed interventions
    pub total_cost: f64,
    pub revenue: f64,
}

impl MonthlyTrend {
    /// `2024-10` style label
    pub fn label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub has_seasonality: bool,
    pub peak_month: Option<String>,
    pub low_month: Option<String>,
    /// Std dev of the month-of-year averages, in percentage points
    pub seasonal_variance: f64,
    /// Average success rate keyed by month number (1 = January)
    pub monthly_averages: BTreeMap<u32, f64>,
}

impl SeasonalPattern {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Projected figures for a future month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: NaiveDate,
    pub measure_id: Option<String>,
    pub forecasted_interventions: u64,
    pub forecasted_success_rate: f64,
    pub forecasted_closures: u64,
    pub forecasted_revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureStatus {
    OnTrack,
    AtRisk,
    Critical,
    /// No completed interventions to judge from
    Unknown,
}

impl MeasureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureStatus::OnTrack => "on_track",
            MeasureStatus::AtRisk => "at_risk",
            MeasureStatus::Critical => "critical",
            MeasureStatus::Unknown => "unknown",
        }
    }

    pub fn from_rate(rate: f64, target: f64, at_risk_ratio: f64) -> Self {
        if rate >= target {
            MeasureStatus::OnTrack
        } else if rate >= target * at_risk_ratio {
            MeasureStatus::AtRisk
        } else {
            MeasureStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }

    pub fn from_slope(slope: f64, deadband: f64) -> Self {
        if slope > deadband {
            Trend::Improving
        } else if slope < -deadband {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub measure_id: String,
    pub measure_name: String,
    pub status: MeasureStatus,
    pub current_rate: f64,
    pub target_rate: f64,
    /// `current_rate - target_rate`
    pub variance: f64,
    pub trend: Trend,
    pub months_analyzed: usize,
    pub has_data: bool,
}

impl StatusReport {
    pub fn unknown(measure_id: &str, measure_name: String, target_rate: f64) -> Self {
        Self {
            measure_id: measure_id.to_string(),
            measure_name,
            status: MeasureStatus::Unknown,
            current_rate: 0.0,
            target_rate,
            variance: -target_rate,
            trend: Trend::Stable,
            months_analyzed: 0,
            has_data: false,
        }
    }
}

/// Current year-to-date against the whole previous year, per measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverYear {
    pub measure_id: String,
    pub measure_name: String,
    pub current_success_rate: f64,
    pub previous_success_rate: f64,
    /// Percentage points
    pub success_rate_change: f64,
    pub current_revenue: f64,
    pub previous_revenue: f64,
    pub revenue_change: f64,
    /// 0 when the previous year had no revenue
    pub revenue_change_pct: f64,
    pub current_interventions: u64,
    pub previous_interventions: u64,
}
