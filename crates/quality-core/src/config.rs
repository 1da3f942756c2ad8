//! Typed engine configuration.
//!
//! Every constant the calculators recognize lives here with its default.
//! Components call [`EngineConfig::validate`] (or the section's own
//! `validate`) in their constructors so a bad constant fails before any
//! calculation runs.

use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Financial assumptions behind ROI figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAssumptions {
    /// Revenue credited per closed gap
    pub revenue_per_closure: f64,
    /// Quality bonus per member per star point
    pub bonus_per_star: f64,
    pub members_per_measure: u64,
    pub staff_hourly_rate: f64,
    pub staff_hours_per_intervention: f64,
    pub outreach_cost_per_member: f64,
    pub lab_cost_per_test: f64,
    /// Share of interventions that need a lab test
    pub lab_test_share: f64,
    /// Confidence level for success-rate intervals (e.g. 0.95)
    pub confidence_level: f64,
}

impl Default for RoiAssumptions {
    fn default() -> Self {
        Self {
            revenue_per_closure: 100.0,
            bonus_per_star: 50.0,
            members_per_measure: 1000,
            staff_hourly_rate: 75.0,
            staff_hours_per_intervention: 0.5,
            outreach_cost_per_member: 15.0,
            lab_cost_per_test: 25.0,
            lab_test_share: 0.5,
            confidence_level: 0.95,
        }
    }
}

impl RoiAssumptions {
    pub fn validate(&self) -> EngineResult<()> {
        require_non_negative("revenue_per_closure", self.revenue_per_closure)?;
        require_non_negative("bonus_per_star", self.bonus_per_star)?;
        require_non_negative("staff_hourly_rate", self.staff_hourly_rate)?;
        require_non_negative("staff_hours_per_intervention", self.staff_hours_per_intervention)?;
        require_non_negative("outreach_cost_per_member", self.outreach_cost_per_member)?;
        require_non_negative("lab_cost_per_test", self.lab_cost_per_test)?;
        require_fraction("lab_test_share", self.lab_test_share)?;
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EngineError::Configuration(format!(
                "confidence_level must be within (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

/// Budget/staffing model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Interventions one FTE handles per quarter
    pub per_fte_capacity: u32,
    pub min_budget: f64,
    pub max_budget: f64,
    pub min_fte: u32,
    pub max_fte: u32,
    /// Used when the baseline period has no cost data
    pub default_avg_cost: f64,
    /// Used when the baseline period has no interventions
    pub default_success_rate: f64,
    pub min_success_rate: f64,
    pub max_success_rate: f64,
    /// Budget increment for the optimal-scenario grid search
    pub grid_budget_step: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            per_fte_capacity: 200,
            min_budget: 50_000.0,
            max_budget: 500_000.0,
            min_fte: 1,
            max_fte: 10,
            default_avg_cost: 50.0,
            default_success_rate: 75.0,
            min_success_rate: 50.0,
            max_success_rate: 95.0,
            grid_budget_step: 25_000.0,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.per_fte_capacity == 0 {
            return Err(EngineError::Configuration(
                "per_fte_capacity must be positive".to_string(),
            ));
        }
        require_positive("min_budget", self.min_budget)?;
        if self.max_budget < self.min_budget {
            return Err(EngineError::Configuration(
                "max_budget must not be below min_budget".to_string(),
            ));
        }
        if self.min_fte == 0 || self.max_fte < self.min_fte {
            return Err(EngineError::Configuration(
                "fte bounds must satisfy 1 <= min_fte <= max_fte".to_string(),
            ));
        }
        require_positive("default_avg_cost", self.default_avg_cost)?;
        require_percent("default_success_rate", self.default_success_rate)?;
        require_percent("min_success_rate", self.min_success_rate)?;
        require_percent("max_success_rate", self.max_success_rate)?;
        if self.max_success_rate < self.min_success_rate {
            return Err(EngineError::Configuration(
                "max_success_rate must not be below min_success_rate".to_string(),
            ));
        }
        require_positive("grid_budget_step", self.grid_budget_step)
    }
}

/// Intervention portfolio scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Candidates taken from each ranking when building the balanced pool
    pub balanced_pool_size: usize,
    pub base_confidence: f64,
    /// Cost per closure above which confidence drops
    pub high_cost_per_closure: f64,
    pub high_cost_penalty: f64,
    /// Gap closure percent above which confidence drops
    pub aggressive_gap_closure: f64,
    pub aggressive_gap_penalty: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// Star weight for measures without an explicit weight
    pub default_star_weight: f64,
    /// Star weight for triple-weighted outcome measures
    pub high_star_weight: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            balanced_pool_size: 4,
            base_confidence: 85.0,
            high_cost_per_closure: 200.0,
            high_cost_penalty: 10.0,
            aggressive_gap_closure: 15.0,
            aggressive_gap_penalty: 5.0,
            min_confidence: 50.0,
            max_confidence: 95.0,
            default_star_weight: 0.10,
            high_star_weight: 0.15,
        }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.balanced_pool_size == 0 {
            return Err(EngineError::Configuration(
                "balanced_pool_size must be positive".to_string(),
            ));
        }
        require_percent("min_confidence", self.min_confidence)?;
        require_percent("max_confidence", self.max_confidence)?;
        if self.max_confidence < self.min_confidence {
            return Err(EngineError::Configuration(
                "max_confidence must not be below min_confidence".to_string(),
            ));
        }
        require_positive("default_star_weight", self.default_star_weight)?;
        require_positive("high_star_weight", self.high_star_weight)
    }
}

/// Which alert checks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledChecks {
    pub star_rating_risk: bool,
    pub opportunity: bool,
    pub deadline: bool,
    pub performance_anomaly: bool,
}

impl Default for EnabledChecks {
    fn default() -> Self {
        Self {
            star_rating_risk: true,
            opportunity: true,
            deadline: true,
            performance_anomaly: true,
        }
    }
}

/// Alert thresholds and windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Minimum success rate (percent) before a star rating is at risk
    pub star_rating_threshold: f64,
    /// Minimum interventions for a star-rating alert
    pub min_volume: u64,
    /// Lookback for the star-rating check when no period is given
    pub star_lookback_days: i64,
    pub opportunity_value_threshold: f64,
    /// Potential revenue at which an opportunity becomes high priority
    pub opportunity_high_value: f64,
    /// Days either side of today scanned for opportunities
    pub opportunity_window_days: i64,
    pub max_opportunities: usize,
    pub deadline_days_ahead: i64,
    /// Minimum open interventions per measure for a deadline alert
    pub deadline_min_count: usize,
    pub deadline_critical_days: i64,
    pub deadline_high_days: i64,
    /// Relative change (0.15 = 15%) that counts as an anomaly
    pub anomaly_threshold: f64,
    /// Length of the current comparison window
    pub anomaly_window_days: i64,
    pub enabled: EnabledChecks,
    /// Substitute demonstration alerts when real checks find nothing.
    /// Product-demo behavior, off unless explicitly enabled.
    pub demo_fallback: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            star_rating_threshold: 85.0,
            min_volume: 10,
            star_lookback_days: 90,
            opportunity_value_threshold: 10_000.0,
            opportunity_high_value: 50_000.0,
            opportunity_window_days: 30,
            max_opportunities: 5,
            deadline_days_ahead: 30,
            deadline_min_count: 10,
            deadline_critical_days: 7,
            deadline_high_days: 14,
            anomaly_threshold: 0.15,
            anomaly_window_days: 14,
            enabled: EnabledChecks::default(),
            demo_fallback: false,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> EngineResult<()> {
        require_percent("star_rating_threshold", self.star_rating_threshold)?;
        require_non_negative("opportunity_value_threshold", self.opportunity_value_threshold)?;
        if self.deadline_days_ahead < 0 || self.star_lookback_days <= 0 {
            return Err(EngineError::Configuration(
                "alert windows must be positive".to_string(),
            ));
        }
        if self.anomaly_window_days <= 0 {
            return Err(EngineError::Configuration(
                "anomaly_window_days must be positive".to_string(),
            ));
        }
        if self.deadline_critical_days > self.deadline_high_days {
            return Err(EngineError::Configuration(
                "deadline_critical_days must not exceed deadline_high_days".to_string(),
            ));
        }
        require_positive("anomaly_threshold", self.anomaly_threshold)
    }
}

/// Trend, forecast and status constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub target_success_rate: f64,
    /// Std dev (percentage points) across months above which data is seasonal
    pub seasonality_threshold: f64,
    pub min_history_months: usize,
    /// Trailing months used to fit the forecast trend
    pub forecast_fit_months: usize,
    pub forecast_horizon_months: u32,
    /// Per-month slope below which a trend counts as stable
    pub trend_deadband: f64,
    /// Share of target below which a measure is critical rather than at risk
    pub at_risk_ratio: f64,
    /// Status lookbacks tried in turn until a measure has data
    pub status_lookback_days: Vec<i64>,
    /// Most recent months averaged for status
    pub status_months: usize,
    /// History scanned for forecasting and the all-measures listing
    pub history_days: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_success_rate: 85.0,
            seasonality_threshold: 5.0,
            min_history_months: 3,
            forecast_fit_months: 6,
            forecast_horizon_months: 3,
            trend_deadband: 0.5,
            at_risk_ratio: 0.9,
            status_lookback_days: vec![90, 180, 365],
            status_months: 3,
            history_days: 365,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> EngineResult<()> {
        require_percent("target_success_rate", self.target_success_rate)?;
        require_non_negative("seasonality_threshold", self.seasonality_threshold)?;
        require_non_negative("trend_deadband", self.trend_deadband)?;
        require_fraction("at_risk_ratio", self.at_risk_ratio)?;
        if self.forecast_fit_months < 2 {
            return Err(EngineError::Configuration(
                "forecast_fit_months must be at least 2".to_string(),
            ));
        }
        let lookbacks = &self.status_lookback_days;
        if lookbacks.is_empty() || lookbacks.iter().any(|d| *d <= 0) {
            return Err(EngineError::Configuration(format!(
                "status_lookback_days must be positive day counts, got {:?}",
                self.status_lookback_days
            )));
        }
        if self.status_months == 0 {
            return Err(EngineError::Configuration(
                "status_months must be at least 1".to_string(),
            ));
        }
        if self.history_days <= 0 {
            return Err(EngineError::Configuration(format!(
                "history_days must be positive, got {}",
                self.history_days
            )));
        }
        Ok(())
    }
}

/// Complete engine configuration, supplied at construction time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub roi: RoiAssumptions,
    pub scenario: ScenarioConfig,
    pub portfolio: PortfolioConfig,
    pub alerts: AlertConfig,
    pub tracker: TrackerConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.roi.validate()?;
        self.scenario.validate()?;
        self.portfolio.validate()?;
        self.alerts.validate()?;
        self.tracker.validate()
    }

    /// Defaults overlaid with `HEDIS_*` environment variables.
    ///
    /// Unset variables keep their default; a set but unparsable variable is a
    /// configuration error.
    pub fn from_env() -> EngineResult<Self> {
        let mut config = Self::default();

        let roi = &mut config.roi;
        roi.revenue_per_closure = env_or("HEDIS_REVENUE_PER_CLOSURE", roi.revenue_per_closure)?;
        roi.bonus_per_star = env_or("HEDIS_BONUS_PER_STAR", roi.bonus_per_star)?;
        roi.members_per_measure = env_or("HEDIS_MEMBERS_PER_MEASURE", roi.members_per_measure)?;
        roi.staff_hourly_rate = env_or("HEDIS_STAFF_HOURLY_RATE", roi.staff_hourly_rate)?;
        roi.confidence_level = env_or("HEDIS_CONFIDENCE_LEVEL", roi.confidence_level)?;

        let scenario = &mut config.scenario;
        scenario.per_fte_capacity = env_or("HEDIS_PER_FTE_CAPACITY", scenario.per_fte_capacity)?;

        let alerts = &mut config.alerts;
        alerts.star_rating_threshold =
            env_or("HEDIS_STAR_RATING_THRESHOLD", alerts.star_rating_threshold)?;
        alerts.opportunity_value_threshold =
            env_or("HEDIS_OPPORTUNITY_THRESHOLD", alerts.opportunity_value_threshold)?;
        alerts.deadline_days_ahead =
            env_or("HEDIS_DEADLINE_DAYS_AHEAD", alerts.deadline_days_ahead)?;
        alerts.anomaly_threshold = env_or("HEDIS_ANOMALY_THRESHOLD", alerts.anomaly_threshold)?;
        alerts.demo_fallback = env_or("HEDIS_ALERT_DEMO_FALLBACK", alerts.demo_fallback)?;

        let tracker = &mut config.tracker;
        tracker.target_success_rate =
            env_or("HEDIS_TARGET_SUCCESS_RATE", tracker.target_success_rate)?;
        tracker.status_months = env_or("HEDIS_STATUS_MONTHS", tracker.status_months)?;
        tracker.history_days = env_or("HEDIS_HISTORY_DAYS", tracker.history_days)?;

        config.validate()?;
        Ok(config)
    }
}

fn env_or<T>(key: &str, default: T) -> EngineResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            EngineError::Configuration(format!("{}={:?} is invalid: {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

fn require_non_negative(name: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::Configuration(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}

fn require_positive(name: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn require_percent(name: &str, value: f64) -> EngineResult<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::Configuration(format!(
            "{} must be within 0-100, got {}",
            name, value
        )))
    }
}

fn require_fraction(name: &str, value: f64) -> EngineResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::Configuration(format!(
            "{} must be within 0-1, got {}",
            name, value
        )))
    }
}
