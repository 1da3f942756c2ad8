use quality_core::{AggregateTotals, ScenarioConfig};
use serde::{Deserialize, Serialize};

/// Allocation strategy applied to the baseline success rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Balanced,
    /// Focus on high-ROI measures; lifts the success rate
    HighRoi,
    /// Maximize volume; slightly lowers the success rate
    HighVolume,
}

impl Strategy {
    pub fn multiplier(&self) -> f64 {
        match self {
            Strategy::Balanced => 1.0,
            Strategy::HighRoi => 1.15,
            Strategy::HighVolume => 0.95,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Balanced => "balanced",
            Strategy::HighRoi => "high_roi",
            Strategy::HighVolume => "high_volume",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "balanced" => Some(Strategy::Balanced),
            "high_roi" => Some(Strategy::HighRoi),
            "high_volume" => Some(Strategy::HighVolume),
            _ => None,
        }
    }
}

/// Which bound limited the predicted intervention count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingConstraint {
    Budget,
    Capacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    MaxRoi,
    MaxClosures,
    MaxNetBenefit,
}

impl Objective {
    pub fn score(&self, scenario: &ScenarioResult) -> f64 {
        match self {
            Objective::MaxRoi => scenario.roi_ratio,
            Objective::MaxClosures => scenario.predicted_closures as f64,
            Objective::MaxNetBenefit => scenario.net_benefit,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "max_roi" | "roi_ratio" => Some(Objective::MaxRoi),
            "max_closures" | "closures" => Some(Objective::MaxClosures),
            "max_net_benefit" | "net_benefit" => Some(Objective::MaxNetBenefit),
            _ => None,
        }
    }
}

/// Historical cost and success rate the projections start from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub avg_cost_per_intervention: f64,
    /// Percent
    pub success_rate: f64,
    /// False when the defaults were used for lack of data
    pub from_data: bool,
}

impl Baseline {
    pub fn defaults(config: &ScenarioConfig) -> Self {
        Self {
            avg_cost_per_intervention: config.default_avg_cost,
            success_rate: config.default_success_rate,
            from_data: false,
        }
    }

    /// Completed spend per intervention and the pooled closure rate.
    ///
    /// Falls back to the configured defaults when there are no interventions,
    /// and to the default cost alone when no completed cost was recorded.
    pub fn from_totals(totals: &AggregateTotals, config: &ScenarioConfig) -> Self {
        if totals.is_empty() {
            return Self::defaults(config);
        }

        let avg_cost = totals.completed_cost / totals.total_interventions.max(1) as f64;
        Self {
            avg_cost_per_intervention: if avg_cost > 0.0 {
                avg_cost
            } else {
                config.default_avg_cost
            },
            success_rate: totals.success_rate(),
            from_data: true,
        }
    }
}

/// Projected outcome of one budget/staffing/strategy input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Budget after clamping
    pub budget: f64,
    /// FTE count after clamping
    pub fte_count: u32,
    pub strategy: Strategy,
    pub max_capacity: u64,
    pub budget_constrained_interventions: u64,
    pub predicted_interventions: u64,
    pub predicted_closures: u64,
    pub predicted_success_rate: f64,
    pub predicted_revenue: f64,
    pub actual_cost: f64,
    pub roi_ratio: f64,
    pub net_benefit: f64,
    /// actual_cost / budget, percent
    pub budget_utilization: f64,
    /// predicted_interventions / max_capacity, percent
    pub capacity_utilization: f64,
    pub binding_constraint: BindingConstraint,
    pub avg_cost_per_intervention: f64,
    pub revenue_per_closure: f64,
}

/// Input row for [`ScenarioModeler::compare_scenarios`](crate::ScenarioModeler::compare_scenarios)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    #[serde(default)]
    pub name: Option<String>,
    pub budget: f64,
    pub fte_count: u32,
    #[serde(default)]
    pub strategy: Strategy,
}

impl ScenarioInput {
    pub fn new(budget: f64, fte_count: u32, strategy: Strategy) -> Self {
        Self {
            name: None,
            budget,
            fte_count,
            strategy,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    pub result: ScenarioResult,
}

/// Upper bounds for the optimal-scenario search; `None` means the configured maximum
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConstraints {
    pub max_budget: Option<f64>,
    pub max_fte: Option<u32>,
}
