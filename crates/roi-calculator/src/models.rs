use quality_core::{ConfidenceInterval, Period};
use serde::{Deserialize, Serialize};

/// Star tier implied by a closure rate (85% = 3 stars, 90% = 4, 95% = 5)
pub fn star_tier(success_rate: f64) -> u8 {
    if success_rate >= 95.0 {
        5
    } else if success_rate >= 90.0 {
        4
    } else if success_rate >= 85.0 {
        3
    } else {
        2
    }
}

/// Star rating reported when a measure has no intervention volume
pub const NO_VOLUME_STAR_RATING: u8 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Modeled care coordinator time
    pub staff_cost: f64,
    pub outreach_cost: f64,
    pub lab_cost: f64,
    /// Actual cost of the completed interventions
    pub intervention_cost: f64,
    pub total_cost: f64,
}

impl CostBreakdown {
    pub fn new(staff_cost: f64, outreach_cost: f64, lab_cost: f64, intervention_cost: f64) -> Self {
        Self {
            staff_cost,
            outreach_cost,
            lab_cost,
            intervention_cost,
            total_cost: staff_cost + outreach_cost + lab_cost + intervention_cost,
        }
    }

    /// Every component scaled by `multiplier`
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self::new(
            self.staff_cost * multiplier,
            self.outreach_cost * multiplier,
            self.lab_cost * multiplier,
            self.intervention_cost * multiplier,
        )
    }
}

/// Full cost/benefit picture for one measure over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiResult {
    pub measure_id: String,
    pub measure_name: String,
    pub period: Period,
    pub total_interventions: u64,
    pub successful_closures: u64,
    /// Percent, 0-100
    pub success_rate: f64,
    pub confidence_interval: ConfidenceInterval,
    pub total_revenue: f64,
    pub revenue_ci_lower: f64,
    pub revenue_ci_upper: f64,
    pub quality_bonus: f64,
    pub star_rating: u8,
    pub cost_breakdown: CostBreakdown,
    pub total_costs: f64,
    pub total_benefit: f64,
    pub net_roi: f64,
    pub net_roi_ci_lower: f64,
    pub net_roi_ci_upper: f64,
    /// total_benefit / total_costs, 0 when there are no costs
    pub roi_ratio: f64,
    /// Months of benefit needed to cover costs, assuming the period is a quarter
    pub payback_period_months: Option<f64>,
}

impl RoiResult {
    /// Zeroed result for a measure with no data in the period
    pub fn empty(measure_id: impl Into<String>, period: Period, confidence_level: f64) -> Self {
        let measure_id = measure_id.into();
        Self {
            measure_name: measure_id.clone(),
            measure_id,
            period,
            total_interventions: 0,
            successful_closures: 0,
            success_rate: 0.0,
            confidence_interval: ConfidenceInterval::zero(confidence_level),
            total_revenue: 0.0,
            revenue_ci_lower: 0.0,
            revenue_ci_upper: 0.0,
            quality_bonus: 0.0,
            star_rating: NO_VOLUME_STAR_RATING,
            cost_breakdown: CostBreakdown::default(),
            total_costs: 0.0,
            total_benefit: 0.0,
            net_roi: 0.0,
            net_roi_ci_lower: 0.0,
            net_roi_ci_upper: 0.0,
            roi_ratio: 0.0,
            payback_period_months: None,
        }
    }

    pub fn has_volume(&self) -> bool {
        self.total_interventions > 0
    }
}

/// The three benefit definitions used for ROI reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiMethod {
    /// Direct revenue from closures only
    Conservative,
    /// Direct revenue plus admin savings and a half-star bonus proxy
    Comprehensive,
    /// Direct revenue plus a star-equivalent CMS bonus proxy
    CmsFocused,
}

impl RoiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoiMethod::Conservative => "conservative",
            RoiMethod::Comprehensive => "comprehensive",
            RoiMethod::CmsFocused => "cms_focused",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoiMethod::Conservative => "Conservative (direct cost avoidance only)",
            RoiMethod::Comprehensive => "Comprehensive (includes indirect benefits)",
            RoiMethod::CmsFocused => "CMS-Focused (Star Rating emphasis)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoiMethod::Conservative => {
                "Direct revenue from closures only. Suited to internal reporting and conservative forecasts."
            }
            RoiMethod::Comprehensive => {
                "Adds indirect benefits (admin savings, quality bonus proxy). Suited to CFO and board reporting."
            }
            RoiMethod::CmsFocused => {
                "Emphasizes Star Rating bonus impact. Suited to CMS reporting and quality leadership."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodOutcome {
    pub method: RoiMethod,
    pub total_benefit: f64,
    pub net_roi: f64,
    pub roi_ratio: f64,
}

/// Same investment scored under each [`RoiMethod`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeMethodRoi {
    pub investment: f64,
    pub expected_closures: u64,
    pub conservative: MethodOutcome,
    pub comprehensive: MethodOutcome,
    pub cms_focused: MethodOutcome,
}

impl ThreeMethodRoi {
    pub fn get(&self, method: RoiMethod) -> &MethodOutcome {
        match method {
            RoiMethod::Conservative => &self.conservative,
            RoiMethod::Comprehensive => &self.comprehensive,
            RoiMethod::CmsFocused => &self.cms_focused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    Payer,
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    #[serde(rename = "CFO")]
    Cfo,
    #[serde(rename = "CMO")]
    Cmo,
    #[serde(rename = "CIO")]
    Cio,
}

impl Audience {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CFO" => Some(Audience::Cfo),
            "CMO" => Some(Audience::Cmo),
            "CIO" => Some(Audience::Cio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingContext {
    Internal,
    Cms,
    Board,
}

impl ReportingContext {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "internal" => Some(ReportingContext::Internal),
            "cms" => Some(ReportingContext::Cms),
            "board" => Some(ReportingContext::Board),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRecommendation {
    pub recommended: RoiMethod,
    pub label: String,
    pub explanation: String,
    pub alternative: Option<RoiMethod>,
}

/// What-if override applied to a base [`RoiResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityScenario {
    pub name: String,
    /// Replacement success rate in percent
    pub success_rate: Option<f64>,
    /// Factor applied to every cost component
    pub cost_multiplier: Option<f64>,
}

impl SensitivityScenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success_rate: None,
            cost_multiplier: None,
        }
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = Some(rate);
        self
    }

    pub fn with_cost_multiplier(mut self, multiplier: f64) -> Self {
        self.cost_multiplier = Some(multiplier);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutcome {
    pub scenario_name: String,
    /// Base result with every dependent field recomputed
    pub result: RoiResult,
    /// net_roi difference against the base result
    pub change_from_base: f64,
}
