use serde::{Deserialize, Serialize};

/// An intervention available for funding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionCandidate {
    pub id: String,
    /// e.g. "Member Outreach Campaign"
    pub intervention_type: String,
    pub target_measure: String,
    /// Expected rate improvement in percent (8.0 = 8%)
    pub expected_gap_closure: f64,
    pub cost: f64,
    pub member_count: u64,
    /// Explicit star weight; otherwise resolved from the measure
    #[serde(default)]
    pub star_weight: Option<f64>,
}

impl InterventionCandidate {
    pub fn new(
        id: impl Into<String>,
        intervention_type: impl Into<String>,
        target_measure: impl Into<String>,
        expected_gap_closure: f64,
        cost: f64,
        member_count: u64,
    ) -> Self {
        Self {
            id: id.into(),
            intervention_type: intervention_type.into(),
            target_measure: target_measure.into(),
            expected_gap_closure,
            cost,
            member_count,
            star_weight: None,
        }
    }

    pub fn with_star_weight(mut self, weight: f64) -> Self {
        self.star_weight = Some(weight);
        self
    }
}

/// Financial scoring of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionRoi {
    pub id: String,
    pub intervention_type: String,
    pub target_measure: String,
    pub expected_gap_closure: f64,
    pub cost: f64,
    pub member_count: u64,
    pub star_weight: f64,
    pub estimated_closures: u64,
    pub cost_per_closure: f64,
    pub revenue_from_closures: f64,
    pub star_rating_bonus: f64,
    /// Revenue plus star bonus
    pub financial_impact: f64,
    pub net_roi: f64,
    pub roi_ratio: f64,
    /// 50-95 for scoreable candidates, 0 when cost or membership is missing
    pub confidence_score: f64,
}

impl InterventionRoi {
    /// Whether the candidate can be funded at all
    pub fn is_fundable(&self) -> bool {
        self.cost > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioStrategy {
    MaxStar,
    MaxRoi,
    Balanced,
}

impl PortfolioStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioStrategy::MaxStar => "max_star",
            PortfolioStrategy::MaxRoi => "max_roi",
            PortfolioStrategy::Balanced => "balanced",
        }
    }
}

/// Interventions chosen under one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub strategy: PortfolioStrategy,
    pub selected_interventions: Vec<InterventionRoi>,
    pub total_cost: f64,
    pub total_financial_impact: f64,
    pub total_star_bonus: f64,
    pub net_benefit: f64,
    pub count: usize,
}

impl PortfolioAllocation {
    pub fn from_selection(strategy: PortfolioStrategy, selected: Vec<InterventionRoi>) -> Self {
        let total_cost: f64 = selected.iter().map(|s| s.cost).sum();
        let total_financial_impact: f64 = selected.iter().map(|s| s.financial_impact).sum();
        let total_star_bonus: f64 = selected.iter().map(|s| s.star_rating_bonus).sum();
        Self {
            strategy,
            count: selected.len(),
            selected_interventions: selected,
            total_cost,
            total_financial_impact,
            total_star_bonus,
            net_benefit: total_financial_impact - total_cost,
        }
    }

    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected_interventions.iter().map(|s| s.id.as_str()).collect()
    }
}

/// All three strategies over the same budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPlan {
    pub budget: f64,
    #[serde(rename = "approach_1_max_star")]
    pub max_star: PortfolioAllocation,
    #[serde(rename = "approach_2_max_roi")]
    pub max_roi: PortfolioAllocation,
    #[serde(rename = "approach_3_balanced")]
    pub balanced: PortfolioAllocation,
}

impl PortfolioPlan {
    pub fn allocation(&self, strategy: PortfolioStrategy) -> &PortfolioAllocation {
        match strategy {
            PortfolioStrategy::MaxStar => &self.max_star,
            PortfolioStrategy::MaxRoi => &self.max_roi,
            PortfolioStrategy::Balanced => &self.balanced,
        }
    }
}
