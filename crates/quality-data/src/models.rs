use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionStatus {
    Completed,
    Pending,
    Scheduled,
    Cancelled,
}

impl InterventionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionStatus::Completed => "completed",
            InterventionStatus::Pending => "pending",
            InterventionStatus::Scheduled => "scheduled",
            InterventionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(InterventionStatus::Completed),
            "pending" => Some(InterventionStatus::Pending),
            "scheduled" => Some(InterventionStatus::Scheduled),
            "cancelled" | "canceled" => Some(InterventionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Input for recording an intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIntervention {
    pub member_id: String,
    pub measure_id: String,
    /// Completion date, or the due date while open
    pub intervention_date: NaiveDate,
    pub status: InterventionStatus,
    pub cost: f64,
}

impl NewIntervention {
    pub fn new(
        member_id: impl Into<String>,
        measure_id: impl Into<String>,
        intervention_date: NaiveDate,
        status: InterventionStatus,
        cost: f64,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            measure_id: measure_id.into(),
            intervention_date,
            status,
            cost,
        }
    }
}

/// Per measure, per day totals
#[derive(Debug, FromRow)]
pub(crate) struct AggregateRow {
    pub measure_id: String,
    pub period: NaiveDate,
    pub total_interventions: i64,
    pub successful_closures: i64,
    pub total_cost: f64,
    pub completed_cost: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct MeasureRow {
    pub measure_id: String,
    pub measure_name: String,
    pub category: Option<String>,
    pub star_weight: f64,
    pub benchmark_rate: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct PendingRow {
    pub measure_id: String,
    pub member_id: String,
    pub due_date: NaiveDate,
    pub status: String,
}
