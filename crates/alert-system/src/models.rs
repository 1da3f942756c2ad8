use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    StarRatingRisk,
    Opportunity,
    Deadline,
    PerformanceAnomaly,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::StarRatingRisk => "star_rating_risk",
            AlertType::Opportunity => "opportunity",
            AlertType::Deadline => "deadline",
            AlertType::PerformanceAnomaly => "performance_anomaly",
        }
    }
}

/// Ordered most urgent first, so sorting ascending puts critical alerts on top
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Critical => "critical",
            AlertPriority::High => "high",
            AlertPriority::Medium => "medium",
            AlertPriority::Low => "low",
        }
    }

    /// 0 for critical through 3 for low
    pub fn rank(&self) -> u8 {
        match self {
            AlertPriority::Critical => 0,
            AlertPriority::High => 1,
            AlertPriority::Medium => 2,
            AlertPriority::Low => 3,
        }
    }
}

/// Index of an alert in the history arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertId(pub usize);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}", self.0)
    }
}

/// Check-specific figures carried by an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertDetails {
    StarRatingRisk {
        measure_name: String,
        current_rate: f64,
        threshold: f64,
        volume: u64,
    },
    Opportunity {
        measure_name: String,
        members_count: usize,
        potential_revenue: f64,
        predicted_success_rate: f64,
    },
    Deadline {
        measure_name: String,
        interventions_due: usize,
        members_affected: usize,
        earliest_due_date: NaiveDate,
        days_until: i64,
    },
    PerformanceAnomaly {
        current_rate: f64,
        previous_rate: f64,
        /// Relative change in percent, negative for a drop
        change_pct: f64,
        is_decrease: bool,
    },
}

/// An alert produced by a check but not yet recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub measure_id: Option<String>,
    pub details: AlertDetails,
    pub created_at: DateTime<Utc>,
    pub actionable: bool,
    /// Synthetic demonstration alert rather than a finding from data
    pub is_demo: bool,
}

/// A recorded alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub measure_id: Option<String>,
    pub details: AlertDetails,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub actionable: bool,
    pub is_demo: bool,
}

impl Alert {
    pub fn from_draft(id: AlertId, draft: AlertDraft) -> Self {
        Self {
            id,
            alert_type: draft.alert_type,
            priority: draft.priority,
            title: draft.title,
            message: draft.message,
            measure_id: draft.measure_id,
            details: draft.details,
            created_at: draft.created_at,
            read: false,
            actionable: draft.actionable,
            is_demo: draft.is_demo,
        }
    }
}

/// Criteria for [`AlertSystem::get_alerts`](crate::AlertSystem::get_alerts)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub priority: Option<AlertPriority>,
    pub unread_only: bool,
}

impl AlertFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Self::default()
        }
    }

    pub fn of_type(alert_type: AlertType) -> Self {
        Self {
            alert_type: Some(alert_type),
            ..Self::default()
        }
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.alert_type.map_or(true, |t| alert.alert_type == t)
            && self.priority.map_or(true, |p| alert.priority == p)
            && !(self.unread_only && alert.read)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: usize,
    pub unread: usize,
    pub read: usize,
    pub by_type: BTreeMap<AlertType, usize>,
    pub by_priority: BTreeMap<AlertPriority, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_orders_critical_first() {
        let mut priorities = vec![
            AlertPriority::Low,
            AlertPriority::Critical,
            AlertPriority::Medium,
            AlertPriority::High,
        ];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![
                AlertPriority::Critical,
                AlertPriority::High,
                AlertPriority::Medium,
                AlertPriority::Low
            ]
        );
        assert!(priorities.windows(2).all(|w| w[0].rank() < w[1].rank()));
    }

    #[test]
    fn test_details_serialize_tagged() {
        let details = AlertDetails::PerformanceAnomaly {
            current_rate: 45.2,
            previous_rate: 55.4,
            change_pct: -18.4,
            is_decrease: true,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "performance_anomaly");
        assert_eq!(json["is_decrease"], true);
    }

    #[test]
    fn test_stats_serialize_with_string_keys() {
        let mut stats = AlertStats::default();
        stats.by_type.insert(AlertType::Deadline, 2);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_type"]["deadline"], 2);
    }
}
