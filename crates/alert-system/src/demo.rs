use chrono::{DateTime, Duration, Utc};

use crate::checks::star_risk_priority;
use crate::models::*;

fn demo(
    alert_type: AlertType,
    priority: AlertPriority,
    measure_id: &str,
    title: &str,
    message: String,
    details: AlertDetails,
    now: DateTime<Utc>,
) -> AlertDraft {
    AlertDraft {
        alert_type,
        priority,
        title: title.to_string(),
        message,
        measure_id: Some(measure_id.to_string()),
        details,
        created_at: now,
        actionable: true,
        is_demo: true,
    }
}

/// Fixed demonstration set, one alert of each kind plus a second opportunity.
///
/// Every draft carries `is_demo = true`.
pub fn demo_alerts(now: DateTime<Utc>) -> Vec<AlertDraft> {
    let deadline_days = 12;
    let earliest_due = (now + Duration::days(deadline_days)).date_naive();
    let (cbp_rate, cbp_threshold) = (78.5, 85.0);

    vec![
        demo(
            AlertType::StarRatingRisk,
            star_risk_priority(cbp_rate, cbp_threshold),
            "CBP",
            "Blood Pressure Control Trending Below Threshold",
            "Blood Pressure Control shows 78.5% success rate, below 85% threshold. Risk to Star Rating."
                .to_string(),
            AlertDetails::StarRatingRisk {
                measure_name: "Blood Pressure Control".to_string(),
                current_rate: cbp_rate,
                threshold: cbp_threshold,
                volume: 0,
            },
            now,
        ),
        demo(
            AlertType::Opportunity,
            AlertPriority::High,
            "CDC",
            "New High-Value Members Identified",
            "HbA1c Testing: 847 members with $285,000 potential revenue (93.2% predicted success rate)"
                .to_string(),
            AlertDetails::Opportunity {
                measure_name: "HbA1c Testing".to_string(),
                members_count: 847,
                potential_revenue: 285_000.0,
                predicted_success_rate: 93.2,
            },
            now,
        ),
        demo(
            AlertType::Deadline,
            AlertPriority::High,
            "COL",
            "156 Colorectal Cancer Screening Tests Due Within 30 Days",
            format!(
                "156 interventions affecting 142 members. Earliest due: {}. {} days remaining.",
                earliest_due, deadline_days
            ),
            AlertDetails::Deadline {
                measure_name: "Colorectal Cancer Screening".to_string(),
                interventions_due: 156,
                members_affected: 142,
                earliest_due_date: earliest_due,
                days_until: deadline_days,
            },
            now,
        ),
        demo(
            AlertType::PerformanceAnomaly,
            AlertPriority::Medium,
            "BCS",
            "Breast Cancer Screening Performance Drop Detected",
            "Breast Cancer Screening shows 18.5% decrease in success rate compared to previous period (45.2% vs 55.4%)."
                .to_string(),
            AlertDetails::PerformanceAnomaly {
                current_rate: 45.2,
                previous_rate: 55.4,
                change_pct: -18.5,
                is_decrease: true,
            },
            now,
        ),
        demo(
            AlertType::Opportunity,
            AlertPriority::Medium,
            "EED",
            "Diabetes Eye Exam Opportunity",
            "Diabetes Eye Exam: 234 members with $125,000 potential revenue (87.5% predicted success rate)"
                .to_string(),
            AlertDetails::Opportunity {
                measure_name: "Diabetes Eye Exam".to_string(),
                members_count: 234,
                potential_revenue: 125_000.0,
                predicted_success_rate: 87.5,
            },
            now,
        ),
    ]
}
