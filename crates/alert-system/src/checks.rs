//! The four alert checks.
//!
//! Each check reads the provider once or twice, applies its threshold rules
//! and returns unrecorded drafts. Enable toggles are applied by the caller.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use quality_core::format::whole_dollars;
use quality_core::{
    AggregateTotals, AlertConfig, DataProvider, EngineResult, InterventionAggregate,
    PendingIntervention, Period,
};

use crate::models::*;

fn measure_name<P: DataProvider + ?Sized>(provider: &P, measure_id: &str) -> EngineResult<String> {
    Ok(provider
        .get_measure_definition(measure_id)?
        .map(|m| m.name)
        .unwrap_or_else(|| measure_id.to_string()))
}

fn draft(
    alert_type: AlertType,
    priority: AlertPriority,
    title: String,
    message: String,
    measure_id: Option<String>,
    details: AlertDetails,
    now: DateTime<Utc>,
) -> AlertDraft {
    AlertDraft {
        alert_type,
        priority,
        title,
        message,
        measure_id,
        details,
        created_at: now,
        actionable: true,
        is_demo: false,
    }
}

/// High below 90% of the star threshold, medium otherwise
pub fn star_risk_priority(rate: f64, threshold: f64) -> AlertPriority {
    if rate < threshold * 0.9 {
        AlertPriority::High
    } else {
        AlertPriority::Medium
    }
}

/// Measures with enough volume whose closure rate is under the star threshold
pub fn check_star_rating_risks<P: DataProvider + ?Sized>(
    provider: &P,
    config: &AlertConfig,
    period: &Period,
    now: DateTime<Utc>,
) -> EngineResult<Vec<AlertDraft>> {
    let rows = provider.get_aggregates(None, period)?;
    let mut by_measure: BTreeMap<&str, Vec<&InterventionAggregate>> = BTreeMap::new();
    for row in &rows {
        by_measure.entry(row.measure_id.as_str()).or_default().push(row);
    }

    let threshold = config.star_rating_threshold;
    let mut alerts = Vec::new();
    for (measure_id, group) in by_measure {
        let totals = AggregateTotals::from_rows(group);
        let rate = totals.success_rate();
        if totals.total_interventions < config.min_volume || rate >= threshold {
            continue;
        }

        let name = measure_name(provider, measure_id)?;
        alerts.push(draft(
            AlertType::StarRatingRisk,
            star_risk_priority(rate, threshold),
            format!("{} Trending Below Threshold", name),
            format!(
                "{} shows {:.1}% success rate, below {}% threshold. Risk to Star Rating.",
                name, rate, threshold
            ),
            Some(measure_id.to_string()),
            AlertDetails::StarRatingRisk {
                measure_name: name,
                current_rate: rate,
                threshold,
                volume: totals.total_interventions,
            },
            now,
        ));
    }
    Ok(alerts)
}

struct OpenWork<'a> {
    count: usize,
    members: HashSet<&'a str>,
    earliest_due: NaiveDate,
}

fn group_open_work(items: &[PendingIntervention]) -> BTreeMap<&str, OpenWork<'_>> {
    let mut groups: BTreeMap<&str, OpenWork<'_>> = BTreeMap::new();
    for item in items {
        let group = groups
            .entry(item.measure_id.as_str())
            .or_insert_with(|| OpenWork {
                count: 0,
                members: HashSet::new(),
                earliest_due: item.due_date,
            });
        group.count += 1;
        group.members.insert(item.member_id.as_str());
        group.earliest_due = group.earliest_due.min(item.due_date);
    }
    groups
}

/// Measures whose open interventions in `window` are worth pursuing.
///
/// Potential revenue is the open intervention count times
/// `revenue_per_closure`; the predicted success rate is the measure's closure
/// rate over the same window. Only the largest opportunities are kept.
pub fn check_opportunities<P: DataProvider + ?Sized>(
    provider: &P,
    config: &AlertConfig,
    window: &Period,
    revenue_per_closure: f64,
    now: DateTime<Utc>,
) -> EngineResult<Vec<AlertDraft>> {
    let pending = provider.get_pending_interventions(window)?;
    let groups = group_open_work(&pending);

    let mut candidates: Vec<(&str, usize, f64)> = groups
        .iter()
        .map(|(measure_id, work)| {
            (*measure_id, work.members.len(), work.count as f64 * revenue_per_closure)
        })
        .filter(|(_, _, potential)| *potential >= config.opportunity_value_threshold)
        .collect();
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
    candidates.truncate(config.max_opportunities);

    let mut alerts = Vec::with_capacity(candidates.len());
    for (measure_id, members_count, potential_revenue) in candidates {
        let name = measure_name(provider, measure_id)?;
        let history = provider.get_aggregates(Some(measure_id), window)?;
        let predicted_success_rate = AggregateTotals::from_rows(&history).success_rate();
        let priority = if potential_revenue >= config.opportunity_high_value {
            AlertPriority::High
        } else {
            AlertPriority::Medium
        };

        alerts.push(draft(
            AlertType::Opportunity,
            priority,
            "New High-Value Members Identified".to_string(),
            format!(
                "{}: {} members with {} potential revenue ({:.1}% predicted success rate)",
                name,
                members_count,
                whole_dollars(potential_revenue),
                predicted_success_rate
            ),
            Some(measure_id.to_string()),
            AlertDetails::Opportunity {
                measure_name: name,
                members_count,
                potential_revenue,
                predicted_success_rate,
            },
            now,
        ));
    }
    Ok(alerts)
}

/// Open interventions due within `days_ahead` days, per measure.
///
/// Critical when the earliest due date is a week or less away, high within
/// two weeks, medium otherwise. Largest backlogs first.
pub fn check_deadlines<P: DataProvider + ?Sized>(
    provider: &P,
    config: &AlertConfig,
    days_ahead: i64,
    now: DateTime<Utc>,
) -> EngineResult<Vec<AlertDraft>> {
    let today = now.date_naive();
    let pending = provider.get_pending_interventions(&Period::next_days(today, days_ahead))?;
    let groups = group_open_work(&pending);

    let mut due: Vec<(&str, &OpenWork<'_>)> = groups
        .iter()
        .filter(|(_, work)| work.count >= config.deadline_min_count)
        .map(|(id, work)| (*id, work))
        .collect();
    due.sort_by(|a, b| b.1.count.cmp(&a.1.count));

    let mut alerts = Vec::with_capacity(due.len());
    for (measure_id, work) in due {
        let name = measure_name(provider, measure_id)?;
        let days_until = (work.earliest_due - today).num_days();
        let priority = if days_until <= config.deadline_critical_days {
            AlertPriority::Critical
        } else if days_until <= config.deadline_high_days {
            AlertPriority::High
        } else {
            AlertPriority::Medium
        };

        alerts.push(draft(
            AlertType::Deadline,
            priority,
            format!("{} {} Interventions Due Within {} Days", work.count, name, days_ahead),
            format!(
                "{} interventions affecting {} members. Earliest due: {}. {} days remaining.",
                work.count,
                work.members.len(),
                work.earliest_due,
                days_until
            ),
            Some(measure_id.to_string()),
            AlertDetails::Deadline {
                measure_name: name,
                interventions_due: work.count,
                members_affected: work.members.len(),
                earliest_due_date: work.earliest_due,
                days_until,
            },
            now,
        ));
    }
    Ok(alerts)
}

/// Portfolio closure-rate swing between `current` and the window before it.
///
/// Needs volume in both windows. High priority for a drop, medium for a rise.
pub fn check_performance_anomalies<P: DataProvider + ?Sized>(
    provider: &P,
    config: &AlertConfig,
    current: &Period,
    now: DateTime<Utc>,
) -> EngineResult<Vec<AlertDraft>> {
    let current_totals = AggregateTotals::from_rows(&provider.get_aggregates(None, current)?);
    let previous_totals =
        AggregateTotals::from_rows(&provider.get_aggregates(None, &current.preceding())?);

    let current_rate = current_totals.success_rate();
    let previous_rate = previous_totals.success_rate();
    if current_totals.is_empty() || previous_rate <= 0.0 {
        return Ok(Vec::new());
    }

    let change = (current_rate - previous_rate) / previous_rate;
    if change.abs() < config.anomaly_threshold {
        return Ok(Vec::new());
    }

    let is_decrease = change < 0.0;
    let magnitude = change.abs() * 100.0;
    Ok(vec![draft(
        AlertType::PerformanceAnomaly,
        if is_decrease {
            AlertPriority::High
        } else {
            AlertPriority::Medium
        },
        format!(
            "Closure Rate {} {:.1}%",
            if is_decrease { "Dropped" } else { "Increased" },
            magnitude
        ),
        format!(
            "Overall closure rate changed from {:.1}% to {:.1}% ({} of {:.1}%)",
            previous_rate,
            current_rate,
            if is_decrease { "decrease" } else { "increase" },
            magnitude
        ),
        None,
        AlertDetails::PerformanceAnomaly {
            current_rate,
            previous_rate,
            change_pct: change * 100.0,
            is_decrease,
        },
        now,
    )])
}
