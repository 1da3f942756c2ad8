use chrono::NaiveDate;
use quality_core::{
    add_months, EngineConfig, InMemoryProvider, InterventionAggregate, MeasureDefinition,
    PendingIntervention, PendingStatus,
};
use quality_report::{build_cfo_report, build_report, ReportOptions};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Twelve months of CDC and CBP history plus open CDC work due soon
fn provider() -> InMemoryProvider {
    let mut rows = Vec::new();
    for i in 0..12 {
        let month = add_months(d(2024, 1, 1), i);
        let i = i as u64;
        rows.push(
            InterventionAggregate::new("CDC", month, 40 + i, 30 + i, 4_000.0, 3_000.0).unwrap(),
        );
        rows.push(InterventionAggregate::new("CBP", month, 20, 12, 1_500.0, 900.0).unwrap());
    }
    let pending = (0..20).map(|n| PendingIntervention {
        measure_id: "CDC".to_string(),
        member_id: format!("M{}", n),
        due_date: d(2025, 1, 5),
        status: PendingStatus::Pending,
    });

    InMemoryProvider::new()
        .with_aggregates(rows)
        .with_measure(MeasureDefinition::new("CDC", "Diabetes Care", 0.15, 80.0).unwrap())
        .with_measure(MeasureDefinition::new("CBP", "Blood Pressure Control", 0.12, 75.0).unwrap())
        .with_pending(pending)
}

fn options() -> ReportOptions {
    ReportOptions::new(d(2024, 12, 31))
}

#[test]
fn test_report_covers_active_measures() {
    let report = build_report(&provider(), &EngineConfig::default(), &options()).unwrap();

    let ids: Vec<&str> = report.measure_roi.iter().map(|r| r.measure_id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"CDC") && ids.contains(&"CBP"));
    assert_eq!(report.measure_status.len(), 2);
    assert_eq!(report.forecast.len(), 3);
    assert!(report.portfolio_summary.total_closures > 0);
}

#[test]
fn test_allocations_stay_within_budget() {
    let mut opts = options();
    opts.budget = 50_000.0;
    let report = build_report(&provider(), &EngineConfig::default(), &opts).unwrap();

    let plan = &report.intervention_portfolio;
    for allocation in [&plan.max_star, &plan.max_roi, &plan.balanced] {
        assert!(allocation.total_cost <= opts.budget + 1e-6);
    }
}

#[test]
fn test_alerts_sorted_most_urgent_first() {
    let report = build_report(&provider(), &EngineConfig::default(), &options()).unwrap();

    assert_eq!(report.alert_stats.total, report.alerts.len());
    assert!(report
        .alerts
        .windows(2)
        .all(|w| (w[0].priority, w[0].created_at) <= (w[1].priority, w[1].created_at)));
    assert!(report.alerts.iter().all(|a| !a.is_demo));
}

#[test]
fn test_frontier_is_non_dominated() {
    let report = build_report(&provider(), &EngineConfig::default(), &options()).unwrap();

    let frontier = &report.pareto_frontier;
    assert!(!frontier.is_empty());
    for a in frontier {
        let dominated = frontier.iter().any(|b| {
            b.roi_ratio >= a.roi_ratio
                && b.predicted_closures >= a.predicted_closures
                && (b.roi_ratio > a.roi_ratio || b.predicted_closures > a.predicted_closures)
        });
        assert!(!dominated);
    }
}

#[test]
fn test_single_measure_report() {
    let mut opts = options();
    opts.measure_id = Some("CBP".to_string());
    let report = build_report(&provider(), &EngineConfig::default(), &opts).unwrap();

    assert_eq!(report.measure_roi.len(), 1);
    assert_eq!(report.measure_status.len(), 1);
    assert_eq!(report.measure_status[0].measure_id, "CBP");
    assert!(report
        .forecast
        .iter()
        .all(|f| f.measure_id.as_deref() == Some("CBP")));
}

#[test]
fn test_empty_provider_still_reports() {
    let report =
        build_report(&InMemoryProvider::new(), &EngineConfig::default(), &options()).unwrap();

    assert!(report.measure_roi.is_empty());
    assert!(report.forecast.is_empty());
    assert!(!report.seasonality.has_seasonality);
    assert!(report.alerts.is_empty());
}

#[test]
fn test_cfo_report_names_measures() {
    let text = build_cfo_report(&provider(), &EngineConfig::default(), &options()).unwrap();
    assert!(text.contains("Diabetes Care"));
    assert!(text.contains("Blood Pressure Control"));
}

#[test]
fn test_report_serializes() {
    let report = build_report(&provider(), &EngineConfig::default(), &options()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["as_of"], "2024-12-31");
    assert!(json["intervention_portfolio"]["approach_2_max_roi"].is_object());
}

#[test]
fn test_snapshot_period_spans_history_and_lookahead() {
    let period = options().snapshot_period();
    assert_eq!(period.end, d(2025, 3, 1));
    assert!(period.contains(d(2023, 1, 1)));
}

#[tokio::test]
async fn test_report_over_sqlite_snapshot() {
    use quality_data::{InterventionStatus, InterventionStore, NewIntervention, QualityDb};

    let store = InterventionStore::new(QualityDb::new("sqlite::memory:").await.unwrap());
    store
        .upsert_measure(&MeasureDefinition::new("CDC", "Diabetes Care", 0.15, 80.0).unwrap())
        .await
        .unwrap();
    for n in 0..30 {
        let status = if n % 3 == 0 {
            InterventionStatus::Cancelled
        } else {
            InterventionStatus::Completed
        };
        let date = add_months(d(2024, 7, 1), n % 6);
        let member = format!("M{}", n);
        store
            .record_intervention(&NewIntervention::new(member, "CDC", date, status, 60.0))
            .await
            .unwrap();
    }

    let opts = options();
    let snapshot = store.load_snapshot(&opts.snapshot_period()).await.unwrap();
    let report = build_report(&snapshot, &EngineConfig::default(), &opts).unwrap();

    assert_eq!(report.measure_status.len(), 1);
    assert_eq!(report.measure_status[0].measure_name, "Diabetes Care");
    assert_eq!(report.forecast.len(), 3);
}
