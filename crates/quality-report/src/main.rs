//! quality-report: run the HEDIS decision-support engine over an intervention
//! database and print the results.
//!
//! Usage:
//!   cargo run -p quality-report -- --db sqlite:hedis.db
//!   cargo run -p quality-report -- --as-of 2024-12-31 --measure CDC
//!   cargo run -p quality-report -- --budget 150000 --fte 3 --strategy high_roi
//!   cargo run -p quality-report -- --cfo-report

use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use quality_core::EngineConfig;
use quality_data::{AggregateCache, CachedProvider, InterventionStore, QualityDb};
use quality_report::{build_cfo_report, build_report, ReportOptions};
use scenario_modeler::{Objective, Strategy};

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_options(args: &[String]) -> anyhow::Result<ReportOptions> {
    let as_of = match arg_value(args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of expects YYYY-MM-DD, got {:?}", raw))?,
        None => Utc::now().date_naive(),
    };

    let mut options = ReportOptions::new(as_of);
    options.measure_id = arg_value(args, "--measure").map(str::to_string);

    if let Some(raw) = arg_value(args, "--budget") {
        options.budget = raw
            .parse()
            .with_context(|| format!("--budget expects a number, got {:?}", raw))?;
    }
    if let Some(raw) = arg_value(args, "--fte") {
        options.fte_count = raw
            .parse()
            .with_context(|| format!("--fte expects a whole number, got {:?}", raw))?;
    }
    if let Some(raw) = arg_value(args, "--period-days") {
        options.period_days = raw
            .parse()
            .with_context(|| format!("--period-days expects a whole number, got {:?}", raw))?;
    }
    if let Some(raw) = arg_value(args, "--strategy") {
        options.strategy = Strategy::parse(raw).ok_or_else(|| {
            anyhow!("unknown strategy {:?} (balanced, high_roi, high_volume)", raw)
        })?;
    }
    if let Some(raw) = arg_value(args, "--objective") {
        options.objective = Objective::parse(raw).ok_or_else(|| {
            anyhow!("unknown objective {:?} (max_roi, max_closures, max_net_benefit)", raw)
        })?;
    }

    Ok(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quality_report=info,alert_system=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cfo_report = args.iter().any(|a| a == "--cfo-report");
    let pretty = args.iter().any(|a| a == "--pretty");
    let options = parse_options(&args)?;

    let database_url = arg_value(&args, "--db")
        .map(str::to_string)
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:hedis.db".to_string());
    if !QualityDb::exists(&database_url) {
        tracing::warn!("{} does not exist yet, starting from an empty database", database_url);
    }

    let config = EngineConfig::from_env()?;
    let store = InterventionStore::new(QualityDb::new(&database_url).await?);
    let snapshot = store.load_snapshot(&options.snapshot_period()).await?;
    let provider = CachedProvider::new(snapshot, Arc::new(AggregateCache::default()));

    if cfo_report {
        println!("{}", build_cfo_report(&provider, &config, &options)?);
        return Ok(());
    }

    let report = build_report(&provider, &config, &options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}
