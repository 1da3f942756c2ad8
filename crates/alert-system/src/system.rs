use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use quality_core::{AlertConfig, DataProvider, EngineResult, Period, RoiAssumptions};
use tracing::{debug, info, warn};

use crate::checks;
use crate::demo::demo_alerts;
use crate::history::AlertHistory;
use crate::models::*;

/// Runs the alert checks and owns the alert history.
///
/// Config and history sit behind their own mutexes so one instance can be
/// shared across callers. Provider reads happen without either lock held.
pub struct AlertSystem<P> {
    provider: P,
    config: Mutex<AlertConfig>,
    revenue_per_closure: f64,
    history: Mutex<AlertHistory>,
}

impl<P: DataProvider> AlertSystem<P> {
    pub fn new(
        provider: P,
        config: AlertConfig,
        assumptions: &RoiAssumptions,
    ) -> EngineResult<Self> {
        config.validate()?;
        assumptions.validate()?;
        Ok(Self {
            provider,
            config: Mutex::new(config),
            revenue_per_closure: assumptions.revenue_per_closure,
            history: Mutex::new(AlertHistory::new()),
        })
    }

    pub fn with_defaults(provider: P) -> EngineResult<Self> {
        Self::new(provider, AlertConfig::default(), &RoiAssumptions::default())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> AlertConfig {
        lock(&self.config).clone()
    }

    /// Replace the configuration. An invalid config leaves the old one in place.
    pub fn update_config(&self, config: AlertConfig) -> EngineResult<()> {
        config.validate()?;
        *lock(&self.config) = config;
        info!("Alert configuration updated");
        Ok(())
    }

    /// Star rating risk over `period`, or the configured lookback ending today
    pub fn check_star_rating_risks(
        &self,
        period: Option<&Period>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AlertDraft>> {
        let config = self.config();
        let period = period
            .copied()
            .unwrap_or_else(|| Period::last_days(now.date_naive(), config.star_lookback_days));
        checks::check_star_rating_risks(&self.provider, &config, &period, now)
    }

    /// Opportunities in `window`, or the configured number of days either side of today
    pub fn check_opportunities(
        &self,
        window: Option<&Period>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AlertDraft>> {
        let config = self.config();
        let window = window.copied().unwrap_or_else(|| {
            let today = now.date_naive();
            let days = Duration::days(config.opportunity_window_days.max(0));
            Period {
                start: today - days,
                end: today + days,
            }
        });
        checks::check_opportunities(
            &self.provider,
            &config,
            &window,
            self.revenue_per_closure,
            now,
        )
    }

    pub fn check_deadlines(&self, now: DateTime<Utc>) -> EngineResult<Vec<AlertDraft>> {
        let config = self.config();
        checks::check_deadlines(&self.provider, &config, config.deadline_days_ahead, now)
    }

    /// Compares `current` (default: the anomaly window ending today) with
    /// the equal-length window before it
    pub fn check_performance_anomalies(
        &self,
        current: Option<&Period>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AlertDraft>> {
        let config = self.config();
        let current = current
            .copied()
            .unwrap_or_else(|| Period::last_days(now.date_naive(), config.anomaly_window_days));
        checks::check_performance_anomalies(&self.provider, &config, &current, now)
    }

    pub fn generate_all_alerts(&self) -> EngineResult<Vec<Alert>> {
        self.generate_all_alerts_at(Utc::now(), None)
    }

    /// Run every enabled check as of `now` and record the results.
    ///
    /// `period` overrides the default windows of the star rating, opportunity
    /// and anomaly checks. Returned alerts are ordered by priority, then
    /// creation time.
    pub fn generate_all_alerts_at(
        &self,
        now: DateTime<Utc>,
        period: Option<&Period>,
    ) -> EngineResult<Vec<Alert>> {
        let config = self.config();
        let mut drafts = Vec::new();

        if config.enabled.star_rating_risk {
            let found = self.check_star_rating_risks(period, now)?;
            debug!("star rating check: {} alerts", found.len());
            drafts.extend(found);
        }
        if config.enabled.opportunity {
            let found = self.check_opportunities(period, now)?;
            debug!("opportunity check: {} alerts", found.len());
            drafts.extend(found);
        }
        if config.enabled.deadline {
            let found = self.check_deadlines(now)?;
            debug!("deadline check: {} alerts", found.len());
            drafts.extend(found);
        }
        if config.enabled.performance_anomaly {
            let found = self.check_performance_anomalies(period, now)?;
            debug!("performance anomaly check: {} alerts", found.len());
            drafts.extend(found);
        }

        if drafts.is_empty() && config.demo_fallback {
            warn!("No alerts from data, substituting demonstration alerts");
            drafts = demo_alerts(now);
        }

        drafts.sort_by_key(|d| (d.priority.rank(), d.created_at));

        let mut history = lock(&self.history);
        let alerts: Vec<Alert> = drafts.into_iter().map(|d| history.push(d)).collect();
        info!("Generated {} alerts", alerts.len());
        Ok(alerts)
    }

    /// Recorded alerts matching `filter`, most urgent first
    pub fn get_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = lock(&self.history)
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| (a.priority.rank(), a.created_at));
        alerts
    }

    pub fn mark_as_read(&self, id: AlertId) -> EngineResult<()> {
        lock(&self.history).mark_read(id)
    }

    pub fn mark_all_as_read(&self) -> usize {
        lock(&self.history).mark_all_read()
    }

    pub fn delete_alert(&self, id: AlertId) -> EngineResult<Alert> {
        let removed = lock(&self.history).remove(id)?;
        debug!("Deleted {}", id);
        Ok(removed)
    }

    pub fn get_alert_stats(&self) -> AlertStats {
        lock(&self.history).stats()
    }
}

// Every mutation under these locks is a single step, so poisoned data is still consistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
