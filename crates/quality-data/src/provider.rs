use std::sync::Arc;

use quality_core::{
    DataProvider, EngineResult, InterventionAggregate, MeasureDefinition, PendingIntervention,
    Period,
};
use tracing::debug;

use crate::cache::TtlCache;

pub type AggregateCache = TtlCache<String, Vec<InterventionAggregate>>;

const PORTFOLIO_KEY: &str = "*";

/// Memoizes `get_aggregates` of an inner provider in a caller-owned cache.
///
/// Measure definitions and open interventions pass straight through. Failed
/// lookups are not cached.
pub struct CachedProvider<P> {
    inner: P,
    cache: Arc<AggregateCache>,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: Arc<AggregateCache>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<AggregateCache> {
        &self.cache
    }

    fn key(measure_id: Option<&str>, period: &Period) -> String {
        format!(
            "aggregates:{}:{}",
            measure_id.unwrap_or(PORTFOLIO_KEY),
            period.key()
        )
    }

    /// Forget cached rows for one measure and every portfolio-wide query
    pub fn invalidate_measure(&self, measure_id: &str) -> usize {
        self.cache.invalidate_prefix(&format!("aggregates:{}:", measure_id))
            + self
                .cache
                .invalidate_prefix(&format!("aggregates:{}:", PORTFOLIO_KEY))
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn get_aggregates(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<InterventionAggregate>> {
        let key = Self::key(measure_id, period);
        if let Some(rows) = self.cache.get(&key) {
            debug!("Cache hit {}", key);
            return Ok(rows);
        }

        let rows = self.inner.get_aggregates(measure_id, period)?;
        self.cache.set(key, rows.clone());
        Ok(rows)
    }

    fn get_measure_definition(&self, measure_id: &str) -> EngineResult<Option<MeasureDefinition>> {
        self.inner.get_measure_definition(measure_id)
    }

    fn get_pending_interventions(&self, period: &Period) -> EngineResult<Vec<PendingIntervention>> {
        self.inner.get_pending_interventions(period)
    }
}
