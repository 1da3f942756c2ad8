use std::sync::Arc;

use crate::{EngineResult, InterventionAggregate, MeasureDefinition, PendingIntervention, Period};

/// Read-only source of aggregated intervention data.
///
/// Implementations are synchronous: async stores materialize a snapshot first
/// (see `quality-data`) and hand the engine something that answers from memory.
pub trait DataProvider: Send + Sync {
    /// Aggregated rows inside `period`, optionally restricted to one measure
    fn get_aggregates(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<InterventionAggregate>>;

    fn get_measure_definition(&self, measure_id: &str) -> EngineResult<Option<MeasureDefinition>>;

    /// Open (pending or scheduled) interventions due inside `period`
    fn get_pending_interventions(&self, period: &Period) -> EngineResult<Vec<PendingIntervention>>;
}

impl<P: DataProvider + ?Sized> DataProvider for Arc<P> {
    fn get_aggregates(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<InterventionAggregate>> {
        (**self).get_aggregates(measure_id, period)
    }

    fn get_measure_definition(&self, measure_id: &str) -> EngineResult<Option<MeasureDefinition>> {
        (**self).get_measure_definition(measure_id)
    }

    fn get_pending_interventions(&self, period: &Period) -> EngineResult<Vec<PendingIntervention>> {
        (**self).get_pending_interventions(period)
    }
}

impl<P: DataProvider + ?Sized> DataProvider for &P {
    fn get_aggregates(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<InterventionAggregate>> {
        (**self).get_aggregates(measure_id, period)
    }

    fn get_measure_definition(&self, measure_id: &str) -> EngineResult<Option<MeasureDefinition>> {
        (**self).get_measure_definition(measure_id)
    }

    fn get_pending_interventions(&self, period: &Period) -> EngineResult<Vec<PendingIntervention>> {
        (**self).get_pending_interventions(period)
    }
}
