use std::collections::HashMap;

use crate::{
    DataProvider, EngineResult, InterventionAggregate, MeasureDefinition, PendingIntervention,
    Period,
};

/// Immutable snapshot answering provider queries from memory.
///
/// Used directly in tests and as the target of `quality-data` snapshot loads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    aggregates: Vec<InterventionAggregate>,
    measures: HashMap<String, MeasureDefinition>,
    pending: Vec<PendingIntervention>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aggregate(mut self, row: InterventionAggregate) -> Self {
        self.aggregates.push(row);
        self
    }

    pub fn with_aggregates<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = InterventionAggregate>,
    {
        self.aggregates.extend(rows);
        self
    }

    pub fn with_measure(mut self, measure: MeasureDefinition) -> Self {
        self.measures.insert(measure.measure_id.clone(), measure);
        self
    }

    pub fn with_pending<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = PendingIntervention>,
    {
        self.pending.extend(items);
        self
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregates.len()
    }

    /// Every known measure id, sorted
    pub fn measure_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.measures.keys().cloned().collect();
        for row in &self.aggregates {
            if !self.measures.contains_key(&row.measure_id) && !ids.contains(&row.measure_id) {
                ids.push(row.measure_id.clone());
            }
        }
        ids.sort();
        ids
    }
}

impl DataProvider for InMemoryProvider {
    fn get_aggregates(
        &self,
        measure_id: Option<&str>,
        period: &Period,
    ) -> EngineResult<Vec<InterventionAggregate>> {
        let mut rows: Vec<InterventionAggregate> = self
            .aggregates
            .iter()
            .filter(|row| measure_id.map_or(true, |id| row.measure_id == id))
            .filter(|row| period.contains(row.period))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.period.cmp(&b.period).then_with(|| a.measure_id.cmp(&b.measure_id)));
        Ok(rows)
    }

    fn get_measure_definition(&self, measure_id: &str) -> EngineResult<Option<MeasureDefinition>> {
        Ok(self.measures.get(measure_id).cloned())
    }

    fn get_pending_interventions(&self, period: &Period) -> EngineResult<Vec<PendingIntervention>> {
        Ok(self
            .pending
            .iter()
            .filter(|item| period.contains(item.due_date))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_filters_by_measure_and_period() {
        let provider = InMemoryProvider::new().with_aggregates(vec![
            InterventionAggregate::new("CBP", d(2024, 1, 10), 10, 8, 500.0, 400.0).unwrap(),
            InterventionAggregate::new("CDC", d(2024, 1, 11), 10, 5, 500.0, 250.0).unwrap(),
            InterventionAggregate::new("CBP", d(2024, 3, 1), 10, 9, 500.0, 450.0).unwrap(),
        ]);
        let january = Period::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();

        let cbp = provider.get_aggregates(Some("CBP"), &january).unwrap();
        assert_eq!(cbp.len(), 1);
        assert_eq!(cbp[0].successful_closures, 8);

        let all = provider.get_aggregates(None, &january).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_unknown_measure_is_none() {
        let provider = InMemoryProvider::new();
        assert!(provider.get_measure_definition("XYZ").unwrap().is_none());
    }

    #[test]
    fn test_measure_ids_include_aggregate_only_measures() {
        let provider = InMemoryProvider::new()
            .with_measure(MeasureDefinition::new("CDC", "Diabetes Care", 0.15, 80.0).unwrap())
            .with_aggregate(
                InterventionAggregate::new("BCS", d(2024, 1, 10), 1, 1, 0.0, 0.0).unwrap(),
            );
        assert_eq!(provider.measure_ids(), vec!["BCS".to_string(), "CDC".to_string()]);
    }
}
