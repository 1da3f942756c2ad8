use anyhow::{anyhow, Result};
use quality_core::{
    InMemoryProvider, InterventionAggregate, MeasureDefinition, PendingIntervention,
    PendingStatus, Period,
};
use tracing::info;

use crate::db::QualityDb;
use crate::models::*;

/// Reads and writes `member_interventions` and `hedis_measures`
pub struct InterventionStore {
    db: QualityDb,
}

impl InterventionStore {
    pub fn new(db: QualityDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &QualityDb {
        &self.db
    }

    /// Insert or replace a measure definition
    pub async fn upsert_measure(&self, measure: &MeasureDefinition) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hedis_measures (measure_id, measure_name, category, star_weight, benchmark_rate)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(measure_id) DO UPDATE SET
                measure_name = excluded.measure_name,
                category = excluded.category,
                star_weight = excluded.star_weight,
                benchmark_rate = excluded.benchmark_rate
            "#,
        )
        .bind(&measure.measure_id)
        .bind(&measure.name)
        .bind(&measure.category)
        .bind(measure.star_weight)
        .bind(measure.benchmark_rate)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn record_intervention(&self, intervention: &NewIntervention) -> Result<i64> {
        if !(intervention.cost.is_finite() && intervention.cost >= 0.0) {
            return Err(anyhow!(
                "intervention cost must be non-negative, got {}",
                intervention.cost
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO member_interventions (member_id, measure_id, intervention_date, status, cost_per_intervention)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&intervention.member_id)
        .bind(&intervention.measure_id)
        .bind(intervention.intervention_date)
        .bind(intervention.status.as_str())
        .bind(intervention.cost)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns false when no intervention has `id`
    pub async fn update_status(&self, id: i64, status: InterventionStatus) -> Result<bool> {
        let result =
            sqlx::query("UPDATE member_interventions SET status = ? WHERE intervention_id = ?")
                .bind(status.as_str())
                .bind(id)
                .execute(self.db.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_interventions(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM member_interventions")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Daily per-measure aggregates inside `period`
    pub async fn aggregates(&self, period: &Period) -> Result<Vec<InterventionAggregate>> {
        let rows = sqlx::query_as::<_, AggregateRow>(
            r#"
            SELECT
                measure_id,
                intervention_date AS period,
                COUNT(*) AS total_interventions,
                SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS successful_closures,
                CAST(COALESCE(SUM(cost_per_intervention), 0) AS REAL) AS total_cost,
                CAST(COALESCE(SUM(CASE WHEN status = 'completed' THEN cost_per_intervention ELSE 0 END), 0) AS REAL) AS completed_cost
            FROM member_interventions
            WHERE intervention_date >= ? AND intervention_date <= ?
            GROUP BY measure_id, intervention_date
            ORDER BY intervention_date, measure_id
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| -> Result<InterventionAggregate> {
                Ok(InterventionAggregate::new(
                    row.measure_id,
                    row.period,
                    u64::try_from(row.total_interventions)?,
                    u64::try_from(row.successful_closures)?,
                    row.total_cost,
                    row.completed_cost,
                )?)
            })
            .collect()
    }

    pub async fn measures(&self) -> Result<Vec<MeasureDefinition>> {
        let rows = sqlx::query_as::<_, MeasureRow>(
            "SELECT measure_id, measure_name, category, star_weight, benchmark_rate FROM hedis_measures ORDER BY measure_id",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| -> Result<MeasureDefinition> {
                let measure = MeasureDefinition::new(
                    row.measure_id,
                    row.measure_name,
                    row.star_weight,
                    row.benchmark_rate,
                )?;
                Ok(match row.category {
                    Some(category) => measure.with_category(category),
                    None => measure,
                })
            })
            .collect()
    }

    /// Open interventions due inside `period`
    pub async fn pending(&self, period: &Period) -> Result<Vec<PendingIntervention>> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT measure_id, member_id, intervention_date AS due_date, status
            FROM member_interventions
            WHERE status IN ('pending', 'scheduled')
              AND intervention_date >= ? AND intervention_date <= ?
            ORDER BY intervention_date, measure_id
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| -> Result<PendingIntervention> {
                let status = PendingStatus::parse(&row.status)
                    .ok_or_else(|| anyhow!("unexpected open status {:?}", row.status))?;
                Ok(PendingIntervention {
                    measure_id: row.measure_id,
                    member_id: row.member_id,
                    due_date: row.due_date,
                    status,
                })
            })
            .collect()
    }

    /// Everything the engine can ask about `period`, as an immutable snapshot
    pub async fn load_snapshot(&self, period: &Period) -> Result<InMemoryProvider> {
        let aggregates = self.aggregates(period).await?;
        let measures = self.measures().await?;
        let pending = self.pending(period).await?;

        info!(
            "Loaded snapshot {}: {} aggregate rows, {} measures, {} open interventions",
            period.key(),
            aggregates.len(),
            measures.len(),
            pending.len()
        );

        let provider = measures
            .into_iter()
            .fold(InMemoryProvider::new(), |p, m| p.with_measure(m));
        Ok(provider.with_aggregates(aggregates).with_pending(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quality_core::DataProvider;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn store() -> InterventionStore {
        InterventionStore::new(QualityDb::new("sqlite::memory:").await.unwrap())
    }

    async fn seed(store: &InterventionStore) {
        store
            .upsert_measure(
                &MeasureDefinition::new("CDC", "Diabetes Care", 0.15, 80.0)
                    .unwrap()
                    .with_category("Diabetes"),
            )
            .await
            .unwrap();

        let records = [
            ("M1", "CDC", d(2024, 10, 1), InterventionStatus::Completed, 50.0),
            ("M2", "CDC", d(2024, 10, 1), InterventionStatus::Completed, 40.0),
            ("M3", "CDC", d(2024, 10, 1), InterventionStatus::Cancelled, 30.0),
            ("M4", "CBP", d(2024, 10, 2), InterventionStatus::Completed, 20.0),
            ("M5", "CDC", d(2024, 11, 20), InterventionStatus::Scheduled, 25.0),
        ];
        for (member, measure, date, status, cost) in records {
            store
                .record_intervention(&NewIntervention::new(member, measure, date, status, cost))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_aggregates_group_by_measure_and_day() {
        let store = store().await;
        seed(&store).await;

        let october = Period::new(d(2024, 10, 1), d(2024, 10, 31)).unwrap();
        let rows = store.aggregates(&october).await.unwrap();

        assert_eq!(rows.len(), 2);
        let cdc = &rows[0];
        assert_eq!(cdc.measure_id, "CDC");
        assert_eq!(cdc.total_interventions, 3);
        assert_eq!(cdc.successful_closures, 2);
        assert_eq!(cdc.total_cost, 120.0);
        assert_eq!(cdc.completed_cost, 90.0);
        assert_eq!(rows[1].measure_id, "CBP");
    }

    #[tokio::test]
    async fn test_snapshot_answers_provider_queries() {
        let store = store().await;
        seed(&store).await;

        let period = Period::new(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        let snapshot = store.load_snapshot(&period).await.unwrap();

        let cdc = snapshot.get_measure_definition("CDC").unwrap().unwrap();
        assert_eq!(cdc.name, "Diabetes Care");
        assert_eq!(cdc.category.as_deref(), Some("Diabetes"));

        let pending = snapshot.get_pending_interventions(&period).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, PendingStatus::Scheduled);
        assert_eq!(pending[0].due_date, d(2024, 11, 20));

        assert_eq!(snapshot.measure_ids(), vec!["CBP".to_string(), "CDC".to_string()]);
    }

    #[tokio::test]
    async fn test_status_update_moves_intervention_out_of_pending() {
        let store = store().await;
        let id = store
            .record_intervention(&NewIntervention::new(
                "M9",
                "BCS",
                d(2024, 12, 1),
                InterventionStatus::Pending,
                10.0,
            ))
            .await
            .unwrap();
        let period = Period::new(d(2024, 12, 1), d(2024, 12, 31)).unwrap();
        assert_eq!(store.pending(&period).await.unwrap().len(), 1);

        assert!(store.update_status(id, InterventionStatus::Completed).await.unwrap());
        assert!(store.pending(&period).await.unwrap().is_empty());
        assert!(!store.update_status(id + 100, InterventionStatus::Completed).await.unwrap());
        assert_eq!(store.count_interventions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_negative_cost_rejected() {
        let store = store().await;
        let result = store
            .record_intervention(&NewIntervention::new(
                "M1",
                "CDC",
                d(2024, 10, 1),
                InterventionStatus::Completed,
                -5.0,
            ))
            .await;
        assert!(result.is_err());
    }
}
