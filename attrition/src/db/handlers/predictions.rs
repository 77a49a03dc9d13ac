//! Database repository for persisted predictions.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::predictions::{PredictionCreateDBRequest, PredictionDBResponse, PredictionUpdateDBRequest},
};
use crate::types::PredictionId;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

/// Filter for listing predictions, newest first
#[derive(Debug, Clone)]
pub struct PredictionFilter {
    pub skip: i64,
    pub limit: i64,
}

impl PredictionFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Predictions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Predictions<'c> {
    type CreateRequest = PredictionCreateDBRequest;
    type UpdateRequest = PredictionUpdateDBRequest;
    type Response = PredictionDBResponse;
    type Id = PredictionId;
    type Filter = PredictionFilter;

    #[instrument(skip(self, request), fields(employee_id = ?request.employee_id, risk_level = %request.risk_level), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let prediction = sqlx::query_as::<_, PredictionDBResponse>(
            r#"
            INSERT INTO predictions (employee_id, model_version, prediction, probability, risk_level, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.model_version)
        .bind(&request.prediction)
        .bind(request.probability)
        .bind(request.risk_level)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(prediction)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let prediction = sqlx::query_as::<_, PredictionDBResponse>("SELECT * FROM predictions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(prediction)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let predictions =
            sqlx::query_as::<_, PredictionDBResponse>("SELECT * FROM predictions ORDER BY id DESC LIMIT ? OFFSET ?")
                .bind(filter.limit)
                .bind(filter.skip)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(predictions)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM predictions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the feedback outright, so `None` clears it.
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let prediction =
            sqlx::query_as::<_, PredictionDBResponse>("UPDATE predictions SET feedback = ? WHERE id = ? RETURNING *")
                .bind(&request.feedback)
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?
                .ok_or(DbError::NotFound)?;

        Ok(prediction)
    }
}

impl<'c> Predictions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Persist several predictions, e.g. the scored rows of one batch upload.
    #[instrument(skip(self, requests), fields(count = requests.len()), err)]
    pub async fn create_many(&mut self, requests: &[PredictionCreateDBRequest]) -> Result<Vec<PredictionDBResponse>> {
        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(self.create(request).await?);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{RiskLevel, Scored};
    use sqlx::SqlitePool;

    fn scored(probability: f64) -> Scored {
        let risk_level = RiskLevel::from_probability(probability);
        Scored {
            label: u8::from(probability >= 0.5),
            probability,
            risk_level,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_prediction(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Predictions::new(&mut conn);

        let request = PredictionCreateDBRequest::from_scored(Some(7), "xgb-v1", &scored(0.82));
        let created = repo.create(&request).await.unwrap();

        assert_eq!(created.employee_id, Some(7));
        assert_eq!(created.prediction, "Yes");
        assert_eq!(created.risk_level, RiskLevel::High);
        assert_eq!(created.model_version, "xgb-v1");
        assert!(created.feedback.is_none());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.probability, 0.82);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_employee_reference_is_not_enforced(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Predictions::new(&mut conn);

        let created = repo
            .create(&PredictionCreateDBRequest::from_scored(Some(424242), "xgb-v1", &scored(0.1)))
            .await
            .unwrap();
        assert_eq!(created.employee_id, Some(424242));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_is_newest_first(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Predictions::new(&mut conn);
        let requests: Vec<_> = [0.1, 0.5, 0.9]
            .into_iter()
            .map(|p| PredictionCreateDBRequest::from_scored(None, "xgb-v1", &scored(p)))
            .collect();
        repo.create_many(&requests).await.unwrap();

        let rows = repo.list(&PredictionFilter::new(0, 10)).await.unwrap();
        let probabilities: Vec<f64> = rows.iter().map(|r| r.probability).collect();
        assert_eq!(probabilities, vec![0.9, 0.5, 0.1]);

        let page = repo.list(&PredictionFilter::new(1, 1)).await.unwrap();
        assert_eq!(page[0].probability, 0.5);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_feedback_set_and_clear(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Predictions::new(&mut conn);
        let created = repo
            .create(&PredictionCreateDBRequest::from_scored(None, "xgb-v1", &scored(0.4)))
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                &PredictionUpdateDBRequest {
                    feedback: Some("Employee left in March".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.feedback.as_deref(), Some("Employee left in March"));

        let cleared = repo.update(created.id, &PredictionUpdateDBRequest::default()).await.unwrap();
        assert!(cleared.feedback.is_none());

        let missing = repo.update(created.id + 1, &PredictionUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }
}
