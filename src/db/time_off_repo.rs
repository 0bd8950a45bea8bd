// src/db/time_off_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PgStore,
    models::time_off::{TimeOffFilter, TimeOffRequest, TimeOffStatus},
};

#[async_trait]
pub trait TimeOffRepository: Send + Sync {
    /// Inserts a Pending request. Fails with `Duplicate` when the nurse
    /// already has an open request for the date.
    async fn insert_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<TimeOffRequest, AppError>;
    async fn find_time_off(&self, id: Uuid) -> Result<Option<TimeOffRequest>, AppError>;
    async fn find_open_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<TimeOffRequest>, AppError>;
    async fn list_time_off(&self, filter: &TimeOffFilter) -> Result<Vec<TimeOffRequest>, AppError>;
    /// Finalizes a Pending request. `None` when the request is missing or no
    /// longer Pending.
    async fn decide_time_off(
        &self,
        id: Uuid,
        decision: TimeOffStatus,
        admin_id: Uuid,
    ) -> Result<Option<TimeOffRequest>, AppError>;
}

#[async_trait]
impl TimeOffRepository for PgStore {
    async fn insert_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<TimeOffRequest, AppError> {
        // The partial unique index on open requests backs the Duplicate rule
        sqlx::query_as::<_, TimeOffRequest>(
            r#"
            INSERT INTO time_off_requests (id, nurse_id, date, reason, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(nurse_id)
        .bind(date)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, &format!("An open time-off request for {}", date)))
    }

    async fn find_time_off(&self, id: Uuid) -> Result<Option<TimeOffRequest>, AppError> {
        let request =
            sqlx::query_as::<_, TimeOffRequest>("SELECT * FROM time_off_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn find_open_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<TimeOffRequest>, AppError> {
        let request = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            SELECT * FROM time_off_requests
            WHERE nurse_id = $1 AND date = $2 AND status IN ('PENDING', 'APPROVED')
            "#,
        )
        .bind(nurse_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_time_off(&self, filter: &TimeOffFilter) -> Result<Vec<TimeOffRequest>, AppError> {
        let requests = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            SELECT * FROM time_off_requests
            WHERE ($1::uuid IS NULL OR nurse_id = $1)
              AND ($2::time_off_status IS NULL OR status = $2)
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(filter.nurse_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn decide_time_off(
        &self,
        id: Uuid,
        decision: TimeOffStatus,
        admin_id: Uuid,
    ) -> Result<Option<TimeOffRequest>, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Take the nurse row lock the ledger commits under, so an approval
        //    and a call-in on the same date cannot both succeed.
        sqlx::query(
            r#"
            SELECT 1 FROM nurses
            WHERE id = (SELECT nurse_id FROM time_off_requests WHERE id = $1)
            FOR UPDATE
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // 2. Compare-and-set on `pending`
        let request = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            UPDATE time_off_requests
            SET status = $1, decided_by = $2, decided_at = NOW()
            WHERE id = $3 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(decision)
        .bind(admin_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }
}
