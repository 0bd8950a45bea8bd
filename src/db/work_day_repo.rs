// src/db/work_day_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PgStore,
    models::work_day::{ShiftType, WorkDay},
};

#[async_trait]
pub trait WorkDayRepository: Send + Sync {
    /// Fails with `Duplicate` when the (date, shift) slot already exists.
    async fn create_work_day(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        required_employees: i32,
    ) -> Result<WorkDay, AppError>;
    async fn find_work_day(&self, id: Uuid) -> Result<Option<WorkDay>, AppError>;
    async fn find_work_day_by_slot(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<Option<WorkDay>, AppError>;
    /// Inclusive bounds, ordered by date then shift.
    async fn list_work_days(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkDay>, AppError>;
    async fn update_required_employees(
        &self,
        id: Uuid,
        required_employees: i32,
    ) -> Result<Option<WorkDay>, AppError>;
}

#[async_trait]
impl WorkDayRepository for PgStore {
    async fn create_work_day(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        required_employees: i32,
    ) -> Result<WorkDay, AppError> {
        sqlx::query_as::<_, WorkDay>(
            r#"
            INSERT INTO work_days (id, date, shift_type, required_employees)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(shift_type)
        .bind(required_employees)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, &format!("Work day {}/{}", date, shift_type)))
    }

    async fn find_work_day(&self, id: Uuid) -> Result<Option<WorkDay>, AppError> {
        let work_day = sqlx::query_as::<_, WorkDay>("SELECT * FROM work_days WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(work_day)
    }

    async fn find_work_day_by_slot(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<Option<WorkDay>, AppError> {
        let work_day = sqlx::query_as::<_, WorkDay>(
            "SELECT * FROM work_days WHERE date = $1 AND shift_type = $2",
        )
        .bind(date)
        .bind(shift_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(work_day)
    }

    async fn list_work_days(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkDay>, AppError> {
        let work_days = sqlx::query_as::<_, WorkDay>(
            r#"
            SELECT * FROM work_days
            WHERE ($1::date IS NULL OR date >= $1)
              AND ($2::date IS NULL OR date <= $2)
            ORDER BY date ASC, shift_type ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(work_days)
    }

    async fn update_required_employees(
        &self,
        id: Uuid,
        required_employees: i32,
    ) -> Result<Option<WorkDay>, AppError> {
        let work_day = sqlx::query_as::<_, WorkDay>(
            "UPDATE work_days SET required_employees = $1 WHERE id = $2 RETURNING *",
        )
        .bind(required_employees)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(work_day)
    }
}
