// src/services/work_day_service.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DynStore,
    models::work_day::{ShiftType, WorkDay},
};

#[derive(Clone)]
pub struct WorkDayService {
    store: DynStore,
    default_required: i32,
}

impl WorkDayService {
    pub fn new(store: DynStore, default_required: i32) -> Self {
        Self {
            store,
            default_required,
        }
    }

    pub async fn create(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        required_employees: Option<i32>,
    ) -> Result<WorkDay, AppError> {
        let required = required_employees.unwrap_or(self.default_required);
        let work_day = self.store.create_work_day(date, shift_type, required).await?;

        tracing::info!(
            work_day_id = %work_day.id,
            slot = %work_day.slot_label(),
            required,
            "Work day created"
        );
        Ok(work_day)
    }

    pub async fn get(&self, id: Uuid) -> Result<WorkDay, AppError> {
        self.store
            .find_work_day(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}", id)))
    }

    pub async fn find(&self, date: NaiveDate, shift_type: ShiftType) -> Result<WorkDay, AppError> {
        self.store
            .find_work_day_by_slot(date, shift_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}/{}", date, shift_type)))
    }

    pub async fn list(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkDay>, AppError> {
        self.store.list_work_days(from, to).await
    }

    pub async fn update_required(&self, id: Uuid, required: i32) -> Result<WorkDay, AppError> {
        self.store
            .update_required_employees(id, required)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}", id)))
    }
}
