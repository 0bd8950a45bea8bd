// src/services/time_off_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, locks::KeyedLocks},
    db::DynStore,
    models::time_off::{SubmitTimeOffPayload, TimeOffFilter, TimeOffRequest, TimeOffStatus},
};

#[derive(Clone)]
pub struct TimeOffService {
    store: DynStore,
    locks: KeyedLocks<Uuid>,
}

impl TimeOffService {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Files a pending request. Only one pending or approved request may
    /// exist per nurse and date.
    pub async fn submit(
        &self,
        nurse_id: Uuid,
        payload: &SubmitTimeOffPayload,
    ) -> Result<TimeOffRequest, AppError> {
        if self.store.find_nurse(nurse_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Nurse {}", nurse_id)));
        }

        if let Some(open) = self.store.find_open_time_off(nurse_id, payload.date).await? {
            return Err(AppError::Duplicate(format!(
                "Time-off request {} for {} is already {:?}",
                open.id, open.date, open.status
            )));
        }

        let request = self
            .store
            .insert_time_off(nurse_id, payload.date, payload.reason.as_deref())
            .await?;

        tracing::info!(
            request_id = %request.id,
            %nurse_id,
            date = %request.date,
            "Time-off request submitted"
        );
        Ok(request)
    }

    /// Pending -> Approved | Denied. A decided request is final.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: TimeOffStatus,
        admin_id: Uuid,
    ) -> Result<TimeOffRequest, AppError> {
        if decision == TimeOffStatus::Pending {
            return Err(AppError::BadRequest(
                "Decision must be Approved or Denied".into(),
            ));
        }

        let _guard = self.locks.lock(id).await;

        let request = self.get(id).await?;
        if request.status != TimeOffStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Time-off request {} was already {:?}",
                id, request.status
            )));
        }

        let decided = self
            .store
            .decide_time_off(id, decision, admin_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(format!("Time-off request {} was decided concurrently", id))
            })?;

        tracing::info!(
            request_id = %decided.id,
            nurse_id = %decided.nurse_id,
            status = ?decided.status,
            %admin_id,
            "Time-off request decided"
        );
        Ok(decided)
    }

    pub async fn get(&self, id: Uuid) -> Result<TimeOffRequest, AppError> {
        self.store
            .find_time_off(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time-off request {}", id)))
    }

    pub async fn list(&self, filter: &TimeOffFilter) -> Result<Vec<TimeOffRequest>, AppError> {
        self.store.list_time_off(filter).await
    }
}
