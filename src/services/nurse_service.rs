// src/services/nurse_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DynStore,
    models::nurse::{CreateNursePayload, NewNurse, Nurse, UpdateNursePayload},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct NurseService {
    store: DynStore,
    bcrypt_cost: u32,
}

impl NurseService {
    pub fn new(store: DynStore, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Hashes the password before anything reaches the store.
    pub async fn create(&self, payload: &CreateNursePayload) -> Result<Nurse, AppError> {
        if payload.max_weekly_hours.is_some_and(|max| max.is_sign_negative()) {
            return Err(AppError::BadRequest("maxWeeklyHours cannot be negative".into()));
        }

        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;
        let nurse = self
            .store
            .create_nurse(NewNurse {
                name: payload.name.clone(),
                phone: payload.phone.clone(),
                email: payload.email.clone(),
                password_hash,
                max_weekly_hours: payload.max_weekly_hours,
            })
            .await?;

        tracing::info!(nurse_id = %nurse.id, email = %nurse.email, "Nurse registered");
        Ok(nurse)
    }

    pub async fn get(&self, id: Uuid) -> Result<Nurse, AppError> {
        self.store
            .find_nurse(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nurse {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Nurse>, AppError> {
        self.store.list_nurses().await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateNursePayload) -> Result<Nurse, AppError> {
        if payload.max_weekly_hours.is_some_and(|max| max.is_sign_negative()) {
            return Err(AppError::BadRequest("maxWeeklyHours cannot be negative".into()));
        }

        self.store
            .update_nurse(id, payload)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nurse {}", id)))
    }
}
