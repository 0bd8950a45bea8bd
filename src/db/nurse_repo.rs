// src/db/nurse_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PgStore,
    models::nurse::{NewNurse, Nurse, UpdateNursePayload},
};

#[async_trait]
pub trait NurseRepository: Send + Sync {
    /// Fails with `Duplicate` when the e-mail is taken.
    async fn create_nurse(&self, new: NewNurse) -> Result<Nurse, AppError>;
    async fn find_nurse(&self, id: Uuid) -> Result<Option<Nurse>, AppError>;
    async fn find_nurse_by_email(&self, email: &str) -> Result<Option<Nurse>, AppError>;
    async fn list_nurses(&self) -> Result<Vec<Nurse>, AppError>;
    /// Leaves `current_weekly_hours` alone; only the ledger moves it.
    async fn update_nurse(
        &self,
        id: Uuid,
        update: &UpdateNursePayload,
    ) -> Result<Option<Nurse>, AppError>;
}

#[async_trait]
impl NurseRepository for PgStore {
    async fn create_nurse(&self, new: NewNurse) -> Result<Nurse, AppError> {
        sqlx::query_as::<_, Nurse>(
            r#"
            INSERT INTO nurses (id, name, phone, email, password_hash, max_weekly_hours)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.max_weekly_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Nurse e-mail"))
    }

    async fn find_nurse(&self, id: Uuid) -> Result<Option<Nurse>, AppError> {
        let nurse = sqlx::query_as::<_, Nurse>("SELECT * FROM nurses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(nurse)
    }

    async fn find_nurse_by_email(&self, email: &str) -> Result<Option<Nurse>, AppError> {
        let nurse = sqlx::query_as::<_, Nurse>("SELECT * FROM nurses WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(nurse)
    }

    async fn list_nurses(&self) -> Result<Vec<Nurse>, AppError> {
        let nurses = sqlx::query_as::<_, Nurse>("SELECT * FROM nurses ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(nurses)
    }

    async fn update_nurse(
        &self,
        id: Uuid,
        update: &UpdateNursePayload,
    ) -> Result<Option<Nurse>, AppError> {
        sqlx::query_as::<_, Nurse>(
            r#"
            UPDATE nurses
            SET name = $1, phone = $2, email = $3, max_weekly_hours = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(update.max_weekly_hours)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Nurse e-mail"))
    }
}
