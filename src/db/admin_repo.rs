// src/db/admin_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{common::error::AppError, db::PgStore, models::auth::Admin};

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Fails with `Duplicate` when the username is taken.
    async fn create_admin(&self, new: NewAdmin) -> Result<Admin, AppError>;
    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>, AppError>;
    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError>;
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn create_admin(&self, new: NewAdmin) -> Result<Admin, AppError> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, name, username, password_hash, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.email)
        .bind(&new.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Admin username"))
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }
}
