// src/db/pg_store.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::common::error::AppError;

// Postgres-backed store. The repository traits are implemented for it in
// their own modules (nurse_repo.rs, assignment_repo.rs, ...).
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        tracing::info!("✅ Database connection established");
        Ok(Self::new(pool))
    }

    /// Runs the embedded migrations from `./migrations`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!().run(&self.pool).await?;
        tracing::info!("✅ Database migrations applied");
        Ok(())
    }
}
