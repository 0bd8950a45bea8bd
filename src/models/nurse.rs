// src/models/nurse.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Nurse {
    pub id: Uuid,
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    #[schema(example = "ana.souza@hospital.org")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = 24.0)]
    pub current_weekly_hours: Decimal,
    /// Absent means unbounded.
    #[schema(example = 36.0)]
    pub max_weekly_hours: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Nurse {
    /// Hours the counter would reach after `delta`, floored at zero.
    pub fn hours_after(&self, delta: Decimal) -> Decimal {
        (self.current_weekly_hours + delta).max(Decimal::ZERO)
    }

    pub fn exceeds_cap(&self, delta: Decimal) -> bool {
        match self.max_weekly_hours {
            Some(max) => delta > Decimal::ZERO && self.hours_after(delta) > max,
            None => false,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNursePayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must have at least 6 characters."))]
    pub password: String,
    pub max_weekly_hours: Option<Decimal>,
}

// Full replacement of the editable profile. Hours are owned by the ledger.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNursePayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: String,
    pub max_weekly_hours: Option<Decimal>,
}

// What the repositories receive once the password is hashed.
#[derive(Debug, Clone)]
pub struct NewNurse {
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub max_weekly_hours: Option<Decimal>,
}
