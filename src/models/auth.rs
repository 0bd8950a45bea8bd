// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Admin (the user who approves time off and drives call-ins)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    #[schema(example = "Charge Nurse Rivera")]
    pub name: String,
    #[schema(example = "rivera")]
    pub username: String,

    #[serde(skip_serializing)] // never leaves the server
    #[schema(ignore)]
    pub password_hash: String,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Nurse,
}

// Who is behind the bearer token, resolved by the auth guard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Login form. Admins log in with their username, nurses with their e-mail.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Username is required."))]
    #[schema(example = "rivera")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 3, message = "Username must have at least 3 characters."))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must have at least 6 characters."))]
    pub password: String,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // principal id
    pub role: Role,
    pub exp: usize, // expiration
    pub iat: usize, // issued at
}
