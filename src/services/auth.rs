// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{admin_repo::NewAdmin, DynStore},
    models::auth::{Admin, AuthResponse, Claims, CreateAdminPayload, Principal, Role},
};

/// Hashes off the async runtime; bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    store: DynStore,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: DynStore, jwt_secret: String, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
        }
    }

    // Admins log in with their username, nurses with their e-mail.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let (id, role, password_hash) =
            if let Some(admin) = self.store.find_admin_by_username(username).await? {
                (admin.id, Role::Admin, admin.password_hash)
            } else if let Some(nurse) = self.store.find_nurse_by_email(username).await? {
                (nurse.id, Role::Nurse, nurse.password_hash)
            } else {
                return Err(AppError::InvalidCredentials);
            };

        if !verify_password(password, &password_hash).await? {
            tracing::warn!(%username, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }

        let (token, expires_at) = self.create_token(id, role)?;
        tracing::info!(%id, ?role, "Login succeeded");
        Ok(AuthResponse {
            token,
            role,
            expires_at,
        })
    }

    pub async fn validate_token(&self, token: &str) -> Result<Principal, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let claims = token_data.claims;
        // The account must still exist
        let name = match claims.role {
            Role::Admin => self.store.find_admin(claims.sub).await?.map(|a| a.name),
            Role::Nurse => self.store.find_nurse(claims.sub).await?.map(|n| n.name),
        }
        .ok_or(AppError::InvalidToken)?;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
            name,
        })
    }

    pub async fn create_admin(&self, payload: &CreateAdminPayload) -> Result<Admin, AppError> {
        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;
        let admin = self
            .store
            .create_admin(NewAdmin {
                name: payload.name.clone(),
                username: payload.username.clone(),
                password_hash,
                email: payload.email.clone(),
                phone: payload.phone.clone(),
            })
            .await?;

        tracing::info!(admin_id = %admin.id, username = %admin.username, "Admin created");
        Ok(admin)
    }

    /// Creates the first admin at startup unless the username already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<Admin, AppError> {
        if let Some(existing) = self.store.find_admin_by_username(username).await? {
            return Ok(existing);
        }

        self.create_admin(&CreateAdminPayload {
            name: username.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            phone: None,
        })
        .await
    }

    pub fn create_token(&self, id: Uuid, role: Role) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| anyhow::anyhow!("Token lifetime {} overflows", self.token_ttl))?;

        let claims = Claims {
            sub: id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;
        Ok((token, expires_at))
    }
}
