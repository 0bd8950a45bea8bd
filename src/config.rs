// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;
use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::{
    db::{DynStore, MemoryStore, PgStore},
    services::{
        AssignmentLedger, AuthService, CoverageService, NurseService, ShiftPolicy,
        TimeOffService, WorkDayService,
    },
};

// One year
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

// ---
// Configuration read from the environment (.env is optional)
// ---
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub shift_policy: ShiftPolicy,
    pub default_required_employees: i32,
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let shift_hours: Decimal = parse_or(&var, "SHIFT_HOURS", Decimal::from(12))?;
        if shift_hours <= Decimal::ZERO || shift_hours > Decimal::from(24) {
            anyhow::bail!("SHIFT_HOURS must be in (0, 24], got {}", shift_hours);
        }
        // Weekly hours are stored as NUMERIC(6, 2)
        if shift_hours.normalize().scale() > 2 {
            anyhow::bail!("SHIFT_HOURS allows at most two decimal places, got {}", shift_hours);
        }

        let token_ttl_hours: i64 = parse_or(&var, "TOKEN_TTL_HOURS", 12)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            anyhow::bail!(
                "TOKEN_TTL_HOURS must be in [1, {}], got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }
        let token_ttl = chrono::Duration::try_hours(token_ttl_hours)
            .with_context(|| format!("TOKEN_TTL_HOURS {} is out of range", token_ttl_hours))?;

        let default_required_employees = parse_or(&var, "DEFAULT_REQUIRED_EMPLOYEES", 20)?;
        if default_required_employees < 0 {
            anyhow::bail!("DEFAULT_REQUIRED_EMPLOYEES cannot be negative");
        }

        let defaults = ShiftPolicy::default();
        let shift_policy = ShiftPolicy {
            day_start: time_or(&var, "DAY_SHIFT_START", defaults.day_start)?,
            night_start: time_or(&var, "NIGHT_SHIFT_START", defaults.night_start)?,
            shift_hours,
        };

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_USERNAME"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_secret,
            token_ttl,
            bcrypt_cost: parse_or(&var, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            shift_policy,
            default_required_employees,
            bootstrap_admin,
        })
    }
}

fn parse_or<T>(var: impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn time_or(
    var: impl Fn(&str) -> Option<String>,
    key: &str,
    default: NaiveTime,
) -> anyhow::Result<NaiveTime> {
    match var(key) {
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{} must be HH:MM, got '{}'", key, raw)),
        None => Ok(default),
    }
}

// ---
// Shared state handed to every handler
// ---
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub nurse_service: NurseService,
    pub work_day_service: WorkDayService,
    pub ledger: AssignmentLedger,
    pub time_off_service: TimeOffService,
    pub coverage_service: CoverageService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: DynStore = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.db_max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using the in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(store, &config))
    }

    // --- Builds the dependency graph ---
    pub fn with_store(store: DynStore, config: &Config) -> Self {
        let auth_service = AuthService::new(
            store.clone(),
            config.jwt_secret.clone(),
            config.token_ttl,
            config.bcrypt_cost,
        );
        let nurse_service = NurseService::new(store.clone(), config.bcrypt_cost);
        let work_day_service =
            WorkDayService::new(store.clone(), config.default_required_employees);
        let ledger = AssignmentLedger::new(store.clone(), config.shift_policy.clone());
        let time_off_service = TimeOffService::new(store.clone());
        let coverage_service = CoverageService::new(store);

        Self {
            auth_service,
            nurse_service,
            work_day_service,
            ledger,
            time_off_service,
            coverage_service,
        }
    }
}
