// src/models/work_day.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shift_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Day,
    Night,
}

// `Vec<ShiftType>` binds as `shift_type[]` via the `PgHasArrayType` impl generated by `sqlx::Type`.

impl std::fmt::Display for ShiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftType::Day => write!(f, "day"),
            ShiftType::Night => write!(f, "night"),
        }
    }
}

// One staffing requirement: unique per (date, shift_type).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkDay {
    pub id: Uuid,
    #[schema(example = "2024-07-01")]
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[schema(example = 20)]
    pub required_employees: i32,
    pub created_at: DateTime<Utc>,
}

impl WorkDay {
    pub fn slot_label(&self) -> String {
        format!("{}/{}", self.date, self.shift_type)
    }
}

// (date, shiftType) as it arrives in query strings.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    #[param(example = "2024-07-01")]
    pub date: NaiveDate,
    pub shift_type: ShiftType,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkDayPayload {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[validate(range(min = 0, message = "Required employees cannot be negative."))]
    pub required_employees: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequiredPayload {
    #[validate(range(min = 0, message = "Required employees cannot be negative."))]
    pub required_employees: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkDayRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
