// src/models/time_off.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "time_off_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOffStatus {
    Approved,
    Pending,
    Denied,
}

impl TimeOffStatus {
    /// Pending and Approved requests block a new submission for the same date.
    pub fn is_open(self) -> bool {
        matches!(self, TimeOffStatus::Pending | TimeOffStatus::Approved)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub nurse_id: Uuid,
    #[schema(example = "2024-07-01")]
    pub date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
    pub status: TimeOffStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTimeOffPayload {
    /// Required when an admin submits on behalf of a nurse.
    pub nurse_id: Option<Uuid>,
    pub date: NaiveDate,
    #[validate(length(max = 500, message = "Reason is limited to 500 characters."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideTimeOffPayload {
    pub decision: TimeOffStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TimeOffFilter {
    pub nurse_id: Option<Uuid>,
    pub status: Option<TimeOffStatus>,
}
