// src/models/assignment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    nurse::Nurse,
    work_day::{ShiftType, WorkDay},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Available,
    Assigned,
    CalledIn,
    CalledOut,
}

impl AssignmentStatus {
    /// Counts towards coverage and blocks overlapping slots.
    pub fn is_active(self) -> bool {
        matches!(self, AssignmentStatus::Assigned | AssignmentStatus::CalledIn)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Available => write!(f, "available"),
            AssignmentStatus::Assigned => write!(f, "assigned"),
            AssignmentStatus::CalledIn => write!(f, "called-in"),
            AssignmentStatus::CalledOut => write!(f, "called-out"),
        }
    }
}

// A nurse's state for one work day. `available` is never persisted:
// a missing row is reported through `Assignment::vacant`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub work_day_id: Uuid,
    pub nurse_id: Uuid,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub status: AssignmentStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn vacant(work_day: &WorkDay, nurse_id: Uuid) -> Self {
        Self {
            work_day_id: work_day.id,
            nurse_id,
            date: work_day.date,
            shift_type: work_day.shift_type,
            status: AssignmentStatus::Available,
            updated_at: None,
        }
    }
}

// Compare-and-set request the ledger hands to the store. The store applies
// the status change and the hours delta atomically, or neither.
#[derive(Debug, Clone)]
pub struct SlotTransition {
    pub work_day: WorkDay,
    pub nurse_id: Uuid,
    pub expected: AssignmentStatus,
    pub next: AssignmentStatus,
    pub hours_delta: Decimal,
    /// Slots whose window overlaps this one. When `next` is active, the
    /// nurse must not be active on any of them at commit time.
    pub blocking_slots: Vec<(NaiveDate, ShiftType)>,
}

// Every ledger mutation answers with the record and the nurse's new hours,
// so the client does not have to re-fetch.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerUpdate {
    pub assignment: Assignment,
    pub nurse: Nurse,
}

// --- HTTP payloads ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallInAction {
    /// Calls the nurse in.
    Called,
    /// Fully unschedules a called-out nurse.
    Available,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallInStatusPayload {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[serde(rename = "empID")]
    pub emp_id: Uuid,
    pub status: CallInAction,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnschedulePayload {
    #[serde(rename = "empID")]
    pub emp_id: Uuid,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishEntry {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[serde(rename = "empID")]
    pub emp_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishSchedulePayload {
    pub entries: Vec<PublishEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishScheduleResponse {
    pub assignments: Vec<Assignment>,
}

// --- Coverage read models ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableNurse {
    pub nurse: Nurse,
    pub call_in_status: AssignmentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedNurses {
    pub assigned_nurses: Vec<Nurse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub work_day: WorkDay,
    pub active_count: i64,
    pub required_employees: i32,
    /// Zero when the slot is fully staffed.
    pub shortfall: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledShift {
    pub work_day_id: Uuid,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub status: AssignmentStatus,
}

impl From<Assignment> for ScheduledShift {
    fn from(a: Assignment) -> Self {
        Self {
            work_day_id: a.work_day_id,
            date: a.date,
            shift_type: a.shift_type,
            status: a.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NurseWeekResponse {
    pub success: bool,
    pub data: Vec<ScheduledShift>,
}
