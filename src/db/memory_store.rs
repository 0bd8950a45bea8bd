// src/db/memory_store.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        admin_repo::NewAdmin, AdminRepository, AssignmentRepository, NurseRepository,
        TimeOffRepository, WorkDayRepository,
    },
    models::{
        assignment::{Assignment, AssignmentStatus, SlotTransition},
        auth::Admin,
        nurse::{NewNurse, Nurse, UpdateNursePayload},
        time_off::{TimeOffFilter, TimeOffRequest, TimeOffStatus},
        work_day::{ShiftType, WorkDay},
    },
};

#[derive(Default)]
struct MemoryState {
    nurses: HashMap<Uuid, Nurse>,
    admins: HashMap<Uuid, Admin>,
    work_days: HashMap<Uuid, WorkDay>,
    // (work_day_id, nurse_id) -> status; `available` is never stored
    assignments: HashMap<(Uuid, Uuid), (AssignmentStatus, DateTime<Utc>)>,
    time_off: HashMap<Uuid, TimeOffRequest>,
}

impl MemoryState {
    fn assignment(&self, work_day_id: Uuid, nurse_id: Uuid) -> Option<Assignment> {
        let (status, updated_at) = self.assignments.get(&(work_day_id, nurse_id))?;
        let work_day = self.work_days.get(&work_day_id)?;
        Some(Assignment {
            status: *status,
            updated_at: Some(*updated_at),
            ..Assignment::vacant(work_day, nurse_id)
        })
    }

    fn is_active(&self, work_day_id: Uuid, nurse_id: Uuid) -> bool {
        self.assignments
            .get(&(work_day_id, nurse_id))
            .is_some_and(|(status, _)| status.is_active())
    }

    fn has_approved_time_off(&self, nurse_id: Uuid, date: NaiveDate) -> bool {
        self.time_off.values().any(|r| {
            r.nurse_id == nurse_id && r.date == date && r.status == TimeOffStatus::Approved
        })
    }

    // First active assignment of the nurse on one of `slots`.
    fn active_on(
        &self,
        nurse_id: Uuid,
        slots: &[(NaiveDate, ShiftType)],
    ) -> Option<(&WorkDay, AssignmentStatus)> {
        self.assignments
            .iter()
            .filter(|((_, n), (status, _))| *n == nurse_id && status.is_active())
            .filter_map(|((work_day_id, _), (status, _))| {
                let work_day = self.work_days.get(work_day_id)?;
                slots
                    .contains(&(work_day.date, work_day.shift_type))
                    .then_some((work_day, *status))
            })
            .next()
    }

    fn sorted_nurses<'a>(&self, nurses: impl Iterator<Item = &'a Nurse>) -> Vec<Nurse> {
        let mut nurses: Vec<Nurse> = nurses.cloned().collect();
        nurses.sort_by(|a, b| a.name.cmp(&b.name));
        nurses
    }
}

/// In-process store used when no DATABASE_URL is configured, and by the
/// tests. A single `RwLock` makes every write atomic and every read a
/// consistent snapshot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NurseRepository for MemoryStore {
    async fn create_nurse(&self, new: NewNurse) -> Result<Nurse, AppError> {
        let mut state = self.state.write().await;
        if state.nurses.values().any(|n| n.email == new.email) {
            return Err(AppError::Duplicate("Nurse e-mail already exists".into()));
        }

        let now = Utc::now();
        let nurse = Nurse {
            id: Uuid::new_v4(),
            name: new.name,
            phone: new.phone,
            email: new.email,
            password_hash: new.password_hash,
            current_weekly_hours: Default::default(),
            max_weekly_hours: new.max_weekly_hours,
            created_at: now,
            updated_at: now,
        };
        state.nurses.insert(nurse.id, nurse.clone());
        Ok(nurse)
    }

    async fn find_nurse(&self, id: Uuid) -> Result<Option<Nurse>, AppError> {
        Ok(self.state.read().await.nurses.get(&id).cloned())
    }

    async fn find_nurse_by_email(&self, email: &str) -> Result<Option<Nurse>, AppError> {
        let state = self.state.read().await;
        Ok(state.nurses.values().find(|n| n.email == email).cloned())
    }

    async fn list_nurses(&self) -> Result<Vec<Nurse>, AppError> {
        let state = self.state.read().await;
        Ok(state.sorted_nurses(state.nurses.values()))
    }

    async fn update_nurse(
        &self,
        id: Uuid,
        update: &UpdateNursePayload,
    ) -> Result<Option<Nurse>, AppError> {
        let mut state = self.state.write().await;
        if state.nurses.values().any(|n| n.id != id && n.email == update.email) {
            return Err(AppError::Duplicate("Nurse e-mail already exists".into()));
        }

        let Some(nurse) = state.nurses.get_mut(&id) else {
            return Ok(None);
        };
        nurse.name = update.name.clone();
        nurse.phone = update.phone.clone();
        nurse.email = update.email.clone();
        nurse.max_weekly_hours = update.max_weekly_hours;
        nurse.updated_at = Utc::now();
        Ok(Some(nurse.clone()))
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn create_admin(&self, new: NewAdmin) -> Result<Admin, AppError> {
        let mut state = self.state.write().await;
        if state.admins.values().any(|a| a.username == new.username) {
            return Err(AppError::Duplicate("Admin username already exists".into()));
        }

        let admin = Admin {
            id: Uuid::new_v4(),
            name: new.name,
            username: new.username,
            password_hash: new.password_hash,
            email: new.email,
            phone: new.phone,
            created_at: Utc::now(),
        };
        state.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        Ok(self.state.read().await.admins.get(&id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        let state = self.state.read().await;
        Ok(state.admins.values().find(|a| a.username == username).cloned())
    }
}

#[async_trait]
impl WorkDayRepository for MemoryStore {
    async fn create_work_day(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        required_employees: i32,
    ) -> Result<WorkDay, AppError> {
        let mut state = self.state.write().await;
        if state
            .work_days
            .values()
            .any(|w| w.date == date && w.shift_type == shift_type)
        {
            return Err(AppError::Duplicate(format!(
                "Work day {}/{} already exists",
                date, shift_type
            )));
        }

        let work_day = WorkDay {
            id: Uuid::new_v4(),
            date,
            shift_type,
            required_employees,
            created_at: Utc::now(),
        };
        state.work_days.insert(work_day.id, work_day.clone());
        Ok(work_day)
    }

    async fn find_work_day(&self, id: Uuid) -> Result<Option<WorkDay>, AppError> {
        Ok(self.state.read().await.work_days.get(&id).cloned())
    }

    async fn find_work_day_by_slot(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<Option<WorkDay>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .work_days
            .values()
            .find(|w| w.date == date && w.shift_type == shift_type)
            .cloned())
    }

    async fn list_work_days(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkDay>, AppError> {
        let state = self.state.read().await;
        let mut work_days: Vec<WorkDay> = state
            .work_days
            .values()
            .filter(|w| from.is_none_or(|from| w.date >= from))
            .filter(|w| to.is_none_or(|to| w.date <= to))
            .cloned()
            .collect();
        work_days.sort_by_key(|w| (w.date, w.shift_type));
        Ok(work_days)
    }

    async fn update_required_employees(
        &self,
        id: Uuid,
        required_employees: i32,
    ) -> Result<Option<WorkDay>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.work_days.get_mut(&id).map(|w| {
            w.required_employees = required_employees;
            w.clone()
        }))
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn find_assignment(
        &self,
        work_day_id: Uuid,
        nurse_id: Uuid,
    ) -> Result<Option<Assignment>, AppError> {
        Ok(self.state.read().await.assignment(work_day_id, nurse_id))
    }

    async fn list_nurse_assignments(
        &self,
        nurse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Assignment>, AppError> {
        let state = self.state.read().await;
        let mut assignments: Vec<Assignment> = state
            .assignments
            .keys()
            .filter(|(_, n)| *n == nurse_id)
            .filter_map(|(w, n)| state.assignment(*w, *n))
            .filter(|a| a.date >= from && a.date <= to)
            .collect();
        assignments.sort_by_key(|a| (a.date, a.shift_type));
        Ok(assignments)
    }

    async fn list_active_nurses(&self, work_day_id: Uuid) -> Result<Vec<Nurse>, AppError> {
        let state = self.state.read().await;
        Ok(state.sorted_nurses(
            state
                .nurses
                .values()
                .filter(|n| state.is_active(work_day_id, n.id)),
        ))
    }

    async fn list_unassigned_nurses(&self, work_day: &WorkDay) -> Result<Vec<Nurse>, AppError> {
        let state = self.state.read().await;
        Ok(state.sorted_nurses(state.nurses.values().filter(|n| {
            !state.is_active(work_day.id, n.id) && !state.has_approved_time_off(n.id, work_day.date)
        })))
    }

    async fn count_active(&self, work_day_id: Uuid) -> Result<i64, AppError> {
        let state = self.state.read().await;
        let count = state
            .assignments
            .iter()
            .filter(|((w, _), (status, _))| *w == work_day_id && status.is_active())
            .count();
        Ok(count as i64)
    }

    async fn apply_transition(
        &self,
        transition: &SlotTransition,
    ) -> Result<(Assignment, Nurse), AppError> {
        let work_day = &transition.work_day;
        let key = (work_day.id, transition.nurse_id);
        let mut state = self.state.write().await;

        let nurse = state
            .nurses
            .get(&transition.nurse_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Nurse {}", transition.nurse_id)))?;

        let current = state
            .assignments
            .get(&key)
            .map(|(status, _)| *status)
            .unwrap_or(AssignmentStatus::Available);
        if current != transition.expected {
            return Err(AppError::Conflict(format!(
                "Slot {} for nurse {} changed concurrently (now {})",
                work_day.slot_label(),
                transition.nurse_id,
                current
            )));
        }

        if transition.next.is_active() {
            if state.has_approved_time_off(nurse.id, work_day.date) {
                return Err(AppError::Conflict(format!(
                    "{} has approved time off on {}",
                    nurse.name, work_day.date
                )));
            }
            if let Some((other, status)) = state.active_on(nurse.id, &transition.blocking_slots) {
                return Err(AppError::Conflict(format!(
                    "{} is already {} for the overlapping shift {}",
                    nurse.name,
                    status,
                    other.slot_label()
                )));
            }
        }

        if nurse.exceeds_cap(transition.hours_delta) {
            return Err(AppError::CapacityExceeded {
                current: nurse.current_weekly_hours,
                requested: transition.hours_delta,
                max: nurse.max_weekly_hours.unwrap_or_default(),
            });
        }

        let now = Utc::now();
        let updated = Nurse {
            current_weekly_hours: nurse.hours_after(transition.hours_delta),
            updated_at: now,
            ..nurse
        };
        state.nurses.insert(updated.id, updated.clone());

        let assignment = if transition.next == AssignmentStatus::Available {
            state.assignments.remove(&key);
            Assignment::vacant(work_day, transition.nurse_id)
        } else {
            state.assignments.insert(key, (transition.next, now));
            Assignment {
                status: transition.next,
                updated_at: Some(now),
                ..Assignment::vacant(work_day, transition.nurse_id)
            }
        };

        Ok((assignment, updated))
    }
}

#[async_trait]
impl TimeOffRepository for MemoryStore {
    async fn insert_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<TimeOffRequest, AppError> {
        let mut state = self.state.write().await;
        if state
            .time_off
            .values()
            .any(|r| r.nurse_id == nurse_id && r.date == date && r.status.is_open())
        {
            return Err(AppError::Duplicate(format!(
                "An open time-off request for {} already exists",
                date
            )));
        }

        let request = TimeOffRequest {
            id: Uuid::new_v4(),
            nurse_id,
            date,
            reason: reason.map(str::to_owned),
            status: TimeOffStatus::Pending,
            decided_by: None,
            decided_at: None,
            created_at: Utc::now(),
        };
        state.time_off.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_time_off(&self, id: Uuid) -> Result<Option<TimeOffRequest>, AppError> {
        Ok(self.state.read().await.time_off.get(&id).cloned())
    }

    async fn find_open_time_off(
        &self,
        nurse_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<TimeOffRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .time_off
            .values()
            .find(|r| r.nurse_id == nurse_id && r.date == date && r.status.is_open())
            .cloned())
    }

    async fn list_time_off(&self, filter: &TimeOffFilter) -> Result<Vec<TimeOffRequest>, AppError> {
        let state = self.state.read().await;
        let mut requests: Vec<TimeOffRequest> = state
            .time_off
            .values()
            .filter(|r| filter.nurse_id.is_none_or(|id| r.nurse_id == id))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by_key(|r| (r.date, r.created_at));
        Ok(requests)
    }

    async fn decide_time_off(
        &self,
        id: Uuid,
        decision: TimeOffStatus,
        admin_id: Uuid,
    ) -> Result<Option<TimeOffRequest>, AppError> {
        let mut state = self.state.write().await;
        let Some(request) = state.time_off.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != TimeOffStatus::Pending {
            return Ok(None);
        }

        request.status = decision;
        request.decided_by = Some(admin_id);
        request.decided_at = Some(Utc::now());
        Ok(Some(request.clone()))
    }
}
