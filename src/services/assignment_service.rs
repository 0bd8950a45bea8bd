// src/services/assignment_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, locks::KeyedLocks},
    db::DynStore,
    models::{
        assignment::{Assignment, AssignmentStatus, LedgerUpdate, PublishEntry, SlotTransition},
        nurse::Nurse,
        work_day::{ShiftType, WorkDay},
    },
    services::shift_policy::ShiftPolicy,
};

// A slot as seen by the ledger right before a transition.
struct SlotState {
    work_day: WorkDay,
    nurse: Nurse,
    current: Assignment,
}

/// The assignment ledger: per (work day, nurse) state machine
///
/// ```text
/// available -> assigned -> called-in <-> called-out -> available
/// ```
///
/// Every mutation for a nurse runs under that nurse's lock. The store
/// re-checks the expected status, approved time off, overlapping shifts and
/// the hours cap in the same atomic commit, so racing writers (in this
/// process or another) never double-book a nurse or add hours twice.
#[derive(Clone)]
pub struct AssignmentLedger {
    store: DynStore,
    policy: ShiftPolicy,
    locks: KeyedLocks<Uuid>,
}

impl AssignmentLedger {
    pub fn new(store: DynStore, policy: ShiftPolicy) -> Self {
        Self {
            store,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// available / called-out -> called-in. No-op when already called in.
    pub async fn call_in(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
    ) -> Result<LedgerUpdate, AppError> {
        self.activate(date, shift_type, nurse_id, AssignmentStatus::CalledIn)
            .await
    }

    /// Entry point for a published (generated) schedule: available /
    /// called-out -> assigned. No-op when already assigned.
    pub async fn assign(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
    ) -> Result<LedgerUpdate, AppError> {
        self.activate(date, shift_type, nurse_id, AssignmentStatus::Assigned)
            .await
    }

    /// assigned / called-in -> called-out, giving the shift hours back.
    pub async fn call_out(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
    ) -> Result<LedgerUpdate, AppError> {
        let _guard = self.locks.lock(nurse_id).await;
        let slot = self.load_slot(date, shift_type, nurse_id).await?;

        match slot.current.status {
            AssignmentStatus::CalledOut => Ok(Self::unchanged(slot)),
            AssignmentStatus::Assigned | AssignmentStatus::CalledIn => {
                let hours = self.policy.duration_hours(shift_type);
                self.commit(slot, AssignmentStatus::CalledOut, -hours, Vec::new())
                    .await
            }
            AssignmentStatus::Available => Err(AppError::Conflict(format!(
                "{} is not scheduled for {}",
                slot.nurse.name,
                slot.work_day.slot_label()
            ))),
        }
    }

    /// Full unschedule: called-out -> available. Hours were already returned
    /// by the call-out.
    pub async fn release(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
    ) -> Result<LedgerUpdate, AppError> {
        let _guard = self.locks.lock(nurse_id).await;
        let slot = self.load_slot(date, shift_type, nurse_id).await?;

        match slot.current.status {
            AssignmentStatus::Available => Ok(Self::unchanged(slot)),
            AssignmentStatus::CalledOut => {
                self.commit(slot, AssignmentStatus::Available, Decimal::ZERO, Vec::new())
                    .await
            }
            status => Err(AppError::Conflict(format!(
                "{} is {} for {} and must be called out first",
                slot.nurse.name,
                status,
                slot.work_day.slot_label()
            ))),
        }
    }

    /// Applies a generated schedule entry by entry. Stops at the first
    /// failure; entries already applied stay, and re-publishing them is a
    /// no-op.
    pub async fn publish(&self, entries: &[PublishEntry]) -> Result<Vec<Assignment>, AppError> {
        let mut assignments = Vec::with_capacity(entries.len());
        for entry in entries {
            let update = self.assign(entry.date, entry.shift_type, entry.emp_id).await?;
            assignments.push(update.assignment);
        }

        tracing::info!(count = assignments.len(), "Schedule published");
        Ok(assignments)
    }

    async fn activate(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
        target: AssignmentStatus,
    ) -> Result<LedgerUpdate, AppError> {
        let _guard = self.locks.lock(nurse_id).await;
        let slot = self.load_slot(date, shift_type, nurse_id).await?;

        if slot.current.status == target {
            return Ok(Self::unchanged(slot));
        }
        if slot.current.status.is_active() {
            return Err(AppError::Conflict(format!(
                "{} is already {} for {}",
                slot.nurse.name,
                slot.current.status,
                slot.work_day.slot_label()
            )));
        }

        let blocking_slots = self.policy.blocking_slots(date, shift_type).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Shift {} ends past the last supported date",
                slot.work_day.slot_label()
            ))
        })?;

        // Time off, overlapping shifts and the hours cap are checked by the
        // store inside the commit.
        let hours = self.policy.duration_hours(shift_type);
        self.commit(slot, target, hours, blocking_slots).await
    }

    async fn load_slot(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
        nurse_id: Uuid,
    ) -> Result<SlotState, AppError> {
        let work_day = self
            .store
            .find_work_day_by_slot(date, shift_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}/{}", date, shift_type)))?;
        let nurse = self
            .store
            .find_nurse(nurse_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nurse {}", nurse_id)))?;
        let current = self
            .store
            .find_assignment(work_day.id, nurse_id)
            .await?
            .unwrap_or_else(|| Assignment::vacant(&work_day, nurse_id));

        Ok(SlotState {
            work_day,
            nurse,
            current,
        })
    }

    async fn commit(
        &self,
        slot: SlotState,
        next: AssignmentStatus,
        hours_delta: Decimal,
        blocking_slots: Vec<(NaiveDate, ShiftType)>,
    ) -> Result<LedgerUpdate, AppError> {
        let transition = SlotTransition {
            nurse_id: slot.nurse.id,
            expected: slot.current.status,
            next,
            hours_delta,
            work_day: slot.work_day,
            blocking_slots,
        };
        let (assignment, nurse) = self.store.apply_transition(&transition).await?;

        tracing::info!(
            nurse_id = %nurse.id,
            slot = %transition.work_day.slot_label(),
            from = %transition.expected,
            to = %next,
            weekly_hours = %nurse.current_weekly_hours,
            "Assignment updated"
        );
        Ok(LedgerUpdate { assignment, nurse })
    }

    fn unchanged(slot: SlotState) -> LedgerUpdate {
        tracing::debug!(
            nurse_id = %slot.nurse.id,
            slot = %slot.work_day.slot_label(),
            status = %slot.current.status,
            "Assignment already in requested state"
        );
        LedgerUpdate {
            assignment: slot.current,
            nurse: slot.nurse,
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::db::{
        AssignmentRepository, MemoryStore, NurseRepository, TimeOffRepository, WorkDayRepository,
    };
    use crate::models::nurse::NewNurse;
    use crate::models::time_off::TimeOffStatus;
    use std::sync::Arc;

    const DAY: ShiftType = ShiftType::Day;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn nurse(store: &MemoryStore, email: &str, max: Option<i64>) -> Nurse {
        store
            .create_nurse(NewNurse {
                name: email.split('@').next().unwrap_or(email).to_string(),
                phone: None,
                email: email.into(),
                password_hash: "not-a-real-hash".into(),
                max_weekly_hours: max.map(Decimal::from),
            })
            .await
            .unwrap()
    }

    fn ledger(store: &MemoryStore, shift_hours: i64) -> AssignmentLedger {
        let policy = ShiftPolicy {
            shift_hours: Decimal::from(shift_hours),
            ..ShiftPolicy::default()
        };
        AssignmentLedger::new(Arc::new(store.clone()), policy)
    }

    async fn hours(store: &MemoryStore, id: Uuid) -> Decimal {
        store.find_nurse(id).await.unwrap().unwrap().current_weekly_hours
    }

    #[tokio::test]
    async fn call_in__should_add_shift_hours_and_mark_called_in() {
        // Given
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);

        // When
        let update = ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // Then
        assert_eq!(update.assignment.status, AssignmentStatus::CalledIn);
        assert_eq!(update.nurse.current_weekly_hours, Decimal::from(12));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(12));
    }

    #[tokio::test]
    async fn call_in__should_be_idempotent() {
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);

        let first = ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let second = ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();

        assert_eq!(first.assignment, second.assignment);
        assert_eq!(hours(&store, ana.id).await, Decimal::from(12));
    }

    #[tokio::test]
    async fn call_in_out_in__should_account_for_exactly_one_shift() {
        // Given
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);
        let before = hours(&store, ana.id).await;

        // When
        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let out = ledger.call_out(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let back = ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // Then
        assert_eq!(out.assignment.status, AssignmentStatus::CalledOut);
        assert_eq!(out.nurse.current_weekly_hours, before);
        assert_eq!(back.assignment.status, AssignmentStatus::CalledIn);
        assert_eq!(back.nurse.current_weekly_hours, before + Decimal::from(12));
    }

    #[tokio::test]
    async fn call_in__should_reject_when_cap_would_be_exceeded() {
        // Given max 12h, 10h already worked, 4h shifts
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        store.create_work_day(date("2024-07-02"), DAY, 2).await.unwrap();
        store.create_work_day(date("2024-07-03"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", Some(12)).await;
        let ledger = ledger(&store, 4);
        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();
        ledger.call_in(date("2024-07-02"), DAY, ana.id).await.unwrap();
        ledger.call_out(date("2024-07-02"), DAY, ana.id).await.unwrap();
        let ten = ShiftPolicy {
            shift_hours: Decimal::from(6),
            ..ShiftPolicy::default()
        };
        AssignmentLedger::new(Arc::new(store.clone()), ten)
            .call_in(date("2024-07-02"), DAY, ana.id)
            .await
            .unwrap();
        assert_eq!(hours(&store, ana.id).await, Decimal::from(10));

        // When
        let err = ledger.call_in(date("2024-07-03"), DAY, ana.id).await.unwrap_err();

        // Then
        assert!(matches!(err, AppError::CapacityExceeded { .. }));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(10));
        let slot = store.find_work_day_by_slot(date("2024-07-03"), DAY).await.unwrap().unwrap();
        assert!(store.find_assignment(slot.id, ana.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_call_ins__should_add_hours_once() {
        // Given
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana_id = nurse(&store, "ana@nicu.org", None).await.id;
        let ledger = ledger(&store, 12);

        // When
        let (a, b) = tokio::join!(
            {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.call_in(date("2024-07-01"), DAY, ana_id).await })
            },
            {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.call_in(date("2024-07-01"), DAY, ana_id).await })
            }
        );

        // Then
        let results = [a.unwrap(), b.unwrap()];
        assert!(results.iter().any(|r| r.is_ok()));
        for result in &results {
            match result {
                Ok(update) => assert_eq!(update.assignment.status, AssignmentStatus::CalledIn),
                Err(err) => assert!(matches!(err, AppError::Conflict(_))),
            }
        }
        assert_eq!(hours(&store, ana_id).await, Decimal::from(12));
    }

    #[tokio::test]
    async fn call_in__should_reject_overlapping_active_shift() {
        // Given 13h shifts: day 07:00-20:00 overlaps night from 19:00
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        store.create_work_day(date("2024-07-01"), ShiftType::Night, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 13);
        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // When
        let err = ledger
            .call_in(date("2024-07-01"), ShiftType::Night, ana.id)
            .await
            .unwrap_err();

        // Then
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(13));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_call_ins_from_separate_ledgers__should_book_only_one() {
        // Given two ledgers with their own locks over one store, as two
        // server instances sharing a database, and 13h shifts
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        store.create_work_day(date("2024-07-01"), ShiftType::Night, 2).await.unwrap();
        let ana_id = nurse(&store, "ana@nicu.org", None).await.id;
        let first = ledger(&store, 13);
        let second = ledger(&store, 13);

        // When
        let (day, night) = tokio::join!(
            tokio::spawn(async move { first.call_in(date("2024-07-01"), DAY, ana_id).await }),
            tokio::spawn(async move {
                second.call_in(date("2024-07-01"), ShiftType::Night, ana_id).await
            })
        );

        // Then
        let results = [day.unwrap(), night.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));
        assert_eq!(hours(&store, ana_id).await, Decimal::from(13));
    }

    #[tokio::test]
    async fn apply_transition__should_recheck_overlap_and_time_off_at_commit() {
        // Given 13h shifts and ana already called in for the day shift
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let night = store
            .create_work_day(date("2024-07-01"), ShiftType::Night, 2)
            .await
            .unwrap();
        let tuesday = store.create_work_day(date("2024-07-02"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let policy = ShiftPolicy {
            shift_hours: Decimal::from(13),
            ..ShiftPolicy::default()
        };
        AssignmentLedger::new(Arc::new(store.clone()), policy.clone())
            .call_in(date("2024-07-01"), DAY, ana.id)
            .await
            .unwrap();
        let request = store.insert_time_off(ana.id, date("2024-07-02"), None).await.unwrap();
        store
            .decide_time_off(request.id, TimeOffStatus::Approved, Uuid::new_v4())
            .await
            .unwrap();
        let stale = |work_day: WorkDay| SlotTransition {
            nurse_id: ana.id,
            expected: AssignmentStatus::Available,
            next: AssignmentStatus::CalledIn,
            hours_delta: Decimal::from(13),
            blocking_slots: policy
                .blocking_slots(work_day.date, work_day.shift_type)
                .unwrap(),
            work_day,
        };

        // When commits arrive that were prepared before either fact was known
        let overlap = store.apply_transition(&stale(night.clone())).await;
        let on_leave = store.apply_transition(&stale(tuesday.clone())).await;

        // Then
        assert!(matches!(overlap, Err(AppError::Conflict(_))));
        assert!(matches!(on_leave, Err(AppError::Conflict(_))));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(13));
        assert!(store.find_assignment(night.id, ana.id).await.unwrap().is_none());
        assert!(store.find_assignment(tuesday.id, ana.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn call_in__should_reject_shift_ending_past_the_calendar() {
        // Given ana called in for the day shift on the last representable date
        let store = MemoryStore::new();
        store.create_work_day(NaiveDate::MAX, DAY, 2).await.unwrap();
        store.create_work_day(NaiveDate::MAX, ShiftType::Night, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);
        ledger.call_in(NaiveDate::MAX, DAY, ana.id).await.unwrap();

        // When
        let err = ledger
            .call_in(NaiveDate::MAX, ShiftType::Night, ana.id)
            .await
            .unwrap_err();

        // Then
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(12));
    }

    #[tokio::test]
    async fn call_in__should_allow_back_to_back_twelve_hour_shifts() {
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        store.create_work_day(date("2024-07-01"), ShiftType::Night, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);

        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let night = ledger.call_in(date("2024-07-01"), ShiftType::Night, ana.id).await;

        assert!(night.is_ok());
        assert_eq!(hours(&store, ana.id).await, Decimal::from(24));
    }

    #[tokio::test]
    async fn call_in__should_reject_nurse_on_approved_time_off() {
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let request = store.insert_time_off(ana.id, date("2024-07-01"), None).await.unwrap();
        store
            .decide_time_off(request.id, TimeOffStatus::Approved, Uuid::new_v4())
            .await
            .unwrap();

        let err = ledger(&store, 12)
            .call_in(date("2024-07-01"), DAY, ana.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn call_in__should_fail_without_work_day() {
        let store = MemoryStore::new();
        let ana = nurse(&store, "ana@nicu.org", None).await;

        let err = ledger(&store, 12)
            .call_in(date("2024-07-01"), DAY, ana.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn call_out__should_reject_available_nurse_and_ignore_repeat() {
        // Given
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);

        // When
        let not_scheduled = ledger.call_out(date("2024-07-01"), DAY, ana.id).await;
        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();
        ledger.call_out(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let repeat = ledger.call_out(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // Then
        assert!(matches!(not_scheduled, Err(AppError::Conflict(_))));
        assert_eq!(repeat.assignment.status, AssignmentStatus::CalledOut);
        assert_eq!(hours(&store, ana.id).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn assign_then_call_in__should_conflict_and_call_out_frees_hours() {
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);

        let assigned = ledger.assign(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let call_in = ledger.call_in(date("2024-07-01"), DAY, ana.id).await;
        let out = ledger.call_out(date("2024-07-01"), DAY, ana.id).await.unwrap();

        assert_eq!(assigned.assignment.status, AssignmentStatus::Assigned);
        assert!(matches!(call_in, Err(AppError::Conflict(_))));
        assert_eq!(out.nurse.current_weekly_hours, Decimal::ZERO);
    }

    #[tokio::test]
    async fn release__should_return_called_out_nurse_to_available() {
        // Given
        let store = MemoryStore::new();
        let work_day = store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let ledger = ledger(&store, 12);
        ledger.call_in(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // When
        let too_early = ledger.release(date("2024-07-01"), DAY, ana.id).await;
        ledger.call_out(date("2024-07-01"), DAY, ana.id).await.unwrap();
        let released = ledger.release(date("2024-07-01"), DAY, ana.id).await.unwrap();

        // Then
        assert!(matches!(too_early, Err(AppError::Conflict(_))));
        assert_eq!(released.assignment.status, AssignmentStatus::Available);
        assert!(store.find_assignment(work_day.id, ana.id).await.unwrap().is_none());
        assert_eq!(hours(&store, ana.id).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn publish__should_assign_every_entry_and_tolerate_republish() {
        let store = MemoryStore::new();
        store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let ana = nurse(&store, "ana@nicu.org", None).await;
        let bia = nurse(&store, "bia@nicu.org", None).await;
        let ledger = ledger(&store, 12);
        let entries = vec![
            PublishEntry { date: date("2024-07-01"), shift_type: DAY, emp_id: ana.id },
            PublishEntry { date: date("2024-07-01"), shift_type: DAY, emp_id: bia.id },
        ];

        let first = ledger.publish(&entries).await.unwrap();
        let again = ledger.publish(&entries).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(again.iter().all(|a| a.status == AssignmentStatus::Assigned));
        assert_eq!(hours(&store, ana.id).await, Decimal::from(12));
        assert_eq!(hours(&store, bia.id).await, Decimal::from(12));
    }
}
