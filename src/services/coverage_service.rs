// src/services/coverage_service.rs

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DynStore,
    models::{
        assignment::{AssignmentStatus, AvailableNurse, CoverageSummary, ScheduledShift},
        nurse::Nurse,
        work_day::ShiftType,
    },
};

// Read-only views over work days and the ledger. Each view is a single
// store call, so it never mixes two points in time.
#[derive(Clone)]
pub struct CoverageService {
    store: DynStore,
}

impl CoverageService {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Nurses who can still be called in: not active on the slot and not on
    /// approved time off that date. Called-out nurses are included.
    pub async fn list_available(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<Vec<AvailableNurse>, AppError> {
        let work_day = self
            .store
            .find_work_day_by_slot(date, shift_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}/{}", date, shift_type)))?;

        let nurses = self.store.list_unassigned_nurses(&work_day).await?;
        Ok(nurses
            .into_iter()
            .map(|nurse| AvailableNurse {
                nurse,
                call_in_status: AssignmentStatus::Available,
            })
            .collect())
    }

    /// Nurses assigned or called in. An unknown slot has nobody on it.
    pub async fn list_assigned(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<Vec<Nurse>, AppError> {
        match self.store.find_work_day_by_slot(date, shift_type).await? {
            Some(work_day) => self.store.list_active_nurses(work_day.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn coverage(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<CoverageSummary, AppError> {
        let work_day = self
            .store
            .find_work_day_by_slot(date, shift_type)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work day {}/{}", date, shift_type)))?;

        let active_count = self.store.count_active(work_day.id).await?;
        let required_employees = work_day.required_employees;
        Ok(CoverageSummary {
            shortfall: (i64::from(required_employees) - active_count).max(0),
            active_count,
            required_employees,
            work_day,
        })
    }

    /// Active shifts of one nurse for the seven days starting at `start`.
    pub async fn nurse_week(
        &self,
        nurse_id: Uuid,
        start: NaiveDate,
    ) -> Result<Vec<ScheduledShift>, AppError> {
        if self.store.find_nurse(nurse_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Nurse {}", nurse_id)));
        }

        let end = start
            .checked_add_days(Days::new(6))
            .ok_or_else(|| AppError::BadRequest(format!("Start date {} is out of range", start)))?;
        let assignments = self
            .store
            .list_nurse_assignments(nurse_id, start, end)
            .await?;

        Ok(assignments
            .into_iter()
            .filter(|a| a.status.is_active())
            .map(ScheduledShift::from)
            .collect())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NurseRepository, TimeOffRepository, WorkDayRepository};
    use crate::models::{nurse::NewNurse, time_off::TimeOffStatus};
    use crate::services::{AssignmentLedger, ShiftPolicy};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    const DAY: ShiftType = ShiftType::Day;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct Fixture {
        store: MemoryStore,
        coverage: CoverageService,
        ledger: AssignmentLedger,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let dyn_store: DynStore = Arc::new(store.clone());
        Fixture {
            coverage: CoverageService::new(dyn_store.clone()),
            ledger: AssignmentLedger::new(dyn_store, ShiftPolicy::default()),
            store,
        }
    }

    async fn nurse(store: &MemoryStore, name: &str) -> Nurse {
        store
            .create_nurse(NewNurse {
                name: name.into(),
                phone: None,
                email: format!("{}@nicu.org", name.to_lowercase()),
                password_hash: "not-a-real-hash".into(),
                max_weekly_hours: None,
            })
            .await
            .unwrap()
    }

    fn names(nurses: impl IntoIterator<Item = Nurse>) -> Vec<String> {
        nurses.into_iter().map(|n| n.name).collect()
    }

    #[tokio::test]
    async fn call_in_flow__should_move_nurse_between_views() {
        // Given a day slot needing two nurses, A and B both free
        let f = fixture();
        f.store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let a = nurse(&f.store, "Alice").await;
        let b = nurse(&f.store, "Bea").await;

        // When A is called in
        let available_before = f.coverage.list_available(date("2024-07-01"), DAY).await.unwrap();
        let update = f.ledger.call_in(date("2024-07-01"), DAY, a.id).await.unwrap();

        // Then
        assert_eq!(available_before.len(), 2);
        assert_eq!(update.nurse.current_weekly_hours, Decimal::from(12));
        let available = f.coverage.list_available(date("2024-07-01"), DAY).await.unwrap();
        assert_eq!(names(available.into_iter().map(|n| n.nurse)), vec!["Bea"]);
        let assigned = f.coverage.list_assigned(date("2024-07-01"), DAY).await.unwrap();
        assert_eq!(names(assigned), vec!["Alice"]);
        let summary = f.coverage.coverage(date("2024-07-01"), DAY).await.unwrap();
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.shortfall, 1);

        // When A is called out
        let out = f.ledger.call_out(date("2024-07-01"), DAY, a.id).await.unwrap();

        // Then A is offered again and the shift hours are returned
        assert_eq!(out.nurse.current_weekly_hours, Decimal::ZERO);
        assert!(f.coverage.list_assigned(date("2024-07-01"), DAY).await.unwrap().is_empty());
        let available = f.coverage.list_available(date("2024-07-01"), DAY).await.unwrap();
        assert_eq!(names(available.into_iter().map(|n| n.nurse)), vec!["Alice", "Bea"]);
        let b = f.store.find_nurse(b.id).await.unwrap().unwrap();
        assert_eq!(b.current_weekly_hours, Decimal::ZERO);
    }

    #[tokio::test]
    async fn list_available__should_exclude_nurse_with_approved_time_off() {
        // Given
        let f = fixture();
        f.store.create_work_day(date("2024-07-01"), DAY, 2).await.unwrap();
        let a = nurse(&f.store, "Alice").await;
        nurse(&f.store, "Bea").await;
        let request = f.store.insert_time_off(a.id, date("2024-07-01"), None).await.unwrap();

        // When pending, A is still offered
        let pending = f.coverage.list_available(date("2024-07-01"), DAY).await.unwrap();
        f.store
            .decide_time_off(request.id, TimeOffStatus::Approved, Uuid::new_v4())
            .await
            .unwrap();
        let approved = f.coverage.list_available(date("2024-07-01"), DAY).await.unwrap();

        // Then
        assert_eq!(pending.len(), 2);
        assert_eq!(names(approved.into_iter().map(|n| n.nurse)), vec!["Bea"]);
    }

    #[tokio::test]
    async fn list_available__should_fail_without_work_day_while_list_assigned_is_empty() {
        let f = fixture();
        nurse(&f.store, "Alice").await;

        let available = f.coverage.list_available(date("2024-07-01"), DAY).await;
        let assigned = f.coverage.list_assigned(date("2024-07-01"), DAY).await.unwrap();

        assert!(matches!(available, Err(AppError::NotFound(_))));
        assert!(assigned.is_empty());
    }

    #[tokio::test]
    async fn coverage__should_report_zero_shortfall_when_overstaffed() {
        let f = fixture();
        f.store.create_work_day(date("2024-07-01"), DAY, 1).await.unwrap();
        let a = nurse(&f.store, "Alice").await;
        let b = nurse(&f.store, "Bea").await;
        f.ledger.assign(date("2024-07-01"), DAY, a.id).await.unwrap();
        f.ledger.call_in(date("2024-07-01"), DAY, b.id).await.unwrap();

        let summary = f.coverage.coverage(date("2024-07-01"), DAY).await.unwrap();

        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.shortfall, 0);
    }

    #[tokio::test]
    async fn nurse_week__should_list_active_shifts_in_the_seven_day_window() {
        // Given
        let f = fixture();
        for d in ["2024-07-01", "2024-07-03", "2024-07-07", "2024-07-08"] {
            f.store.create_work_day(date(d), DAY, 2).await.unwrap();
        }
        let a = nurse(&f.store, "Alice").await;
        f.ledger.assign(date("2024-07-01"), DAY, a.id).await.unwrap();
        f.ledger.call_in(date("2024-07-03"), DAY, a.id).await.unwrap();
        f.ledger.call_out(date("2024-07-03"), DAY, a.id).await.unwrap();
        f.ledger.call_in(date("2024-07-07"), DAY, a.id).await.unwrap();
        f.ledger.call_in(date("2024-07-08"), DAY, a.id).await.unwrap();

        // When
        let week = f.coverage.nurse_week(a.id, date("2024-07-01")).await.unwrap();

        // Then
        let dates: Vec<NaiveDate> = week.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date("2024-07-01"), date("2024-07-07")]);
        assert_eq!(week[0].status, AssignmentStatus::Assigned);
        assert_eq!(week[1].status, AssignmentStatus::CalledIn);
    }

    #[tokio::test]
    async fn nurse_week__should_reject_unknown_nurse() {
        let f = fixture();

        let err = f.coverage.nurse_week(Uuid::new_v4(), date("2024-07-01")).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
