// src/db/assignment_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PgStore,
    models::{
        assignment::{Assignment, AssignmentStatus, SlotTransition},
        nurse::Nurse,
        work_day::{ShiftType, WorkDay},
    },
};

const ASSIGNMENT_COLUMNS: &str = r#"
    a.work_day_id, a.nurse_id, w.date, w.shift_type, a.status, a.updated_at
"#;

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persisted row only; `None` means the nurse is available for the slot.
    async fn find_assignment(
        &self,
        work_day_id: Uuid,
        nurse_id: Uuid,
    ) -> Result<Option<Assignment>, AppError>;

    /// Persisted rows of a nurse for work days in `[from, to]`.
    async fn list_nurse_assignments(
        &self,
        nurse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Assignment>, AppError>;

    /// Nurses in `assigned` or `called-in` for the work day.
    async fn list_active_nurses(&self, work_day_id: Uuid) -> Result<Vec<Nurse>, AppError>;

    /// Nurses neither active on the work day nor on approved time off that
    /// date. Answered from a single snapshot.
    async fn list_unassigned_nurses(&self, work_day: &WorkDay) -> Result<Vec<Nurse>, AppError>;

    async fn count_active(&self, work_day_id: Uuid) -> Result<i64, AppError>;

    /// Applies the status change and the hours delta atomically.
    ///
    /// Fails with `Conflict` when the slot is no longer in `expected`, or
    /// when an active `next` meets approved time off on the date or an
    /// active assignment on one of `blocking_slots`. Fails with
    /// `CapacityExceeded` when the delta would break the nurse's cap and
    /// `NotFound` for an unknown nurse. Nothing is written on failure.
    async fn apply_transition(
        &self,
        transition: &SlotTransition,
    ) -> Result<(Assignment, Nurse), AppError>;
}

#[async_trait]
impl AssignmentRepository for PgStore {
    async fn find_assignment(
        &self,
        work_day_id: Uuid,
        nurse_id: Uuid,
    ) -> Result<Option<Assignment>, AppError> {
        let sql = format!(
            "SELECT {} FROM assignments a JOIN work_days w ON w.id = a.work_day_id \
             WHERE a.work_day_id = $1 AND a.nurse_id = $2",
            ASSIGNMENT_COLUMNS
        );
        let assignment = sqlx::query_as::<_, Assignment>(&sql)
            .bind(work_day_id)
            .bind(nurse_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(assignment)
    }

    async fn list_nurse_assignments(
        &self,
        nurse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Assignment>, AppError> {
        let sql = format!(
            "SELECT {} FROM assignments a JOIN work_days w ON w.id = a.work_day_id \
             WHERE a.nurse_id = $1 AND w.date BETWEEN $2 AND $3 \
             ORDER BY w.date ASC, w.shift_type ASC",
            ASSIGNMENT_COLUMNS
        );
        let assignments = sqlx::query_as::<_, Assignment>(&sql)
            .bind(nurse_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(assignments)
    }

    async fn list_active_nurses(&self, work_day_id: Uuid) -> Result<Vec<Nurse>, AppError> {
        let nurses = sqlx::query_as::<_, Nurse>(
            r#"
            SELECT n.* FROM nurses n
            JOIN assignments a ON a.nurse_id = n.id
            WHERE a.work_day_id = $1 AND a.status IN ('ASSIGNED', 'CALLED_IN')
            ORDER BY n.name ASC
            "#,
        )
        .bind(work_day_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(nurses)
    }

    async fn list_unassigned_nurses(&self, work_day: &WorkDay) -> Result<Vec<Nurse>, AppError> {
        let nurses = sqlx::query_as::<_, Nurse>(
            r#"
            SELECT n.* FROM nurses n
            WHERE NOT EXISTS (
                SELECT 1 FROM assignments a
                WHERE a.nurse_id = n.id
                  AND a.work_day_id = $1
                  AND a.status IN ('ASSIGNED', 'CALLED_IN')
            )
            AND NOT EXISTS (
                SELECT 1 FROM time_off_requests t
                WHERE t.nurse_id = n.id
                  AND t.date = $2
                  AND t.status = 'APPROVED'
            )
            ORDER BY n.name ASC
            "#,
        )
        .bind(work_day.id)
        .bind(work_day.date)
        .fetch_all(&self.pool)
        .await?;
        Ok(nurses)
    }

    async fn count_active(&self, work_day_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM assignments
            WHERE work_day_id = $1 AND status IN ('ASSIGNED', 'CALLED_IN')
            "#,
        )
        .bind(work_day_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn apply_transition(
        &self,
        transition: &SlotTransition,
    ) -> Result<(Assignment, Nurse), AppError> {
        let work_day = &transition.work_day;
        let mut tx = self.pool.begin().await?;

        // 1. Lock the nurse row: every ledger write for this nurse, from any
        //    process, queues here, so the checks below see committed state.
        let nurse = sqlx::query_as::<_, Nurse>("SELECT * FROM nurses WHERE id = $1 FOR UPDATE")
            .bind(transition.nurse_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nurse {}", transition.nurse_id)))?;

        // 2. Compare-and-set on the slot status
        let current = sqlx::query_scalar::<_, AssignmentStatus>(
            "SELECT status FROM assignments WHERE work_day_id = $1 AND nurse_id = $2",
        )
        .bind(work_day.id)
        .bind(transition.nurse_id)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(AssignmentStatus::Available);

        if current != transition.expected {
            return Err(AppError::Conflict(format!(
                "Slot {} for nurse {} changed concurrently (now {})",
                work_day.slot_label(),
                transition.nurse_id,
                current
            )));
        }

        // 3. Approved time off and overlapping active shifts
        if transition.next.is_active() {
            let on_leave = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM time_off_requests
                    WHERE nurse_id = $1 AND date = $2 AND status = 'APPROVED'
                )
                "#,
            )
            .bind(transition.nurse_id)
            .bind(work_day.date)
            .fetch_one(&mut *tx)
            .await?;
            if on_leave {
                return Err(AppError::Conflict(format!(
                    "{} has approved time off on {}",
                    nurse.name, work_day.date
                )));
            }

            let (dates, shifts): (Vec<NaiveDate>, Vec<ShiftType>) =
                transition.blocking_slots.iter().copied().unzip();
            let clash = sqlx::query_as::<_, (NaiveDate, ShiftType, AssignmentStatus)>(
                r#"
                SELECT w.date, w.shift_type, a.status
                FROM assignments a
                JOIN work_days w ON w.id = a.work_day_id
                JOIN UNNEST($2::date[], $3::shift_type[]) AS s(date, shift_type)
                  ON s.date = w.date AND s.shift_type = w.shift_type
                WHERE a.nurse_id = $1 AND a.status IN ('ASSIGNED', 'CALLED_IN')
                LIMIT 1
                "#,
            )
            .bind(transition.nurse_id)
            .bind(dates)
            .bind(shifts)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some((date, shift_type, status)) = clash {
                return Err(AppError::Conflict(format!(
                    "{} is already {} for the overlapping shift {}/{}",
                    nurse.name, status, date, shift_type
                )));
            }
        }

        // 4. Hours cap, checked against the locked row
        if nurse.exceeds_cap(transition.hours_delta) {
            return Err(AppError::CapacityExceeded {
                current: nurse.current_weekly_hours,
                requested: transition.hours_delta,
                max: nurse.max_weekly_hours.unwrap_or_default(),
            });
        }

        let nurse = sqlx::query_as::<_, Nurse>(
            r#"
            UPDATE nurses SET current_weekly_hours = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(nurse.hours_after(transition.hours_delta))
        .bind(transition.nurse_id)
        .fetch_one(&mut *tx)
        .await?;

        // 5. Write the slot. `available` is the absence of a row.
        let assignment = if transition.next == AssignmentStatus::Available {
            sqlx::query("DELETE FROM assignments WHERE work_day_id = $1 AND nurse_id = $2")
                .bind(work_day.id)
                .bind(transition.nurse_id)
                .execute(&mut *tx)
                .await?;
            Assignment::vacant(work_day, transition.nurse_id)
        } else {
            let (status, updated_at) = sqlx::query_as::<_, (AssignmentStatus, DateTime<Utc>)>(
                r#"
                INSERT INTO assignments (work_day_id, nurse_id, status, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (work_day_id, nurse_id)
                DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
                RETURNING status, updated_at
                "#,
            )
            .bind(work_day.id)
            .bind(transition.nurse_id)
            .bind(transition.next)
            .fetch_one(&mut *tx)
            .await?;

            Assignment {
                status,
                updated_at: Some(updated_at),
                ..Assignment::vacant(work_day, transition.nurse_id)
            }
        };

        tx.commit().await?;
        Ok((assignment, nurse))
    }
}
