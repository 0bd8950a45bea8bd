// src/services/shift_policy.rs

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::models::work_day::ShiftType;

/// Fixed shift windows. Every shift lasts `shift_hours`; a night shift runs
/// into the next calendar day.
#[derive(Debug, Clone)]
pub struct ShiftPolicy {
    pub day_start: NaiveTime,
    pub night_start: NaiveTime,
    pub shift_hours: Decimal,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            night_start: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
            shift_hours: Decimal::from(12),
        }
    }
}

impl ShiftPolicy {
    /// Hours credited to (or debited from) a nurse for one shift.
    pub fn duration_hours(&self, _shift_type: ShiftType) -> Decimal {
        self.shift_hours
    }

    /// Half-open `[start, end)` window of a slot. `None` when the window
    /// does not fit in the calendar.
    pub fn window(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start_time = match shift_type {
            ShiftType::Day => self.day_start,
            ShiftType::Night => self.night_start,
        };
        let minutes = (self.duration_hours(shift_type) * Decimal::from(60))
            .round()
            .to_i64()?;
        let start = date.and_time(start_time);
        let end = start.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Some((start, end))
    }

    pub fn overlaps(
        &self,
        a: (NaiveDate, ShiftType),
        b: (NaiveDate, ShiftType),
    ) -> Option<bool> {
        let (a_start, a_end) = self.window(a.0, a.1)?;
        let (b_start, b_end) = self.window(b.0, b.1)?;
        Some(a_start < b_end && b_start < a_end)
    }

    /// Other slots whose window intersects the slot's own. Shifts last at
    /// most a day, so only neighbouring dates are candidates. Slots whose
    /// window does not fit in the calendar can never be active and are
    /// skipped. `None` when the slot's own window does not fit.
    pub fn blocking_slots(
        &self,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> Option<Vec<(NaiveDate, ShiftType)>> {
        let target = (date, shift_type);
        self.window(date, shift_type)?;

        let neighbours = [
            date.checked_sub_days(Days::new(1)),
            Some(date),
            date.checked_add_days(Days::new(1)),
        ];
        let blocking = neighbours
            .into_iter()
            .flatten()
            .flat_map(|d| [(d, ShiftType::Day), (d, ShiftType::Night)])
            .filter(|&slot| slot != target && self.overlaps(slot, target) == Some(true))
            .collect();
        Some(blocking)
    }
}
