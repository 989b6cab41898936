use chrono::NaiveDateTime;

use super::time::round2;

/// Hours that make up a full shift; anything beyond counts as overtime.
pub const STANDARD_SHIFT_HOURS: f64 = 8.0;

/// Minimum whole minutes that must elapse between check-in and check-out.
pub const MINIMUM_SHIFT_MINUTES: i64 = 30;

/// Working and overtime hours for a check-in/check-out pair, both rounded to
/// two decimals. Overtime only accrues past the standard shift.
pub fn derive_hours(check_in: NaiveDateTime, check_out: NaiveDateTime) -> (f64, f64) {
    let working = round2((check_out - check_in).num_seconds() as f64 / 3600.0);
    let overtime = round2((working - STANDARD_SHIFT_HOURS).max(0.0));
    (working, overtime)
}

/// Minutes still to wait before checkout is allowed, if the minimum shift
/// duration has not elapsed yet. Elapsed time is truncated to whole minutes.
pub fn checkout_wait_minutes(check_in: NaiveDateTime, at: NaiveDateTime) -> Option<i64> {
    let elapsed = (at - check_in).num_minutes();
    if elapsed < MINIMUM_SHIFT_MINUTES {
        Some(MINIMUM_SHIFT_MINUTES - elapsed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 16)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn hours_are_rounded_to_two_decimals() {
        let (working, overtime) = derive_hours(at(9, 0), at(17, 30));
        assert_eq!(working, 8.5);
        assert_eq!(overtime, 0.5);

        // 7h50m = 7.8333... hours
        let (working, overtime) = derive_hours(at(9, 0), at(16, 50));
        assert_eq!(working, 7.83);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn exactly_standard_shift_has_no_overtime() {
        let (working, overtime) = derive_hours(at(9, 0), at(17, 0));
        assert_eq!(working, 8.0);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn overtime_is_working_hours_past_eight() {
        let (working, overtime) = derive_hours(at(8, 0), at(19, 15));
        assert_eq!(working, 11.25);
        assert_eq!(overtime, 3.25);
    }

    #[test]
    fn checkout_blocked_before_thirty_minutes() {
        // 09:00 -> 09:20 leaves 10 minutes to wait
        assert_eq!(checkout_wait_minutes(at(9, 0), at(9, 20)), Some(10));
        assert_eq!(checkout_wait_minutes(at(9, 0), at(9, 0)), Some(30));
    }

    #[test]
    fn checkout_allowed_at_exactly_thirty_minutes() {
        assert_eq!(checkout_wait_minutes(at(9, 0), at(9, 30)), None);
        assert_eq!(checkout_wait_minutes(at(9, 0), at(12, 0)), None);
    }
}
