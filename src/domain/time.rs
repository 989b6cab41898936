use chrono::{Months, NaiveDate};

/// Number of calendar days in the closed interval [start, end].
pub fn day_count_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Days of [start, end] that fall inside [period_start, period_end].
/// All bounds are inclusive; disjoint intervals contribute 0.
pub fn overlap_days(
    start: NaiveDate,
    end: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> i64 {
    let from = start.max(period_start);
    let to = end.min(period_end);
    if from > to {
        0
    } else {
        day_count_inclusive(from, to)
    }
}

/// First and last day of a calendar month, or `None` when `month` is not 1-12.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// Half-away-from-zero rounding to two decimals. Every persisted hour and
/// currency value goes through this.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_count_is_inclusive_on_both_ends() {
        assert_eq!(day_count_inclusive(d(2026, 3, 10), d(2026, 3, 10)), 1);
        assert_eq!(day_count_inclusive(d(2026, 3, 1), d(2026, 3, 31)), 31);
        assert_eq!(day_count_inclusive(d(2026, 2, 27), d(2026, 3, 2)), 4);
    }

    #[test]
    fn overlap_outside_period_is_zero() {
        assert_eq!(
            overlap_days(d(2026, 2, 1), d(2026, 2, 5), d(2026, 3, 1), d(2026, 3, 31)),
            0
        );
        assert_eq!(
            overlap_days(d(2026, 4, 1), d(2026, 4, 3), d(2026, 3, 1), d(2026, 3, 31)),
            0
        );
    }

    #[test]
    fn overlap_inside_period_is_full_length() {
        assert_eq!(
            overlap_days(d(2026, 3, 10), d(2026, 3, 12), d(2026, 3, 1), d(2026, 3, 31)),
            3
        );
    }

    #[test]
    fn overlap_is_clamped_at_both_ends() {
        // spills into the previous month
        assert_eq!(
            overlap_days(d(2026, 2, 27), d(2026, 3, 2), d(2026, 3, 1), d(2026, 3, 31)),
            2
        );
        // spills into the next month
        assert_eq!(
            overlap_days(d(2026, 3, 30), d(2026, 4, 2), d(2026, 3, 1), d(2026, 3, 31)),
            2
        );
        // covers the whole period
        assert_eq!(
            overlap_days(d(2026, 2, 1), d(2026, 4, 30), d(2026, 3, 1), d(2026, 3, 31)),
            31
        );
    }

    #[test]
    fn month_bounds_handles_month_lengths() {
        assert_eq!(month_bounds(2026, 1), Some((d(2026, 1, 1), d(2026, 1, 31))));
        assert_eq!(month_bounds(2026, 2), Some((d(2026, 2, 1), d(2026, 2, 28))));
        assert_eq!(month_bounds(2024, 2), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(month_bounds(2026, 12), Some((d(2026, 12, 1), d(2026, 12, 31))));
        assert_eq!(month_bounds(2026, 0), None);
        assert_eq!(month_bounds(2026, 13), None);
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        // .375 and .5 are exact in binary, so the half-way cases are real halves
        assert_eq!(round2(8.375), 8.38);
        assert_eq!(round2(-8.375), -8.38);
        assert_eq!(round2(209.375), 209.38);
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(0.0), 0.0);
    }
}
