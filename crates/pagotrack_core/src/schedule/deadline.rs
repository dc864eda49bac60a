//! Resolution-deadline policy.
//!
//! # Responsibility
//! - Compute the civil timestamp by which an observation slip must be
//!   resolved, from its issuance timestamp.
//!
//! # Invariants
//! - All timestamps are civil time for `America/Mexico_City`; callers never
//!   pass raw UTC values into [`compute_deadline`].
//! - The computed deadline never falls on a weekend.

use crate::schedule::business_day::add_business_days;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

/// Civil timezone in which every deadline rule is evaluated.
pub const CIVIL_TZ: Tz = chrono_tz::America::Mexico_City;

/// Slips issued at or after this hour count from the next calendar day.
pub const CUTOFF_HOUR: u32 = 15;

/// From this day of month onward the shortened closing-period term applies.
pub const CLOSING_DAY: u32 = 25;

/// Converts a UTC instant into the civil wall-clock time used by the
/// deadline rules. This is the only sanctioned entry point from UTC.
pub fn local_civil_time(at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&CIVIL_TZ).naive_local()
}

/// Computes the resolution deadline for a slip issued at `issued_at`.
///
/// Policy:
/// - Issued at or after 15:00: the term starts one calendar day later and
///   the due time is pinned to 15:00:00.
/// - Issued on day 25 or later (closing period): 1 business day; otherwise
///   2 business days.
/// - Weekends never count; an earlier time-of-day is retained when the
///   issue was not late.
///
/// Quirk: the late-issue adjustment is described in operating rules as
/// moving the due time to next-day opening hours, yet the enforced value is
/// the cutoff hour itself (15:00). That behavior is load-bearing for every
/// already-issued late slip and is preserved here; do not change it to
/// 09:00 without a rules sign-off.
pub fn compute_deadline(issued_at: NaiveDateTime) -> NaiveDateTime {
    let late_issue = issued_at.hour() >= CUTOFF_HOUR;

    let mut base = issued_at;
    if late_issue {
        base += Duration::days(1);
    }

    let business_days = if issued_at.day() >= CLOSING_DAY { 1 } else { 2 };
    let deadline = add_business_days(base, business_days);

    if late_issue {
        let due_time = NaiveTime::from_hms_opt(CUTOFF_HOUR, 0, 0).expect("valid due time");
        deadline.date().and_time(due_time)
    } else {
        deadline
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_deadline, local_civil_time, CIVIL_TZ};
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

    fn civil(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn regular_issue_adds_two_business_days_keeping_time() {
        // Monday morning, well before cutoff and closing period.
        let deadline = compute_deadline(civil(2025, 8, 4, 10, 0));
        assert_eq!(deadline, civil(2025, 8, 6, 10, 0));
    }

    #[test]
    fn late_issue_shifts_base_and_pins_due_time() {
        // Friday 16:00: base becomes Saturday, two business-day steps land
        // on Tuesday, due time pinned to 15:00.
        let deadline = compute_deadline(civil(2025, 8, 8, 16, 0));
        assert_eq!(deadline, civil(2025, 8, 12, 15, 0));
    }

    #[test]
    fn closing_period_adds_single_business_day() {
        let deadline = compute_deadline(civil(2025, 8, 26, 11, 20));
        assert_eq!(deadline, civil(2025, 8, 27, 11, 20));
    }

    #[test]
    fn late_issue_in_closing_period_combines_both_rules() {
        // Thursday the 28th at 17:00: base Friday, one business-day step
        // lands on Monday, due 15:00.
        let deadline = compute_deadline(civil(2025, 8, 28, 17, 0));
        assert_eq!(deadline, civil(2025, 9, 1, 15, 0));
    }

    #[test]
    fn exact_cutoff_hour_counts_as_late() {
        // Monday 15:00 sharp: base Tuesday, two steps land on Thursday.
        let deadline = compute_deadline(civil(2025, 8, 4, 15, 0));
        assert_eq!(deadline, civil(2025, 8, 7, 15, 0));
    }

    #[test]
    fn local_civil_time_converts_from_utc() {
        // Mexico City is UTC-6 on this date (no DST since 2022).
        let utc = Utc.with_ymd_and_hms(2025, 8, 4, 20, 30, 0).unwrap();
        assert_eq!(local_civil_time(utc), civil(2025, 8, 4, 14, 30));

        let civil_back = CIVIL_TZ
            .from_local_datetime(&civil(2025, 8, 4, 14, 30))
            .unwrap();
        assert_eq!(civil_back.with_timezone(&Utc), utc);
    }
}
