use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use pagotrack_core::schedule::business_day::{add_business_days, is_business_day};
use pagotrack_core::{compute_deadline, local_civil_time, CLOSING_DAY, CUTOFF_HOUR};
use proptest::prelude::*;

fn civil(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn midmonth_before_cutoff_gets_two_business_days() {
    // Monday 2025-08-04 10:00 -> Wednesday 2025-08-06 10:00.
    assert_eq!(
        compute_deadline(civil(2025, 8, 4, 10, 0)),
        civil(2025, 8, 6, 10, 0)
    );
}

#[test]
fn after_cutoff_rolls_to_next_day_pinned_at_cutoff() {
    // Friday 2025-08-08 16:00: base moves to Saturday 15:00, plus two
    // business days lands Tuesday 2025-08-12 15:00.
    assert_eq!(
        compute_deadline(civil(2025, 8, 8, 16, 0)),
        civil(2025, 8, 12, 15, 0)
    );
}

#[test]
fn closing_window_shortens_the_term_to_one_business_day() {
    // Tuesday 2025-08-26 11:20, on or after day 25.
    assert_eq!(
        compute_deadline(civil(2025, 8, 26, 11, 20)),
        civil(2025, 8, 27, 11, 20)
    );
}

#[test]
fn closing_window_after_cutoff_combines_both_rules() {
    // Thursday 2025-08-28 17:00: base Friday 15:00, one business day,
    // weekend skip lands Monday 2025-09-01 15:00.
    assert_eq!(
        compute_deadline(civil(2025, 8, 28, 17, 0)),
        civil(2025, 9, 1, 15, 0)
    );
}

#[test]
fn exactly_the_cutoff_hour_counts_as_late() {
    // Monday 2025-08-04 at 15:00 sharp: base Tuesday 15:00, two business
    // days -> Thursday 2025-08-07 15:00.
    assert_eq!(
        compute_deadline(civil(2025, 8, 4, 15, 0)),
        civil(2025, 8, 7, 15, 0)
    );
}

#[test]
fn civil_time_reads_the_mexico_city_wall_clock() {
    // 2025-08-04 15:00 UTC is 09:00 in Mexico City (UTC-6, no DST).
    let utc = chrono::DateTime::parse_from_rfc3339("2025-08-04T15:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    assert_eq!(local_civil_time(utc), civil(2025, 8, 4, 9, 0));
}

proptest! {
    /// A deadline never lands on a Saturday or Sunday.
    #[test]
    fn deadline_never_lands_on_a_weekend(
        day_offset in 0i64..730,
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
            + chrono::Duration::days(day_offset);
        let issued_at = date.and_hms_opt(hour, minute, 0).unwrap();
        let deadline = compute_deadline(issued_at);

        prop_assert!(is_business_day(deadline.date()));
        prop_assert_ne!(deadline.weekday(), Weekday::Sat);
        prop_assert_ne!(deadline.weekday(), Weekday::Sun);
    }

    /// Before the cutoff the time of day is carried over; at or after it
    /// the deadline is pinned to the cutoff hour.
    #[test]
    fn deadline_time_of_day_follows_the_cutoff_rule(
        day_offset in 0i64..730,
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
            + chrono::Duration::days(day_offset);
        let issued_at = date.and_hms_opt(hour, minute, 0).unwrap();
        let deadline = compute_deadline(issued_at);

        if hour >= CUTOFF_HOUR {
            prop_assert_eq!(deadline.hour(), CUTOFF_HOUR);
            prop_assert_eq!(deadline.minute(), 0);
        } else {
            prop_assert_eq!(deadline.hour(), hour);
            prop_assert_eq!(deadline.minute(), minute);
        }
    }

    /// The deadline is strictly after the issuance instant, and the
    /// closing-window term is never longer than the mid-month term.
    #[test]
    fn deadline_is_in_the_future(
        day_offset in 0i64..730,
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
            + chrono::Duration::days(day_offset);
        let issued_at = date.and_hms_opt(hour, minute, 0).unwrap();
        let deadline = compute_deadline(issued_at);

        prop_assert!(deadline > issued_at);
        // Worst case: late Friday in mid-month, two business days plus
        // weekend skips stay within a week.
        prop_assert!(deadline - issued_at <= chrono::Duration::days(7));
    }

    /// Issuing within the closing window never yields a later deadline
    /// than the same instant would get mid-month.
    #[test]
    fn closing_window_term_is_never_longer(
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        // Same weekday (Tuesday), one inside and one outside the window.
        let midmonth = civil(2025, 8, 12, hour, minute);
        let closing = civil(2025, 8, 26, hour, minute);
        prop_assert!(closing.day() >= CLOSING_DAY);

        let midmonth_term = compute_deadline(midmonth) - midmonth;
        let closing_term = compute_deadline(closing) - closing;
        prop_assert!(closing_term <= midmonth_term);
    }
}

#[test]
fn business_day_helpers_skip_weekends() {
    let friday = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
    assert!(is_business_day(friday));
    assert!(!is_business_day(friday.succ_opt().unwrap()));

    // Friday 12:00 plus one business day is Monday 12:00.
    let start = friday.and_hms_opt(12, 0, 0).unwrap();
    assert_eq!(add_business_days(start, 1), civil(2025, 8, 11, 12, 0));
    assert_eq!(add_business_days(start, 2), civil(2025, 8, 12, 12, 0));
}
