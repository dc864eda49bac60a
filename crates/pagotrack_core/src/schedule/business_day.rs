//! Business-day arithmetic.
//!
//! # Responsibility
//! - Advance civil timestamps by N business days, skipping weekends.
//!
//! # Invariants
//! - Each advance moves at least one calendar day, even when the start
//!   already falls on a weekday.
//! - The result of a positive advance never lands on Saturday or Sunday.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Returns whether `date` falls on a Monday–Friday weekday.
pub fn is_business_day(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() <= 5
}

/// Advances `start` by `count` business days.
///
/// Each business-day step first moves one calendar day forward, then keeps
/// advancing while the date lands on a weekend. Steps are applied
/// sequentially; this is not "add N calendar days then clamp".
///
/// The time-of-day component of `start` is preserved.
pub fn add_business_days(start: NaiveDateTime, count: u32) -> NaiveDateTime {
    let mut current = start;
    for _ in 0..count {
        current += Duration::days(1);
        while !is_business_day(current.date()) {
            current += Duration::days(1);
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::{add_business_days, is_business_day};
    use chrono::{NaiveDate, NaiveDateTime, Weekday};
    use chrono::Datelike;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn weekdays_are_business_days() {
        assert!(is_business_day(
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap()
        ));
        assert!(!is_business_day(
            NaiveDate::from_ymd_opt(2025, 8, 9).unwrap()
        ));
        assert!(!is_business_day(
            NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()
        ));
    }

    #[test]
    fn advances_within_a_week() {
        // Monday + 2 business days = Wednesday.
        let result = add_business_days(at(2025, 8, 4, 10), 2);
        assert_eq!(result, at(2025, 8, 6, 10));
    }

    #[test]
    fn skips_weekend_when_crossing_friday() {
        // Thursday + 2 business days = Monday.
        let result = add_business_days(at(2025, 8, 7, 9), 2);
        assert_eq!(result, at(2025, 8, 11, 9));
    }

    #[test]
    fn weekend_start_advances_to_weekdays() {
        // Saturday + 2 business days = Tuesday; the first step absorbs
        // the remaining weekend days.
        let result = add_business_days(at(2025, 8, 9, 16), 2);
        assert_eq!(result, at(2025, 8, 12, 16));
    }

    #[test]
    fn zero_count_is_identity() {
        let start = at(2025, 8, 9, 12);
        assert_eq!(add_business_days(start, 0), start);
    }

    #[test]
    fn positive_advance_never_lands_on_weekend() {
        let mut day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for _ in 0..365 {
            let result = add_business_days(day.and_hms_opt(11, 0, 0).unwrap(), 1);
            let weekday = result.date().weekday();
            assert_ne!(weekday, Weekday::Sat);
            assert_ne!(weekday, Weekday::Sun);
            day = day.succ_opt().unwrap();
        }
    }
}
