//! Date arithmetic for booking test data.
//!
//! Every helper takes the reference day explicitly so results are
//! reproducible; [`today`] supplies the local date for live runs.

use crate::result::{PageError, PageResult};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use std::fmt;
use tracing::debug;

/// Default display format, `MM/dd/yyyy`
pub const DEFAULT_FORMAT: &str = "%m/%d/%Y";

/// ISO format used in booking URLs
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Local calendar date
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Days from `today` until the next `weekday`, in `1..=7`
///
/// The same weekday counts as a week away.
#[must_use]
pub fn days_until_next_weekday(today: NaiveDate, weekday: Weekday) -> u32 {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    match (target + 7 - current) % 7 {
        0 => 7,
        days => days,
    }
}

/// Date of the next `weekday` after `today`
#[must_use]
pub fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    future_date(today, i64::from(days_until_next_weekday(today, weekday)))
}

/// `base` shifted by `days`; negative values go back
#[must_use]
pub fn future_date(base: NaiveDate, days: i64) -> NaiveDate {
    base + Duration::days(days)
}

/// Format with a chrono pattern such as [`DEFAULT_FORMAT`]
#[must_use]
pub fn format_date(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Absolute whole days between two dates
#[must_use]
pub fn days_between(a: NaiveDate, b: NaiveDate) -> u64 {
    (b - a).num_days().unsigned_abs()
}

/// English weekday name
#[must_use]
pub const fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Check-in and check-out dates of a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    /// First night
    pub check_in: NaiveDate,
    /// Departure day
    pub check_out: NaiveDate,
}

impl Stay {
    /// Nights between check-in and check-out
    #[must_use]
    pub fn nights(&self) -> u64 {
        days_between(self.check_in, self.check_out)
    }
}

impl fmt::Display for Stay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            format_date(self.check_in, DEFAULT_FORMAT),
            format_date(self.check_out, DEFAULT_FORMAT)
        )
    }
}

/// Stay starting `offset_days` after `today` for `nights` nights
#[must_use]
pub fn hotel_dates(today: NaiveDate, offset_days: i64, nights: u32) -> Stay {
    let check_in = future_date(today, offset_days);
    let stay = Stay {
        check_in,
        check_out: future_date(check_in, i64::from(nights)),
    };
    debug!(%stay, "Hotel dates");
    stay
}

/// Stay starting on the next Friday or Saturday
///
/// # Errors
///
/// [`PageError::InvalidArgument`] for any other start day.
pub fn weekend_stay(today: NaiveDate, start: Weekday, nights: u32) -> PageResult<Stay> {
    if !matches!(start, Weekday::Fri | Weekday::Sat) {
        return Err(PageError::invalid_argument(format!(
            "weekend stays start on Friday or Saturday, not {}",
            day_name(start)
        )));
    }
    let check_in = next_weekday(today, start);
    let stay = Stay {
        check_in,
        check_out: future_date(check_in, i64::from(nights)),
    };
    debug!(%stay, start = day_name(start), "Weekend stay");
    Ok(stay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-16 is a Friday
    const FRIDAY: (i32, u32, u32) = (2026, 10, 16);

    fn friday() -> NaiveDate {
        date(FRIDAY.0, FRIDAY.1, FRIDAY.2)
    }

    #[test]
    fn test_next_friday_from_friday_is_a_week() {
        assert_eq!(days_until_next_weekday(friday(), Weekday::Fri), 7);
        assert_eq!(next_weekday(friday(), Weekday::Fri), date(2026, 10, 23));
    }

    #[test]
    fn test_days_until_next_weekday() {
        assert_eq!(days_until_next_weekday(friday(), Weekday::Sat), 1);
        assert_eq!(days_until_next_weekday(friday(), Weekday::Thu), 6);
        assert_eq!(days_until_next_weekday(date(2026, 10, 19), Weekday::Fri), 4);
    }

    #[test]
    fn test_hotel_dates() {
        let stay = hotel_dates(date(2026, 12, 30), 2, 3);
        assert_eq!(stay.check_in, date(2027, 1, 1));
        assert_eq!(stay.check_out, date(2027, 1, 4));
        assert_eq!(stay.nights(), 3);
        assert_eq!(stay.to_string(), "01/01/2027 to 01/04/2027");
    }

    #[test]
    fn test_weekend_stay() {
        let stay = weekend_stay(date(2026, 10, 19), Weekday::Sat, 1).unwrap();
        assert_eq!(stay.check_in, date(2026, 10, 24));
        assert_eq!(stay.check_out.weekday(), Weekday::Sun);
        let err = weekend_stay(friday(), Weekday::Sun, 2).unwrap_err();
        assert!(matches!(err, PageError::InvalidArgument { .. }));
    }

    #[test]
    fn test_format_and_between() {
        assert_eq!(format_date(friday(), DEFAULT_FORMAT), "10/16/2026");
        assert_eq!(format_date(friday(), ISO_FORMAT), "2026-10-16");
        assert_eq!(days_between(date(2026, 3, 1), date(2026, 2, 1)), 28);
        assert_eq!(day_name(Weekday::Wed), "Wednesday");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_next_weekday_lands_on_target(offset in 0i64..3650, target in 0u8..7) {
                let today = future_date(date(2020, 1, 1), offset);
                let weekday = Weekday::try_from(target).unwrap();
                let next = next_weekday(today, weekday);
                prop_assert_eq!(next.weekday(), weekday);
                prop_assert!((1..=7).contains(&days_between(today, next)));
            }
        }
    }
}
