//! Expiration policy.
//!
//! Every write stores a calendar date alongside the cached value. An entry is
//! stale once more than `ttl_days` whole days separate that date from today.
//!
//! Freshly written entries are not stamped with today's date: the stored date
//! is pushed back by a random number of days within the TTL window, so a batch
//! of entries written together goes stale gradually over the following
//! `ttl_days` instead of all on the same day.

use rand::Rng;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, UtcDateTime};

/// Format of the `expiration_date` column (`YYYY-MM-DD`).
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Today's date in UTC.
pub fn today() -> Date {
    UtcDateTime::now().date()
}

/// Time-to-live window applied to every cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiration {
    ttl_days: u32,
}
impl Expiration {
    pub fn new(ttl_days: u32) -> Self {
        Self { ttl_days }
    }

    pub fn ttl_days(&self) -> u32 {
        self.ttl_days
    }

    /// The date to store with an entry written `today`.
    ///
    /// With `force_expired` the date is placed just outside the TTL window so
    /// the entry reads back as stale. Otherwise it lies uniformly within
    /// `[today - ttl_days, today - 1]`. A TTL of zero degrades to a fixed
    /// offset of one day rather than sampling from an empty range.
    pub fn expiration_date(&self, force_expired: bool, today: Date, rng: &mut impl Rng) -> Date {
        let days_back = match force_expired {
            true => i64::from(self.ttl_days) + 1,
            false => i64::from(rng.random_range(1..=self.ttl_days.max(1))),
        };
        today.checked_sub(Duration::days(days_back)).unwrap_or(Date::MIN)
    }

    /// Whether an entry stamped with `expiration` has outlived the TTL window.
    pub fn is_stale(&self, expiration: Date, today: Date) -> bool {
        (today - expiration).whole_days() > i64::from(self.ttl_days)
    }

    /// Staleness of a raw `expiration_date` column value.
    ///
    /// A missing or unparseable date reports the entry as stale so that the
    /// next successful write replaces it with a well-formed one.
    pub(crate) fn is_stale_column(&self, expiration: Option<&str>, today: Date) -> bool {
        let Some(raw) = expiration else {
            return true;
        };
        match Date::parse(raw, DATE_FORMAT) {
            Ok(date) => self.is_stale(date, today),
            Err(err) => {
                tracing::warn!(
                    expiration = raw,
                    error = %err,
                    "Malformed expiration date in cache; treating entry as stale"
                );
                true
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;
    use time::Month;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(60)]
    #[case(365)]
    fn test_fresh_dates_stay_within_window(#[case] ttl: u32) {
        let policy = Expiration::new(ttl);
        let today = date(2024, Month::June, 15);
        let mut rng = StdRng::seed_from_u64(u64::from(ttl));
        for _ in 0..500 {
            let expiration = policy.expiration_date(false, today, &mut rng);
            let age = (today - expiration).whole_days();
            assert!((1..=i64::from(ttl)).contains(&age), "age {age} outside [1, {ttl}]");
            assert!(!policy.is_stale(expiration, today));
        }
    }

    #[test]
    fn test_fresh_dates_are_spread_out() {
        let policy = Expiration::new(30);
        let today = date(2024, Month::June, 15);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(policy.expiration_date(false, today, &mut rng));
        }
        // Not every write lands on the same day.
        assert!(seen.len() > 10);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(60)]
    fn test_forced_dates_are_stale(#[case] ttl: u32) {
        let policy = Expiration::new(ttl);
        let today = date(2024, Month::June, 15);
        let expiration = policy.expiration_date(true, today, &mut StdRng::seed_from_u64(0));
        assert!(policy.is_stale(expiration, today));
    }

    #[test]
    fn test_zero_ttl_does_not_panic() {
        let policy = Expiration::new(0);
        let today = date(2024, Month::June, 15);
        let expiration = policy.expiration_date(false, today, &mut StdRng::seed_from_u64(0));
        assert_eq!(expiration, date(2024, Month::June, 14));
    }

    #[rstest]
    #[case(date(2024, Month::June, 15), false)]
    #[case(date(2024, Month::May, 16), false)]
    #[case(date(2024, Month::May, 15), true)]
    #[case(date(2023, Month::January, 1), true)]
    // Dates in the future are never stale.
    #[case(date(2024, Month::July, 1), false)]
    fn test_is_stale(#[case] expiration: Date, #[case] expected: bool) {
        // 2024-05-16 is exactly 30 days before 2024-06-15.
        let policy = Expiration::new(30);
        assert_eq!(policy.is_stale(expiration, date(2024, Month::June, 15)), expected);
    }

    #[rstest]
    #[case(Some("2024-06-01"), false)]
    #[case(Some("2020-01-01"), true)]
    #[case(Some("not a date"), true)]
    #[case(Some("2024-13-45"), true)]
    #[case(None, true)]
    fn test_is_stale_column(#[case] raw: Option<&str>, #[case] expected: bool) {
        let policy = Expiration::new(30);
        assert_eq!(policy.is_stale_column(raw, date(2024, Month::June, 15)), expected);
    }

    #[test]
    fn test_date_format() {
        let formatted = date(2024, Month::March, 5).format(DATE_FORMAT).unwrap();
        assert_eq!(formatted, "2024-03-05");
    }
}
