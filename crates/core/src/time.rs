use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Time source abstraction so services and tests share one notion of "now".
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock backed by the system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock pinned to the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock represents real time.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Calendar-day distance from `now` to `target`, ignoring time of day.
///
/// Both sides are truncated to midnight UTC before differencing, so the
/// result only changes when the UTC date rolls over. Positive means `target`
/// is in the future, zero means today, negative means past.
#[must_use]
pub fn calendar_days_between(target: NaiveDate, now: DateTime<Utc>) -> i64 {
    target.signed_duration_since(now.date_naive()).num_days()
}

/// Deterministic timestamp for tests and examples (2025-10-09T08:53:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_760_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` pinned at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable_until_advanced() {
        let mut clock = fixed_clock();
        let first = clock.now();
        assert_eq!(clock.now(), first);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), first + Duration::seconds(90));
    }

    #[test]
    fn calendar_days_ignore_time_of_day() {
        let target = NaiveDate::from_ymd_opt(2025, 10, 12).expect("valid date");

        let morning = fixed_now().date_naive().and_hms_opt(0, 0, 1).unwrap().and_utc();
        let night = fixed_now()
            .date_naive()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc();

        assert_eq!(calendar_days_between(target, morning), 3);
        assert_eq!(calendar_days_between(target, night), 3);
    }

    #[test]
    fn calendar_days_sign_convention() {
        let now = fixed_now();
        let today = now.date_naive();

        assert_eq!(calendar_days_between(today, now), 0);
        assert_eq!(calendar_days_between(today + Duration::days(10), now), 10);
        assert_eq!(calendar_days_between(today - Duration::days(2), now), -2);
    }
}
