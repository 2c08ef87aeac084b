//! The run clock: one instant, one time zone, captured at startup.
//!
//! The calendar date stamped on every fetched row is half of the dedup key,
//! so it must come from a single configured IANA zone (e.g. `Asia/Shanghai`)
//! rather than from whatever zone the host happens to run in. A run that
//! straddles midnight still stamps both datasets with the same date because
//! the instant is taken once.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// `YYYY-MM-DD`, the date format stored in the history files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD HH:MM:SS`, the timestamp format written to the run log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses an IANA zone name such as `"Asia/Shanghai"`.
pub fn parse_tz(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    now: DateTime<Tz>,
}

impl RunClock {
    /// Captures the current instant in `tz`.
    pub fn now_in(tz: Tz) -> Self {
        Self::at(Utc::now(), tz)
    }

    /// Pins the clock to a given instant, for reproducible runs.
    pub fn at(instant: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            now: instant.with_timezone(&tz),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// The local calendar date used as the `日期` key component.
    pub fn today(&self) -> String {
        self.date().format(DATE_FORMAT).to_string()
    }

    pub fn timestamp(&self) -> String {
        self.now.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn shanghai_is_already_tomorrow_at_utc_evening() {
        // 2024-03-10 17:30Z is 2024-03-11 01:30 in Shanghai (+08:00).
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 17, 30, 0).unwrap();
        let clock = RunClock::at(instant, parse_tz("Asia/Shanghai").unwrap());

        assert_eq!(clock.today(), "2024-03-11");
        assert_eq!(clock.timestamp(), "2024-03-11 01:30:00");
    }

    #[test]
    fn same_instant_differs_by_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 17, 30, 0).unwrap();
        let utc = RunClock::at(instant, parse_tz("UTC").unwrap());
        let sh = RunClock::at(instant, parse_tz("Asia/Shanghai").unwrap());

        assert_ne!(utc.date(), sh.date());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(parse_tz("Mars/Olympus_Mons").is_none());
        assert!(parse_tz(" Asia/Shanghai ").is_some());
    }
}
