//! Time and id sources for ledger rows.
//!
//! Operations never read the system clock directly. They take a [`Clock`] so
//! tests can pin timestamps and entry ids.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::cell::Cell;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub trait Clock {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// A globally unique ledger entry id.
    fn new_entry_id(&self) -> String;
}

/// Wall clock plus random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn new_entry_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic clock: a fixed time and sequential ids (`entry-1`, `entry-2`, ...).
#[derive(Debug)]
pub struct FixedClock {
    now_ms: Cell<i64>,
    next_id: Cell<u64>,
}

impl FixedClock {
    #[must_use]
    pub const fn at(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
            next_id: Cell::new(1),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: i64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }

    fn new_entry_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("entry-{id}")
    }
}

/// Milliseconds at local midnight of the day containing `now`, in `now`'s zone.
///
/// When midnight does not exist (a DST jump at 00:00) the earliest valid
/// instant of that day is used.
#[must_use]
pub fn start_of_day_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let date = now.date_naive();
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .or_else(|| {
            date.and_hms_opt(1, 0, 0)
                .and_then(|one| tz.from_local_datetime(&one).earliest())
        })
        .map_or_else(|| now.timestamp_millis(), |start| start.timestamp_millis())
}

/// Local midnight for a millisecond timestamp, using the host time zone.
#[must_use]
pub fn local_start_of_day_ms(now_ms: i64) -> i64 {
    Local
        .timestamp_millis_opt(now_ms)
        .earliest()
        .map_or(now_ms, |now| start_of_day_ms(&now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn fixed_clock_issues_sequential_ids() {
        let clock = FixedClock::at(1_000);
        assert_eq!(clock.new_entry_id(), "entry-1");
        assert_eq!(clock.new_entry_id(), "entry-2");
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
    }

    #[test]
    fn system_clock_ids_are_unique() {
        let clock = SystemClock;
        assert_ne!(clock.new_entry_id(), clock.new_entry_id());
    }

    #[test]
    fn start_of_day_respects_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).expect("offset");
        // 2024-03-10 01:30 at +02:00 is 2024-03-09 23:30 UTC.
        let now = tz
            .with_ymd_and_hms(2024, 3, 10, 1, 30, 0)
            .single()
            .expect("valid time");
        let start = start_of_day_ms(&now);
        let expected = tz
            .with_ymd_and_hms(2024, 3, 10, 0, 0, 0)
            .single()
            .expect("valid midnight")
            .timestamp_millis();
        assert_eq!(start, expected);
        assert_eq!(now.timestamp_millis() - start, 90 * 60 * 1000);
    }
}
