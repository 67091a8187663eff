//! Wall-clock sources.
//!
//! Components never read the system time directly; they are handed a
//! [`Clock`] so tests and headless hosts can pin or advance time.

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use std::sync::{Arc, Mutex};

/// Supplies the current instant in a specific time zone.
pub trait Clock: Send + Sync + 'static {
    type Tz: TimeZone + Send + Sync + 'static;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// The viewer's wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock<Tz: TimeZone> {
    now: Arc<Mutex<DateTime<Tz>>>,
}

impl<Tz: TimeZone> ManualClock<Tz> {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Tz>) {
        // A poisoned lock still holds a valid instant.
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = instant;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = guard.clone() + by;
    }
}

impl<Tz> Clock for ManualClock<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.now.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2025, 12, 9, 23, 59, 58).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        other.advance(TimeDelta::seconds(2));
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 12, 10, 0, 0, 0).unwrap());

        clock.set(start);
        assert_eq!(other.now(), start);
    }
}
