//! Countdown engine for the daily and weekly reset timers.
//!
//! A countdown targets the next reset boundary (local midnight, or local
//! midnight of the next Monday), publishes the remaining time once per
//! second, and at rollover asks the host to reload the page. The engine is
//! a small state machine:
//!
//! ```text
//! Ticking --(remaining <= 0)--> Expired --(request_reload)--> ReloadRequested
//! ```
//!
//! Nothing is published after `Ticking` is left. The display and the
//! reload are injected capabilities ([`DisplaySink`], [`Reloader`]) so the
//! engine runs the same under test as on a live page.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::error::ComponentError;

/// Fixed cadence between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

const SECONDS_PER_DAY: i64 = 86_400;

/// Longest DST gap we step over when local midnight does not exist.
const MAX_GAP_HOURS: i64 = 3;

/// Which reset boundary a countdown tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountdownKind {
    Daily,
    Weekly,
}

impl CountdownKind {
    pub const ALL: [CountdownKind; 2] = [CountdownKind::Daily, CountdownKind::Weekly];

    /// Id of the display element this countdown writes into.
    pub fn display_id(self) -> &'static str {
        match self {
            Self::Daily => "daily-countdown",
            Self::Weekly => "weekly-countdown",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Days from `now`'s calendar date to the reset date. Never zero.
    fn days_until_reset(self, date: NaiveDate) -> u64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => {
                // Sunday = 0, Monday = 1, ... Monday itself maps to a full week.
                let weekday = u64::from(date.weekday().num_days_from_sunday());
                match (8 - weekday) % 7 {
                    0 => 7,
                    n => n,
                }
            }
        }
    }

    /// The next reset instant strictly after `now`, in `now`'s time zone.
    pub fn next_reset<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let today = now.date_naive();
        let days = self.days_until_reset(today);
        let date = today
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX);
        local_midnight(&now.timezone(), date)
    }

    /// Render a remaining duration. Negative durations render as zero.
    pub fn format_remaining(self, remaining: TimeDelta) -> String {
        let total = remaining.num_seconds().max(0);
        let hours_total = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        match self {
            Self::Daily => format!("{:02}:{:02}:{:02}", hours_total, minutes, seconds),
            Self::Weekly => {
                let days = total / SECONDS_PER_DAY;
                let hours = (total % SECONDS_PER_DAY) / 3600;
                if days > 0 {
                    format!("{:02}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
                } else {
                    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
                }
            }
        }
    }
}

/// Midnight at the start of `date` in `tz`.
///
/// Ambiguous local times resolve to the earliest instant. When midnight is
/// skipped by a DST transition, the first whole hour after it that exists
/// is used instead.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight: NaiveDateTime = date.and_time(chrono::NaiveTime::MIN);
    for hour in 0..=MAX_GAP_HOURS {
        if let Some(instant) = tz
            .from_local_datetime(&(midnight + TimeDelta::hours(hour)))
            .earliest()
        {
            return instant;
        }
    }
    tz.from_utc_datetime(&midnight)
}

/// Lifecycle phase of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ticking,
    Expired,
    ReloadRequested,
}

/// What a single tick produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Publish this text and keep ticking.
    Display(String),
    /// The target was reached on this tick; a reload must be requested.
    Expired,
    /// The countdown already left `Ticking`; nothing to do.
    Halted,
}

/// Receives formatted countdown text.
pub trait DisplaySink: Send + 'static {
    fn publish(&mut self, text: String);
}

/// Performs a full page reload.
pub trait Reloader: Send + 'static {
    fn reload(&mut self) -> Result<(), ComponentError>;
}

/// Countdown state: kind, target instant, phase.
#[derive(Debug, Clone)]
pub struct CountdownEngine<Tz: TimeZone> {
    kind: CountdownKind,
    target: DateTime<Tz>,
    phase: Phase,
}

impl<Tz: TimeZone> CountdownEngine<Tz> {
    pub fn new(kind: CountdownKind, now: &DateTime<Tz>) -> Self {
        let target = kind.next_reset(now);
        tracing::debug!(kind = kind.name(), reset_at = ?target, "Countdown target computed");
        Self {
            kind,
            target,
            phase: Phase::Ticking,
        }
    }

    pub fn kind(&self) -> CountdownKind {
        self.kind
    }

    pub fn target(&self) -> &DateTime<Tz> {
        &self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self, now: &DateTime<Tz>) -> TimeDelta {
        self.target.clone().signed_duration_since(now.clone())
    }

    /// Advance the state machine to `now`.
    pub fn tick(&mut self, now: &DateTime<Tz>) -> TickOutcome {
        if self.phase != Phase::Ticking {
            return TickOutcome::Halted;
        }
        let remaining = self.remaining(now);
        if remaining <= TimeDelta::zero() {
            tracing::info!(kind = self.kind.name(), "Countdown reached its reset boundary");
            self.phase = Phase::Expired;
            return TickOutcome::Expired;
        }
        TickOutcome::Display(self.kind.format_remaining(remaining))
    }

    /// Leave `Expired` by asking the host to reload. A failed reload is
    /// logged and swallowed; the display keeps its last value either way.
    pub fn request_reload<R: Reloader + ?Sized>(&mut self, reloader: &mut R) {
        if self.phase != Phase::Expired {
            return;
        }
        self.phase = Phase::ReloadRequested;
        if let Err(e) = reloader.reload() {
            tracing::warn!(kind = self.kind.name(), error = %e, "Reload failed, countdown frozen");
        }
    }
}

/// Handle to a running countdown task.
pub struct CountdownHandle {
    kind: CountdownKind,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Phase>,
}

impl CountdownHandle {
    pub fn kind(&self) -> CountdownKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop ticking and wait for the task, returning its final phase.
    pub async fn stop(mut self) -> Phase {
        if let Some(tx) = self.stop_tx.take() {
            // The task may already have exited on its own.
            let _ = tx.send(());
        }
        match (&mut self.task).await {
            Ok(phase) => phase,
            Err(e) => {
                tracing::error!(kind = self.kind.name(), error = %e, "Countdown task failed");
                Phase::Ticking
            }
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        if self.stop_tx.is_some() {
            self.task.abort();
        }
    }
}

/// Start a countdown.
///
/// The first tick runs before this function returns, so the display never
/// starts blank. Later ticks follow every [`TICK_INTERVAL`], each one
/// finishing its publish before the next is scheduled. The task ends once
/// the countdown expires (after requesting the reload) or when stopped.
pub fn spawn_countdown<C, S, R>(
    kind: CountdownKind,
    clock: C,
    mut sink: S,
    mut reloader: R,
) -> CountdownHandle
where
    C: Clock,
    <C::Tz as TimeZone>::Offset: Send + Sync + 'static,
    S: DisplaySink,
    R: Reloader,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let mut engine = CountdownEngine::new(kind, &clock.now());

    let finished = match engine.tick(&clock.now()) {
        TickOutcome::Display(text) => {
            sink.publish(text);
            false
        }
        TickOutcome::Expired => {
            engine.request_reload(&mut reloader);
            true
        }
        TickOutcome::Halted => true,
    };

    let task = tokio::spawn(async move {
        if finished {
            return engine.phase();
        }
        let start = tokio::time::Instant::now() + TICK_INTERVAL;
        let mut ticker = tokio::time::interval_at(start, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut stop_rx => {
                    tracing::debug!(kind = kind.name(), "Countdown stopped");
                    break;
                }

                _ = ticker.tick() => {
                    match engine.tick(&clock.now()) {
                        TickOutcome::Display(text) => sink.publish(text),
                        TickOutcome::Expired => {
                            engine.request_reload(&mut reloader);
                            break;
                        }
                        TickOutcome::Halted => break,
                    }
                }
            }
        }
        engine.phase()
    });

    CountdownHandle {
        kind,
        stop_tx: Some(stop_tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc, Weekday};
    use pretty_assertions::assert_eq;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_daily_reset_is_next_midnight() {
        let now = utc(2025, 12, 9, 15, 45, 0);
        assert_eq!(CountdownKind::Daily.next_reset(&now), utc(2025, 12, 10, 0, 0, 0));
    }

    #[test]
    fn test_daily_reset_at_midnight_is_a_full_day_away() {
        let now = utc(2025, 12, 9, 0, 0, 0);
        assert_eq!(CountdownKind::Daily.next_reset(&now), utc(2025, 12, 10, 0, 0, 0));
    }

    #[test]
    fn test_daily_reset_crosses_year() {
        let now = utc(2025, 12, 31, 23, 59, 59);
        assert_eq!(CountdownKind::Daily.next_reset(&now), utc(2026, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_daily_reset_uses_local_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 23:30 UTC is already 01:30 the next day at +02:00.
        let now = utc(2025, 12, 9, 23, 30, 0).with_timezone(&tz);
        let next = CountdownKind::Daily.next_reset(&now);
        assert_eq!(next, tz.with_ymd_and_hms(2025, 12, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_reset_from_each_weekday() {
        // 2025-12-08 is a Monday.
        let expected_monday = utc(2025, 12, 15, 0, 0, 0);
        for day in 9..=14 {
            let now = utc(2025, 12, day, 12, 0, 0);
            assert_eq!(
                CountdownKind::Weekly.next_reset(&now),
                expected_monday,
                "day {day}"
            );
        }
    }

    #[test]
    fn test_weekly_reset_on_monday_midnight_is_seven_days() {
        let now = utc(2025, 12, 8, 0, 0, 0);
        assert_eq!(now.weekday(), Weekday::Mon);
        assert_eq!(
            CountdownKind::Weekly.next_reset(&now),
            now + TimeDelta::days(7)
        );
    }

    #[test]
    fn test_weekly_reset_from_sunday_is_one_day() {
        let now = utc(2025, 12, 14, 23, 0, 0);
        assert_eq!(CountdownKind::Weekly.next_reset(&now), utc(2025, 12, 15, 0, 0, 0));
    }

    // America/Santiago springs forward at midnight: 2024-09-08 00:00 -04
    // does not exist, the day starts at 01:00 -03.
    #[test]
    fn test_daily_reset_in_midnight_gap_is_first_instant_after() {
        use chrono_tz::America::Santiago;
        let now = Santiago.with_ymd_and_hms(2024, 9, 7, 23, 30, 0).unwrap();
        let next = CountdownKind::Daily.next_reset(&now);

        assert_eq!(next, Santiago.with_ymd_and_hms(2024, 9, 8, 1, 0, 0).unwrap());
        assert_eq!(next.naive_utc(), utc(2024, 9, 8, 4, 0, 0).naive_utc());
        assert_eq!(CountdownKind::Daily.format_remaining(next - now), "00:30:00");
    }

    #[test]
    fn test_weekly_reset_across_midnight_gap() {
        use chrono_tz::America::Santiago;
        let now = Santiago.with_ymd_and_hms(2024, 9, 7, 23, 30, 0).unwrap();
        let next = CountdownKind::Weekly.next_reset(&now);

        assert_eq!(next, Santiago.with_ymd_and_hms(2024, 9, 9, 0, 0, 0).unwrap());
        // 24.5 wall-clock hours, one of which is skipped.
        assert_eq!(CountdownKind::Weekly.format_remaining(next - now), "23:30:00");
    }

    // America/Havana falls back from 01:00 CDT to 00:00 CST on 2024-11-03,
    // so that midnight happens twice.
    #[test]
    fn test_daily_reset_at_ambiguous_midnight_is_earliest() {
        use chrono::{LocalResult, Offset};
        use chrono_tz::America::Havana;
        let midnight = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(matches!(
            Havana.from_local_datetime(&midnight),
            LocalResult::Ambiguous(_, _)
        ));

        let now = Havana.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let next = CountdownKind::Daily.next_reset(&now);

        assert_eq!(next.naive_local(), midnight);
        assert_eq!(next.offset().fix().local_minus_utc(), -4 * 3600);
        assert_eq!(CountdownKind::Daily.format_remaining(next - now), "12:00:00");
    }

    #[test]
    fn test_weekly_reset_after_fall_back() {
        use chrono::Offset;
        use chrono_tz::America::Havana;
        let now = Havana.with_ymd_and_hms(2024, 11, 2, 12, 0, 0).unwrap();
        let next = CountdownKind::Weekly.next_reset(&now);

        assert_eq!(next, Havana.with_ymd_and_hms(2024, 11, 4, 0, 0, 0).unwrap());
        assert_eq!(next.offset().fix().local_minus_utc(), -5 * 3600);
        // The repeated hour makes this stretch 37 hours long.
        assert_eq!(CountdownKind::Weekly.format_remaining(next - now), "01:13:00:00");
    }

    #[test]
    fn test_daily_format() {
        let daily = CountdownKind::Daily;
        assert_eq!(daily.format_remaining(TimeDelta::seconds(3661)), "01:01:01");
        assert_eq!(daily.format_remaining(TimeDelta::seconds(0)), "00:00:00");
        // Hours are not wrapped at 24.
        assert_eq!(daily.format_remaining(TimeDelta::seconds(90_000)), "25:00:00");
    }

    #[test]
    fn test_weekly_format() {
        let weekly = CountdownKind::Weekly;
        assert_eq!(weekly.format_remaining(TimeDelta::seconds(90_000)), "01:01:00:00");
        assert_eq!(weekly.format_remaining(TimeDelta::seconds(3661)), "01:01:01");
        assert_eq!(weekly.format_remaining(TimeDelta::seconds(86_400)), "01:00:00:00");
        assert_eq!(weekly.format_remaining(TimeDelta::seconds(86_399)), "23:59:59");
    }

    #[test]
    fn test_negative_durations_clamp_to_zero() {
        for kind in CountdownKind::ALL {
            assert_eq!(
                kind.format_remaining(TimeDelta::seconds(-5)),
                kind.format_remaining(TimeDelta::zero())
            );
        }
    }

    #[test]
    fn test_subsecond_remainder_truncates() {
        let remaining = TimeDelta::milliseconds(1_999);
        assert_eq!(CountdownKind::Daily.format_remaining(remaining), "00:00:01");
    }

    struct FailingReloader;

    impl Reloader for FailingReloader {
        fn reload(&mut self) -> Result<(), ComponentError> {
            Err(ComponentError::ReloadUnavailable("no host".into()))
        }
    }

    #[test]
    fn test_engine_phases() {
        let start = utc(2025, 12, 9, 23, 59, 58);
        let mut engine = CountdownEngine::new(CountdownKind::Daily, &start);
        assert_eq!(engine.phase(), Phase::Ticking);

        assert_eq!(engine.tick(&start), TickOutcome::Display("00:00:02".into()));
        let midnight = utc(2025, 12, 10, 0, 0, 0);
        assert_eq!(engine.tick(&midnight), TickOutcome::Expired);
        assert_eq!(engine.phase(), Phase::Expired);

        engine.request_reload(&mut FailingReloader);
        assert_eq!(engine.phase(), Phase::ReloadRequested);
        assert_eq!(engine.tick(&midnight), TickOutcome::Halted);
    }

    #[test]
    fn test_request_reload_only_from_expired() {
        let start = utc(2025, 12, 9, 12, 0, 0);
        let mut engine = CountdownEngine::new(CountdownKind::Daily, &start);
        engine.request_reload(&mut FailingReloader);
        assert_eq!(engine.phase(), Phase::Ticking);
    }
}
