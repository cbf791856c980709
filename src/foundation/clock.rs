use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::foundation::error::{SnapError, SnapResult};

/// Local calendar day in ISO `YYYY-MM-DD` form.
///
/// The string form sorts lexicographically in chronological order, which the relief ladder relies
/// on when it keeps the most recent days.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    /// Build from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// Parse and validate an ISO day string.
    pub fn parse(s: &str) -> SnapResult<Self> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| SnapError::validation(format!("invalid day key '{s}': {e}")))?;
        Ok(Self::from_date(date))
    }

    /// Borrow the ISO string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of "today" and "now" for the store.
pub trait Clock: Send + Sync {
    /// Current local calendar day.
    fn today(&self) -> DayKey;
    /// Current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall clock in the process' local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayKey {
        DayKey::from_date(chrono::Local::now().date_naive())
    }

    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and replay tooling.
///
/// Clones share state, so a test can keep a handle and roll the day over while the store owns
/// another clone.
#[derive(Clone, Debug)]
pub struct FixedClock {
    inner: Arc<Mutex<FixedClockState>>,
}

#[derive(Debug)]
struct FixedClockState {
    today: DayKey,
    now_millis: i64,
}

impl FixedClock {
    /// Start at `day` (ISO string) with the millisecond counter at `now_millis`.
    pub fn new(day: &str, now_millis: i64) -> SnapResult<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(FixedClockState {
                today: DayKey::parse(day)?,
                now_millis,
            })),
        })
    }

    /// Move the clock to another calendar day.
    pub fn set_today(&self, day: &str) -> SnapResult<()> {
        let day = DayKey::parse(day)?;
        self.lock().today = day;
        Ok(())
    }

    /// Advance the millisecond counter.
    pub fn advance_millis(&self, delta: i64) {
        self.lock().now_millis += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixedClockState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayKey {
        self.lock().today.clone()
    }

    fn now_millis(&self) -> i64 {
        let mut s = self.lock();
        let now = s.now_millis;
        // Consecutive commits get distinct timestamps.
        s.now_millis += 1;
        now
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/clock.rs"]
mod tests;
