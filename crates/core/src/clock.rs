//! Time source abstraction.
//!
//! The daily reset is keyed on the *local* calendar date, so services ask a
//! [`Clock`] for both the current instant and today's date instead of calling
//! `chrono` directly. Tests drive a [`ManualClock`] across midnight.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

use crate::types::{CalendarDate, Timestamp};

/// Source of "now" for the economy services.
pub trait Clock: Send + Sync {
    /// Current instant (UTC).
    fn now(&self) -> Timestamp;

    /// Calendar date of `at` in the device's local time zone.
    fn local_date(&self, at: Timestamp) -> CalendarDate;

    /// Today's calendar date in the device's local time zone.
    fn today(&self) -> CalendarDate {
        self.local_date(self.now())
    }
}

/// Wall clock backed by the system time and local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn local_date(&self, at: Timestamp) -> CalendarDate {
        at.with_timezone(&Local).date_naive()
    }
}

/// Settable clock with a fixed local offset (UTC unless given).
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
    offset: FixedOffset,
}

impl ManualClock {
    /// Create a UTC clock frozen at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self::with_offset(at, Utc.fix())
    }

    /// Create a clock frozen at `at` whose local dates use `offset`.
    pub fn with_offset(at: Timestamp, offset: FixedOffset) -> Self {
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
            offset,
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn local_date(&self, at: Timestamp) -> CalendarDate {
        at.with_timezone(&self.offset).date_naive()
    }
}
