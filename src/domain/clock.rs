//! Source of "now" for time-sensitive validation.

use std::fmt::Debug;

use chrono::{Local, NaiveDateTime};

/// Supplies the current naive local time.
///
/// Injected into the reservation service; tests use [`FixedClock`].
pub trait Clock: Send + Sync + Debug {
    /// Current wall-clock time without offset.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
