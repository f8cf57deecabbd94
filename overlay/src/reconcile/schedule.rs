//! Reconcile timing
//!
//! A plain value polled with an [`Instant`] so the overlay loop and tests can
//! drive it without real timers.

use std::time::{Duration, Instant};

const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Wait after window creation before the first reconcile
    pub startup_delay: Duration,
    /// Period of the re-assert step
    pub interval: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            startup_delay: DEFAULT_STARTUP_DELAY,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Why a tick is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// First reconcile after the startup deferral
    Startup,
    /// The desired state changed
    Immediate,
    /// Periodic re-assert
    Periodic,
}

#[derive(Debug, Clone)]
pub struct ReconcileSchedule {
    options: ReconcileOptions,
    startup_at: Option<Instant>,
    immediate: bool,
    next_periodic: Instant,
}

impl ReconcileSchedule {
    pub fn new(created_at: Instant, options: ReconcileOptions) -> Self {
        let startup_at = created_at + options.startup_delay;
        Self {
            options,
            startup_at: Some(startup_at),
            immediate: false,
            next_periodic: startup_at + options.interval,
        }
    }

    /// Ask for a reconcile on the next poll (after the startup deferral)
    pub fn request_immediate(&mut self) {
        self.immediate = true;
    }

    /// Re-arm the startup tick one startup delay from `now`.
    /// Used when the window was not ready yet.
    pub fn defer(&mut self, now: Instant) {
        self.startup_at = Some(now + self.options.startup_delay);
    }

    /// Time of the next due tick, for sleeping
    pub fn next_due(&self) -> Instant {
        match self.startup_at {
            Some(at) => at,
            None => self.next_periodic,
        }
    }

    /// Return the tick due at `now`, if any
    pub fn poll(&mut self, now: Instant) -> Option<TickKind> {
        if let Some(at) = self.startup_at {
            if now < at {
                return None;
            }
            self.startup_at = None;
            self.immediate = false;
            self.next_periodic = now + self.options.interval;
            return Some(TickKind::Startup);
        }

        if self.immediate {
            self.immediate = false;
            return Some(TickKind::Immediate);
        }

        if now >= self.next_periodic {
            self.next_periodic = now + self.options.interval;
            return Some(TickKind::Periodic);
        }

        None
    }
}
