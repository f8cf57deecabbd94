//! Click-through controller
//!
//! Owns the desired and last-confirmed input-transparency state of the
//! overlay window and the protocol for applying it through
//! [`WindowStyleAccess`].

use tracing::{debug, info};

use crate::platform::{PlatformError, WindowStyleAccess};

/// Where the controller stands relative to the OS window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickThroughPhase {
    /// No platform call has succeeded yet
    Uninitialized,
    /// The OS-confirmed state matches the desired state
    Reconciled(bool),
    /// Desired state changed since the last confirmation
    Diverged,
}

/// Result of a successful reconcile/reassert step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Window handle not realized yet; nothing was done
    NotReady,
    /// Already in sync; no mutation performed
    Unchanged,
    /// Desired state is now confirmed on the window
    Applied,
    /// External reversion detected and repaired
    Restored,
}

/// Counters kept for the status report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Style writes that were confirmed by a read-back
    pub writes: u32,
    /// Writes that repaired a style changed outside this process
    pub restorations: u32,
    /// Failed reconcile/reassert steps
    pub failures: u32,
}

/// Drives the window's click-through style toward the desired value
#[derive(Debug, Clone)]
pub struct ClickThroughController {
    desired: bool,
    applied: Option<bool>,
    stats: ReconcileStats,
    last_error: Option<String>,
}

impl ClickThroughController {
    pub fn new(desired: bool) -> Self {
        Self {
            desired,
            applied: None,
            stats: ReconcileStats::default(),
            last_error: None,
        }
    }

    pub fn desired(&self) -> bool {
        self.desired
    }

    /// Last OS-confirmed state, `None` before the first successful call
    pub fn applied(&self) -> Option<bool> {
        self.applied
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Message of the most recent failure, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> ClickThroughPhase {
        match self.applied {
            None => ClickThroughPhase::Uninitialized,
            Some(applied) if applied == self.desired => ClickThroughPhase::Reconciled(applied),
            Some(_) => ClickThroughPhase::Diverged,
        }
    }

    /// Record intent. Never touches the OS. Returns true if the value changed.
    pub fn set_desired(&mut self, enabled: bool) -> bool {
        let changed = self.desired != enabled;
        self.desired = enabled;
        if changed {
            debug!(enabled, phase = ?self.phase(), "Click-through desired state changed");
        }
        changed
    }

    /// Apply the desired state if it differs from the last confirmed one.
    ///
    /// Returns `Unchanged` without any platform call when already in sync.
    pub fn reconcile<W>(&mut self, window: &mut W) -> Result<ReconcileOutcome, PlatformError>
    where
        W: WindowStyleAccess + ?Sized,
    {
        self.drive(window, false)
    }

    /// Verify the style on the window and repair it if it drifted.
    ///
    /// Always reads the style; writes only when the bits no longer express the
    /// desired state.
    pub fn reassert<W>(&mut self, window: &mut W) -> Result<ReconcileOutcome, PlatformError>
    where
        W: WindowStyleAccess + ?Sized,
    {
        self.drive(window, true)
    }

    fn drive<W>(&mut self, window: &mut W, verify: bool) -> Result<ReconcileOutcome, PlatformError>
    where
        W: WindowStyleAccess + ?Sized,
    {
        if !window.is_ready() {
            return Ok(ReconcileOutcome::NotReady);
        }

        let in_sync = self.applied == Some(self.desired);
        if in_sync && !verify {
            return Ok(ReconcileOutcome::Unchanged);
        }

        match self.enforce(window, in_sync) {
            Ok(outcome) => {
                self.last_error = None;
                Ok(outcome)
            }
            Err(e) => {
                self.stats.failures += 1;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn enforce<W>(&mut self, window: &mut W, in_sync: bool) -> Result<ReconcileOutcome, PlatformError>
    where
        W: WindowStyleAccess + ?Sized,
    {
        let desired = self.desired;
        let current = window.read_style()?;

        if current.satisfies(desired) {
            self.applied = Some(desired);
            return Ok(if in_sync {
                ReconcileOutcome::Unchanged
            } else {
                ReconcileOutcome::Applied
            });
        }

        let target = current.with_click_through(desired);
        window.write_style(target)?;

        let confirmed = window.read_style()?;
        if !confirmed.satisfies(desired) {
            return Err(PlatformError::StyleRejected {
                requested: target,
                actual: confirmed,
            });
        }

        self.applied = Some(desired);
        self.stats.writes += 1;

        if in_sync {
            self.stats.restorations += 1;
            info!(click_through = desired, style = %confirmed, was = %current, "Restored reverted window style");
            Ok(ReconcileOutcome::Restored)
        } else {
            info!(click_through = desired, style = %confirmed, "Applied window style");
            Ok(ReconcileOutcome::Applied)
        }
    }
}
