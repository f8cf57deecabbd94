use std::time::Instant;

use tracing::warn;

use super::controller::{ClickThroughController, ReconcileOutcome};
use super::schedule::{ReconcileOptions, ReconcileSchedule, TickKind};
use crate::platform::{PlatformError, WindowStyleAccess};

/// What a due tick did
#[derive(Debug)]
pub struct TickReport {
    pub kind: TickKind,
    pub result: Result<ReconcileOutcome, PlatformError>,
}

/// Controller plus schedule, ticked from the overlay thread
#[derive(Debug, Clone)]
pub struct ReconcileLoop {
    controller: ClickThroughController,
    schedule: ReconcileSchedule,
}

impl ReconcileLoop {
    pub fn new(desired: bool, created_at: Instant, options: ReconcileOptions) -> Self {
        Self {
            controller: ClickThroughController::new(desired),
            schedule: ReconcileSchedule::new(created_at, options),
        }
    }

    pub fn controller(&self) -> &ClickThroughController {
        &self.controller
    }

    pub fn schedule(&self) -> &ReconcileSchedule {
        &self.schedule
    }

    /// Update intent; a change triggers an immediate reconcile
    pub fn set_desired(&mut self, enabled: bool) -> bool {
        let changed = self.controller.set_desired(enabled);
        if changed {
            self.schedule.request_immediate();
        }
        changed
    }

    /// Run the step due at `now`, if any. Errors are logged and reported,
    /// never propagated; the next tick retries.
    pub fn tick<W>(&mut self, window: &mut W, now: Instant) -> Option<TickReport>
    where
        W: WindowStyleAccess + ?Sized,
    {
        let kind = self.schedule.poll(now)?;

        let result = match kind {
            TickKind::Startup | TickKind::Immediate => self.controller.reconcile(window),
            TickKind::Periodic => self.controller.reassert(window),
        };

        match &result {
            Ok(ReconcileOutcome::NotReady) => {
                self.schedule.defer(now);
            }
            Err(e) => {
                warn!(?kind, error = %e, "Click-through reconcile failed, retrying next tick");
            }
            Ok(_) => {}
        }

        Some(TickReport { kind, result })
    }
}
