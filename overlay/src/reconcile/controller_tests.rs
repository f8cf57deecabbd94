use super::{ClickThroughController, ClickThroughPhase, ReconcileOutcome};
use crate::platform::headless::{HeadlessOverlay, HeadlessRemote, PointerRoute};
use crate::platform::{ExtendedStyle, OverlayConfig, PlatformError, WindowStyleAccess};

fn window() -> (HeadlessOverlay, HeadlessRemote) {
    HeadlessOverlay::with_remote(OverlayConfig {
        size: Some((16, 16)),
        ..OverlayConfig::default()
    })
}

#[test]
fn test_enable_click_through() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(false);

    controller.set_desired(true);
    let outcome = controller.reconcile(&mut window).unwrap();

    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert_eq!(controller.applied(), Some(true));
    assert!(remote.style().contains(ExtendedStyle::CLICK_THROUGH));
}

#[test]
fn test_disable_click_through() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(true);
    controller.reconcile(&mut window).unwrap();

    controller.set_desired(false);
    let outcome = controller.reconcile(&mut window).unwrap();

    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert_eq!(controller.applied(), Some(false));
    let style = remote.style();
    assert!(style.contains(ExtendedStyle::LAYERED));
    assert!(style.contains(ExtendedStyle::TOOL_WINDOW));
    assert!(!style.intersects(ExtendedStyle::INTERACTIVE_CLEARED));
}

#[test]
fn test_initial_interactive_state_needs_no_write() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(false);

    assert_eq!(controller.phase(), ClickThroughPhase::Uninitialized);
    assert_eq!(
        controller.reconcile(&mut window).unwrap(),
        ReconcileOutcome::Applied
    );
    assert_eq!(controller.phase(), ClickThroughPhase::Reconciled(false));
    assert_eq!(remote.style_writes(), 0);
}

#[test]
fn test_reconcile_is_idempotent() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(true);

    controller.reconcile(&mut window).unwrap();
    let reads_after_first = remote.style_reads();
    let second = controller.reconcile(&mut window).unwrap();

    assert_eq!(second, ReconcileOutcome::Unchanged);
    assert_eq!(remote.style_writes(), 1);
    assert_eq!(remote.style_reads(), reads_after_first);
}

#[test]
fn test_not_ready_window_gets_no_calls() {
    let (mut window, remote) = window();
    remote.set_ready(false);
    let mut controller = ClickThroughController::new(true);

    assert_eq!(
        controller.reconcile(&mut window).unwrap(),
        ReconcileOutcome::NotReady
    );
    assert_eq!(
        controller.reassert(&mut window).unwrap(),
        ReconcileOutcome::NotReady
    );
    assert_eq!(remote.style_reads(), 0);
    assert_eq!(remote.style_writes(), 0);
    assert_eq!(controller.applied(), None);

    remote.set_ready(true);
    assert_eq!(
        controller.reconcile(&mut window).unwrap(),
        ReconcileOutcome::Applied
    );
}

#[test]
fn test_failed_write_leaves_applied_unchanged() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(false);
    controller.reconcile(&mut window).unwrap();

    controller.set_desired(true);
    remote.fail_next_writes(1);
    let err = controller.reconcile(&mut window).unwrap_err();

    assert!(matches!(err, PlatformError::StyleUpdate(_)));
    assert_eq!(controller.applied(), Some(false));
    assert_eq!(controller.phase(), ClickThroughPhase::Diverged);
    assert_eq!(controller.stats().failures, 1);
    assert!(controller.last_error().is_some());

    assert_eq!(
        controller.reconcile(&mut window).unwrap(),
        ReconcileOutcome::Applied
    );
    assert_eq!(controller.applied(), Some(true));
    assert!(controller.last_error().is_none());
}

#[test]
fn test_reassert_restores_forgotten_style() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(true);
    controller.reconcile(&mut window).unwrap();

    remote.forget_style();
    assert_eq!(remote.dispatch_pointer(5, 5), PointerRoute::Overlay);

    let outcome = controller.reassert(&mut window).unwrap();
    assert_eq!(outcome, ReconcileOutcome::Restored);
    assert!(remote.style().satisfies(true));
    assert_eq!(controller.stats().restorations, 1);
    assert_eq!(remote.dispatch_pointer(5, 5), PointerRoute::PassedThrough);
}

#[test]
fn test_reassert_without_drift_only_reads() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(true);
    controller.reconcile(&mut window).unwrap();
    let writes = remote.style_writes();

    assert_eq!(
        controller.reassert(&mut window).unwrap(),
        ReconcileOutcome::Unchanged
    );
    assert_eq!(remote.style_writes(), writes);
}

#[test]
fn test_phase_transitions() {
    let (mut window, _remote) = window();
    let mut controller = ClickThroughController::new(false);
    controller.reconcile(&mut window).unwrap();

    assert!(controller.set_desired(true));
    assert_eq!(controller.phase(), ClickThroughPhase::Diverged);
    assert!(!controller.set_desired(true));

    controller.reconcile(&mut window).unwrap();
    assert_eq!(controller.phase(), ClickThroughPhase::Reconciled(true));
}

#[test]
fn test_preserves_unmanaged_bits() {
    let (mut window, remote) = window();
    let topmost = ExtendedStyle::from_bits(0x0000_0008);
    remote.set_style(ExtendedStyle::LAYERED | topmost);
    let mut controller = ClickThroughController::new(true);

    controller.reconcile(&mut window).unwrap();
    assert!(remote.style().contains(topmost));
}

/// Window that accepts writes but never changes its reported style
struct StubbornWindow;

impl WindowStyleAccess for StubbornWindow {
    fn is_ready(&self) -> bool {
        true
    }

    fn read_style(&self) -> Result<ExtendedStyle, PlatformError> {
        Ok(ExtendedStyle::LAYERED)
    }

    fn write_style(&mut self, _style: ExtendedStyle) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[test]
fn test_unconfirmed_write_is_rejected() {
    let mut controller = ClickThroughController::new(true);
    let err = controller.reconcile(&mut StubbornWindow).unwrap_err();

    assert!(matches!(err, PlatformError::StyleRejected { .. }));
    assert_eq!(controller.applied(), None);
}

#[test]
fn test_click_through_passes_pointer_to_next_window() {
    let (mut window, remote) = window();
    let mut controller = ClickThroughController::new(false);
    controller.set_desired(true);
    controller.reconcile(&mut window).unwrap();

    assert_eq!(controller.applied(), Some(true));
    assert_eq!(remote.dispatch_pointer(8, 8), PointerRoute::PassedThrough);
}
