//! Movement phase state machine.
//!
//! One repetition cycles `prepare -> activate -> hold -> release`, then loops
//! back to `activate` (still on target) or `prepare`. There is no terminal
//! state.

use crate::types::SessionPhase;

/// Hold progress at which `hold` advances to `release`.
pub const HOLD_COMPLETE: f64 = 1.0;

/// Compute the next phase.
///
/// `hold_progress` is accumulated hold time divided by the movement's hold
/// duration, so `1.0` means the hold target has been met.
pub fn next_phase(
    previous: SessionPhase,
    in_target_range: bool,
    hold_progress: f64,
) -> SessionPhase {
    match previous {
        SessionPhase::Prepare if in_target_range => SessionPhase::Activate,
        SessionPhase::Prepare => SessionPhase::Prepare,
        SessionPhase::Activate if in_target_range => SessionPhase::Hold,
        SessionPhase::Activate => SessionPhase::Activate,
        SessionPhase::Hold if hold_progress >= HOLD_COMPLETE => SessionPhase::Release,
        SessionPhase::Hold => SessionPhase::Hold,
        SessionPhase::Release if in_target_range => SessionPhase::Activate,
        SessionPhase::Release => SessionPhase::Prepare,
    }
}

/// Fraction of the hold target reached. The hold duration is floored at 1 ms.
pub fn hold_progress_fraction(hold_progress_sec: f64, hold_sec: f64) -> f64 {
    hold_progress_sec / hold_sec.max(0.001)
}
