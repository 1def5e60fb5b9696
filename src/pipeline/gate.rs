//! One-at-a-time admission control for speech requests.

use std::sync::atomic::{AtomicBool, Ordering};

/// Admission gate: at most one synthesize-then-play cycle at a time.
///
/// Rejected requests are dropped, never queued.
#[derive(Debug, Default)]
pub struct SpeechGate {
    busy: AtomicBool,
}

impl SpeechGate {
    /// Try to claim the gate. Returns `false` if a request is in flight.
    pub fn try_enter(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Reopen the gate. Called unconditionally by the completion step.
    pub fn leave(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Whether a request currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// RAII hold on the gate; reopens it on drop, whatever the exit path.
pub struct GateGuard<'a> {
    gate: &'a SpeechGate,
}

impl<'a> GateGuard<'a> {
    /// Claim the gate, or `None` if it is already held.
    pub fn try_acquire(gate: &'a SpeechGate) -> Option<Self> {
        gate.try_enter().then_some(Self { gate })
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn second_enter_is_rejected_until_leave() {
        let gate = SpeechGate::default();
        assert!(gate.try_enter());
        assert!(!gate.try_enter());
        gate.leave();
        assert!(gate.try_enter());
    }

    #[test]
    fn guard_reopens_on_drop() {
        let gate = SpeechGate::default();
        {
            let guard = GateGuard::try_acquire(&gate);
            assert!(guard.is_some());
            assert!(gate.is_busy());
            assert!(GateGuard::try_acquire(&gate).is_none());
        }
        assert!(!gate.is_busy());
        assert!(GateGuard::try_acquire(&gate).is_some());
    }
}
