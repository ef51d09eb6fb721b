//! Edge-triggered debounce latch for the closed-hand gesture.
//!
//! The sensor's hand classifier is probabilistic and jitters frame to
//! frame; acting on the raw closed level would re-fire every frame the
//! hand stays closed. The latch requires the hand to re-open before the
//! same action can trigger again.

use super::skeleton::HandState;

/// Debounce latch over the polled closed-hand signal.
///
/// Armed on creation. A closed hand while armed triggers exactly once and
/// disarms; an open hand re-arms unconditionally. Lasso, unknown, and
/// untracked states leave the latch untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GripLatch {
    armed: bool,
}

impl Default for GripLatch {
    fn default() -> Self {
        Self { armed: true }
    }
}

impl GripLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one frame's hand state. Returns true on the closed edge.
    pub fn observe(&mut self, state: HandState) -> bool {
        match state {
            HandState::Closed if self.armed => {
                self.armed = false;
                true
            }
            HandState::Open => {
                self.armed = true;
                false
            }
            _ => false,
        }
    }

    /// Whether a closed hand would trigger on the next frame.
    pub fn armed(&self) -> bool {
        self.armed
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run(latch: &mut GripLatch, states: &[HandState]) -> usize {
        states.iter().filter(|s| latch.observe(**s)).count()
    }

    #[test]
    fn test_held_closed_triggers_once() {
        let mut latch = GripLatch::new();
        let triggers = run(
            &mut latch,
            &[HandState::Closed, HandState::Closed, HandState::Closed],
        );
        assert_eq!(triggers, 1);
        assert!(!latch.armed());
    }

    #[test]
    fn test_reopen_rearms() {
        let mut latch = GripLatch::new();
        let triggers = run(
            &mut latch,
            &[HandState::Closed, HandState::Open, HandState::Closed],
        );
        assert_eq!(triggers, 2);
    }

    #[test]
    fn test_lasso_leaves_latch_unchanged() {
        let mut latch = GripLatch::new();
        assert!(latch.observe(HandState::Closed));
        // Lasso neither re-arms nor triggers.
        assert!(!latch.observe(HandState::Lasso));
        assert!(!latch.observe(HandState::Closed));
        // Only open re-arms.
        assert!(!latch.observe(HandState::Open));
        assert!(latch.observe(HandState::Closed));
    }

    #[test]
    fn test_noise_states_ignored() {
        let mut latch = GripLatch::new();
        assert!(!latch.observe(HandState::Unknown));
        assert!(!latch.observe(HandState::NotTracked));
        assert!(latch.armed());
        assert!(latch.observe(HandState::Closed));
    }

    #[test]
    fn test_open_while_armed_stays_armed() {
        let mut latch = GripLatch::new();
        assert!(!latch.observe(HandState::Open));
        assert!(latch.armed());
    }
}
