//! Agility game: an ordered sequence of touch targets.
//!
//! Targets light up one at a time in a fixed order. Only the first
//! untouched target is ever hit-tested, so the sequence is strictly
//! monotonic and at most one target can be claimed per frame. Touched
//! flags survive until the player returns to the menu page.

use serde::{Deserialize, Serialize};

use super::skeleton::{BodySnapshot, Hand};
use super::zones::{zone_hit, ZoneSpec};

// Default target sequence, raw positions before the surface offset.
const TARGET_POSITIONS: [(f64, f64); 9] = [
    (1346.0, 396.0),
    (590.0, 518.0),
    (1292.0, 256.0),
    (642.0, 180.0),
    (913.0, 661.0),
    (590.0, 396.0),
    (623.0, 737.0),
    (733.0, 340.0),
    (1047.0, 128.0),
];

// ── Config ─────────────────────────────────────────────────

/// Target layout for the game, in touch order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub targets: Vec<ZoneSpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            targets: TARGET_POSITIONS
                .iter()
                .map(|&(x, y)| ZoneSpec::new(x, y))
                .collect(),
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Per-session touch progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub touched: Vec<bool>,
}

impl GameState {
    pub fn new(target_count: usize) -> Self {
        Self {
            touched: vec![false; target_count],
        }
    }

    /// Clear all progress, resizing to the configured target count.
    pub fn reset(&mut self, target_count: usize) {
        self.touched.clear();
        self.touched.resize(target_count, false);
    }

    /// Index of the target currently in play.
    pub fn active_target(&self) -> Option<usize> {
        self.touched.iter().position(|&t| !t)
    }

    pub fn all_touched(&self) -> bool {
        !self.touched.is_empty() && self.touched.iter().all(|&t| t)
    }

    pub fn touched_count(&self) -> usize {
        self.touched.iter().filter(|&&t| t).count()
    }
}

// ── Events ─────────────────────────────────────────────────

/// Observable game transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    TargetTouched { index: usize, remaining: usize },
    Completed { seconds: u64 },
}

impl GameEvent {
    /// Convert the event to an IPC s-expression.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::TargetTouched { index, remaining } => {
                format!(
                    "(:type :event :event :target-touched :index {} :remaining {})",
                    index, remaining
                )
            }
            Self::Completed { seconds } => {
                format!("(:type :event :event :game-completed :seconds {})", seconds)
            }
        }
    }
}

// ── Per-frame step ─────────────────────────────────────────

/// Hit-test the active target against both hands. Marks it touched and
/// returns its index on a hit; later targets are never tested in the
/// same frame.
pub fn touch_step(
    config: &GameConfig,
    offset: f64,
    tolerance: f64,
    state: &mut GameState,
    body: &BodySnapshot,
) -> Option<usize> {
    let index = state.active_target()?;
    let zone = config.targets.get(index)?.centered(offset);
    if zone_hit(&zone, tolerance, body.hand(Hand::Left), body.hand(Hand::Right)) {
        state.touched[index] = true;
        Some(index)
    } else {
        None
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::skeleton::{BodyJoint, JointPoint};

    const OFFSET: f64 = 50.0;
    const TOLERANCE: f64 = 0.04;

    fn body_at(x: f64, y: f64) -> BodySnapshot {
        let mut body = BodySnapshot::default();
        body.tracked = true;
        body.joints[BodyJoint::HandRight.index()] = JointPoint::new(x, y);
        body.joints[BodyJoint::HandLeft.index()] = JointPoint::new(-500.0, -500.0);
        body
    }

    fn target_center(config: &GameConfig, index: usize) -> (f64, f64) {
        let zone = config.targets[index].centered(OFFSET);
        (zone.cx, zone.cy)
    }

    #[test]
    fn test_targets_claimed_in_order() {
        let config = GameConfig::default();
        let mut state = GameState::new(config.targets.len());

        for i in 0..config.targets.len() {
            let (cx, cy) = target_center(&config, i);
            let hit = touch_step(&config, OFFSET, TOLERANCE, &mut state, &body_at(cx, cy));
            assert_eq!(hit, Some(i));
        }
        assert!(state.all_touched());
        assert_eq!(touch_step(
            &config,
            OFFSET,
            TOLERANCE,
            &mut state,
            &body_at(0.0, 0.0)
        ), None);
    }

    #[test]
    fn test_later_target_ignored_while_earlier_pending() {
        let config = GameConfig::default();
        let mut state = GameState::new(config.targets.len());

        // Hand sits on target 5 while target 0 is still in play.
        let (cx, cy) = target_center(&config, 5);
        let hit = touch_step(&config, OFFSET, TOLERANCE, &mut state, &body_at(cx, cy));
        assert_eq!(hit, None);
        assert_eq!(state.touched_count(), 0);

        // Once 0..=4 are done the same position claims target 5.
        for i in 0..5 {
            state.touched[i] = true;
        }
        let hit = touch_step(&config, OFFSET, TOLERANCE, &mut state, &body_at(cx, cy));
        assert_eq!(hit, Some(5));
    }

    #[test]
    fn test_one_target_per_frame_even_when_zones_coincide() {
        let config = GameConfig {
            targets: vec![ZoneSpec::new(600.0, 400.0), ZoneSpec::new(600.0, 400.0)],
        };
        let mut state = GameState::new(2);
        let body = body_at(650.0, 450.0);

        assert_eq!(touch_step(&config, OFFSET, TOLERANCE, &mut state, &body), Some(0));
        assert!(!state.all_touched());
        assert_eq!(touch_step(&config, OFFSET, TOLERANCE, &mut state, &body), Some(1));
        assert!(state.all_touched());
    }

    #[test]
    fn test_reset_clears_progress() {
        let config = GameConfig::default();
        let mut state = GameState::new(config.targets.len());
        state.touched[0] = true;
        state.touched[1] = true;

        state.reset(config.targets.len());
        assert_eq!(state.active_target(), Some(0));
        assert_eq!(state.touched_count(), 0);
        assert!(!state.all_touched());
    }

    #[test]
    fn test_default_layout_has_nine_targets() {
        let config = GameConfig::default();
        assert_eq!(config.targets.len(), 9);
        // Spot-check the first and last positions.
        assert_eq!((config.targets[0].x, config.targets[0].y), (1346.0, 396.0));
        assert_eq!((config.targets[8].x, config.targets[8].y), (1047.0, 128.0));
    }

    #[test]
    fn test_event_sexp_forms() {
        let sexp = GameEvent::TargetTouched { index: 3, remaining: 5 }.to_sexp();
        assert!(sexp.contains(":target-touched"));
        assert!(sexp.contains(":index 3 :remaining 5"));
        let sexp = GameEvent::Completed { seconds: 42 }.to_sexp();
        assert!(sexp.contains(":game-completed :seconds 42"));
    }
}
