//! Difficulty slider on the options page.
//!
//! The slider is a three-position discrete control dragged by either
//! hand. Unlike buttons, its hit zone uses a fixed horizontal half-width
//! rather than a proportional band, and its vertical band doubles the
//! page tolerance so the grab region stays reachable while dragging.
//!
//! Grabbing is per hand: a closed hand arms a grab only while it sits
//! inside the screen segment of the current value, and the value follows
//! the hand until that hand opens again. The grab flag is cleared only
//! by an open hand inside the hit zone, so a hand that leaves the zone
//! while closed keeps its grab.

use serde::{Deserialize, Serialize};

use super::skeleton::{BodySnapshot, Hand, HandState};
use super::zones::band_contains;

// ── Config ─────────────────────────────────────────────────

/// Slider geometry. Positions are in screen pixels; `x`/`y` name the
/// control's center before the surface offset is applied, while
/// `segments` are absolute screen boundaries of the three value
/// positions (no offset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderConfig {
    pub x: f64,
    pub y: f64,
    /// Fixed horizontal hit half-width in pixels.
    pub half_width: f64,
    /// Segment boundaries: value v occupies (segments[v], segments[v+1]).
    pub segments: [f64; 4],
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            x: 964.0,
            y: 524.0,
            half_width: 300.0,
            segments: [647.0, 847.0, 1047.0, 1247.0],
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Mutable slider state carried across frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliderState {
    /// Discrete value in {0, 1, 2}.
    pub value: u8,
    /// Per-hand grab flags, indexed by [`Hand::index`].
    pub grab: [bool; 2],
    /// Whether a hand was inside the hit zone last frame.
    pub hovered: bool,
}

// ── Events ─────────────────────────────────────────────────

/// Observable slider transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderEvent {
    /// A hand entered the hit zone.
    Entered,
    /// No hand remains in the hit zone.
    Exited,
    Grabbed { hand: Hand },
    Released { hand: Hand },
    ValueChanged { from: u8, to: u8 },
}

impl SliderEvent {
    /// Convert the event to an IPC s-expression.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::Entered => "(:type :event :event :slider-entered)".to_string(),
            Self::Exited => "(:type :event :event :slider-exited)".to_string(),
            Self::Grabbed { hand } => {
                format!("(:type :event :event :slider-grabbed :hand :{})", hand.as_str())
            }
            Self::Released { hand } => {
                format!("(:type :event :event :slider-released :hand :{})", hand.as_str())
            }
            Self::ValueChanged { from, to } => {
                format!(
                    "(:type :event :event :slider-value-changed :from {} :to {})",
                    from, to
                )
            }
        }
    }
}

// ── Per-frame step ─────────────────────────────────────────

/// Advance the slider one frame. `offset` is the surface center offset
/// applied to the control's center; `tolerance` is the active page
/// tolerance (doubled for the vertical band).
pub fn step(
    config: &SliderConfig,
    offset: f64,
    tolerance: f64,
    state: &mut SliderState,
    body: &BodySnapshot,
) -> Vec<SliderEvent> {
    let mut events = Vec::new();
    let cx = config.x + offset;
    let cy = config.y + offset;

    // Either hand may satisfy each axis independently.
    let x_hit = [Hand::Right, Hand::Left].iter().any(|hand| {
        let x = body.joint(hand.joint()).x.trunc();
        x > cx - config.half_width && x < cx + config.half_width
    });
    let y_hit = [Hand::Right, Hand::Left]
        .iter()
        .any(|hand| band_contains(cy, tolerance * 2.0, body.joint(hand.joint()).y));
    let in_zone = x_hit && y_hit;

    if in_zone != state.hovered {
        events.push(if in_zone {
            SliderEvent::Entered
        } else {
            SliderEvent::Exited
        });
        state.hovered = in_zone;
    }
    if !in_zone {
        return events;
    }

    for hand in [Hand::Left, Hand::Right] {
        let idx = hand.index();
        let x = body.joint(hand.joint()).x.trunc();
        match body.hand_state(hand) {
            HandState::Closed => {
                let seg = state.value as usize;
                if !state.grab[idx] && x > config.segments[seg] && x < config.segments[seg + 1] {
                    state.grab[idx] = true;
                    events.push(SliderEvent::Grabbed { hand });
                }
                if state.grab[idx] {
                    let target = if x < config.segments[1] {
                        0
                    } else if x > config.segments[1] && x < config.segments[2] {
                        1
                    } else if x > config.segments[2] {
                        2
                    } else {
                        // Exactly on a boundary: hold the current value.
                        state.value
                    };
                    if target != state.value {
                        events.push(SliderEvent::ValueChanged {
                            from: state.value,
                            to: target,
                        });
                        state.value = target;
                    }
                }
            }
            HandState::Open => {
                if state.grab[idx] {
                    state.grab[idx] = false;
                    events.push(SliderEvent::Released { hand });
                }
            }
            _ => {}
        }
    }

    events
}

// ── Tests ──────────────────────────────────────────────────
