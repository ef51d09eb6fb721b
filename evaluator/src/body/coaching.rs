//! Position coaching: margin checks that guide the user into the
//! sensor's usable frame before the game will run.
//!
//! Violations are checked in a fixed priority order and short-circuit:
//! a head or foot violation always wins over a hand violation, and only
//! one message is reported per frame.

use serde::{Deserialize, Serialize};

use super::skeleton::{BodyJoint, BodySnapshot};

/// Margin adjustment step applied per command tick.
pub const MARGIN_STEP: f64 = 0.05;

/// Upper clamp for any margin fraction; beyond this the usable area
/// collapses.
pub const MARGIN_MAX: f64 = 0.45;

// ── Coaching message ───────────────────────────────────────

/// Instruction shown to the user, or positioned when placement is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachingMessage {
    /// Head above the top margin or a foot below the bottom margin.
    MoveBack,
    /// A hand outside the side margins.
    MoveToCenter,
    /// Placement satisfied; the game may run.
    Positioned,
}

impl CoachingMessage {
    /// Symbol form for IPC and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveBack => "move-back",
            Self::MoveToCenter => "move-to-center",
            Self::Positioned => "positioned",
        }
    }

    /// Literal display text; positioned clears the message.
    pub fn display_text(&self) -> &'static str {
        match self {
            Self::MoveBack => "move back",
            Self::MoveToCenter => "move to center",
            Self::Positioned => "",
        }
    }

    pub fn is_positioned(&self) -> bool {
        matches!(self, Self::Positioned)
    }
}

// ── Margins ────────────────────────────────────────────────

/// Which margin a runtime adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginEdge {
    Top,
    Bottom,
    Sides,
}

impl MarginEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Sides => "sides",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "sides" => Some(Self::Sides),
            _ => None,
        }
    }
}

/// Margin fractions of the surface, independently configurable per edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub sides: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0.10,
            bottom: 0.10,
            sides: 0.10,
        }
    }
}

impl Margins {
    /// Adjust one edge by whole steps of `MARGIN_STEP`, clamped to
    /// `[0, MARGIN_MAX]`. Returns the new fraction.
    pub fn adjust(&mut self, edge: MarginEdge, steps: i32) -> f64 {
        let slot = match edge {
            MarginEdge::Top => &mut self.top,
            MarginEdge::Bottom => &mut self.bottom,
            MarginEdge::Sides => &mut self.sides,
        };
        *slot = (*slot + MARGIN_STEP * f64::from(steps)).clamp(0.0, MARGIN_MAX);
        *slot
    }
}

// ── Placement evaluation ───────────────────────────────────

/// Evaluate body placement against the margin bounds.
///
/// Bounds are fractions of the surface truncated to whole pixels, matching
/// the integer layout the zones are calibrated in. Checks run in priority
/// order: head above top, either ankle below bottom, left hand past the
/// left bound, right hand past the right bound.
pub fn evaluate_placement(
    body: &BodySnapshot,
    width: f64,
    height: f64,
    margins: &Margins,
) -> CoachingMessage {
    let width_min = (width * margins.sides).trunc();
    let width_max = (width * (1.0 - margins.sides)).trunc();
    let height_min = (height * margins.top).trunc();
    let height_max = (height * (1.0 - margins.bottom)).trunc();

    let head = body.joint(BodyJoint::Head);
    let ankle_right = body.joint(BodyJoint::AnkleRight);
    let ankle_left = body.joint(BodyJoint::AnkleLeft);
    let hand_left = body.joint(BodyJoint::HandLeft);
    let hand_right = body.joint(BodyJoint::HandRight);

    if head.y.trunc() < height_min {
        CoachingMessage::MoveBack
    } else if ankle_right.y.trunc() > height_max || ankle_left.y.trunc() > height_max {
        CoachingMessage::MoveBack
    } else if hand_left.x.trunc() < width_min {
        CoachingMessage::MoveToCenter
    } else if hand_right.x.trunc() > width_max {
        CoachingMessage::MoveToCenter
    } else {
        CoachingMessage::Positioned
    }
}

// ── Tests ──────────────────────────────────────────────────
