//! Interactive zone descriptors and proportional-tolerance hit testing.
//!
//! A zone's effective band widens proportionally to its own coordinate
//! magnitude, not by a fixed pixel margin: the X band is
//! `(cx - cx*t, cx + cx*t)` with strict bounds. The layout calibration
//! constants in the default configuration depend on this exact shape.

use serde::{Deserialize, Serialize};

use super::skeleton::JointPoint;

// ── Zone types ─────────────────────────────────────────────

/// Geometric shape of a zone's hit region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneShape {
    /// Proportional-tolerance rectangle band around the center.
    Band,
    /// Distance test against a tolerance-widened radius.
    Circle { radius: f64 },
}

impl Default for ZoneShape {
    fn default() -> Self {
        Self::Band
    }
}

/// Raw layout position of an interactive element. Layout coordinates are
/// the element's placement corner; the hit center is the corner plus the
/// configured sprite offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub shape: ZoneShape,
}

impl ZoneSpec {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            shape: ZoneShape::Band,
        }
    }

    /// Resolve the hit-test zone by applying the sprite center offset.
    pub fn centered(&self, offset: f64) -> Zone {
        Zone {
            cx: self.x + offset,
            cy: self.y + offset,
            shape: self.shape,
        }
    }
}

/// A resolved zone ready for hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub cx: f64,
    pub cy: f64,
    pub shape: ZoneShape,
}

// ── Hit testing ────────────────────────────────────────────

/// Proportional band test for one axis. Positions are truncated to whole
/// pixels before comparison; bounds are strict.
pub fn band_contains(center: f64, tolerance: f64, position: f64) -> bool {
    let p = position.trunc();
    p > center - center * tolerance && p < center + center * tolerance
}

fn circle_contains(zone: &Zone, radius: f64, tolerance: f64, point: &JointPoint) -> bool {
    let dx = point.x.trunc() - zone.cx;
    let dy = point.y.trunc() - zone.cy;
    let limit = radius * (1.0 + tolerance);
    dx * dx + dy * dy < limit * limit
}

/// Either-hand hit test against a zone.
///
/// Band zones scan both hands per axis independently, so the X band may be
/// satisfied by one hand and the Y band by the other. A cross-hand frame
/// therefore hits even though neither hand is inside the zone on its own.
/// The panel's calibration was tuned against this behavior; a dedicated
/// test documents it.
pub fn zone_hit(zone: &Zone, tolerance: f64, left: &JointPoint, right: &JointPoint) -> bool {
    match zone.shape {
        ZoneShape::Band => {
            (band_contains(zone.cx, tolerance, right.x)
                || band_contains(zone.cx, tolerance, left.x))
                && (band_contains(zone.cy, tolerance, right.y)
                    || band_contains(zone.cy, tolerance, left.y))
        }
        ZoneShape::Circle { radius } => {
            circle_contains(zone, radius, tolerance, right)
                || circle_contains(zone, radius, tolerance, left)
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
