//! Kinect v2 body-frame data structures.
//!
//! Models the small set of joint roles the panel evaluates, plus the
//! discrete per-hand open/closed/lasso states the sensor classifies.
//! Positions arrive already projected to screen space by the external
//! body-tracking source; this module only carries them.

use lexpr::Value;

use crate::error::{Error, Result};

// ── Joint definitions ──────────────────────────────────────

/// The joint roles the panel tracks per body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyJoint {
    Head,
    ShoulderLeft,
    ShoulderRight,
    HandLeft,
    HandRight,
    AnkleLeft,
    AnkleRight,
}

/// Total number of tracked joint roles per body.
pub const JOINT_COUNT: usize = 7;

impl BodyJoint {
    /// Convert joint enum to array index (0-6).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::ShoulderLeft => "shoulder-left",
            Self::ShoulderRight => "shoulder-right",
            Self::HandLeft => "hand-left",
            Self::HandRight => "hand-right",
            Self::AnkleLeft => "ankle-left",
            Self::AnkleRight => "ankle-right",
        }
    }

    /// Parse a joint role from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "head" => Some(Self::Head),
            "shoulder-left" => Some(Self::ShoulderLeft),
            "shoulder-right" => Some(Self::ShoulderRight),
            "hand-left" => Some(Self::HandLeft),
            "hand-right" => Some(Self::HandRight),
            "ankle-left" => Some(Self::AnkleLeft),
            "ankle-right" => Some(Self::AnkleRight),
            _ => None,
        }
    }
}

/// All joint names in order, matching BodyJoint enum indices.
pub const JOINT_NAMES: [&str; JOINT_COUNT] = [
    "head",
    "shoulder-left",
    "shoulder-right",
    "hand-left",
    "hand-right",
    "ankle-left",
    "ankle-right",
];

// ── Hand enum ──────────────────────────────────────────────

/// Which hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Convert to array index (0 = left, 1 = right).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// The joint role carrying this hand's position.
    pub fn joint(&self) -> BodyJoint {
        match self {
            Self::Left => BodyJoint::HandLeft,
            Self::Right => BodyJoint::HandRight,
        }
    }
}

// ── Hand state ─────────────────────────────────────────────

/// Discrete hand pose classified by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandState {
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

impl HandState {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::NotTracked => "not-tracked",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Lasso => "lasso",
        }
    }

    /// Parse a hand state from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "not-tracked" => Some(Self::NotTracked),
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "lasso" => Some(Self::Lasso),
            _ => None,
        }
    }
}

// ── Tracking confidence ────────────────────────────────────

/// Per-joint tracking confidence tier reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingConfidence {
    NotTracked,
    Inferred,
    Tracked,
}

impl TrackingConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotTracked => "none",
            Self::Inferred => "inferred",
            Self::Tracked => "tracked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::NotTracked),
            "inferred" => Some(Self::Inferred),
            "tracked" => Some(Self::Tracked),
            _ => None,
        }
    }
}

// ── Joint point ────────────────────────────────────────────

/// Screen-space position of one joint.
#[derive(Debug, Clone, Copy)]
pub struct JointPoint {
    pub x: f64,
    pub y: f64,
    /// Confidence tier; carried for consumers, not gating evaluation.
    pub confidence: TrackingConfidence,
}

impl Default for JointPoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: TrackingConfidence::NotTracked,
        }
    }
}

impl JointPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            confidence: TrackingConfidence::Tracked,
        }
    }
}

// ── Body snapshot ──────────────────────────────────────────

/// One body's joints and hand states for a single frame.
#[derive(Debug, Clone)]
pub struct BodySnapshot {
    /// Joint positions indexed by BodyJoint.
    pub joints: [JointPoint; JOINT_COUNT],
    /// Hand states indexed by Hand (left, right).
    pub hand_states: [HandState; 2],
    /// Whether the sensor tracked this body. Untracked bodies are skipped.
    pub tracked: bool,
}

impl Default for BodySnapshot {
    fn default() -> Self {
        Self {
            joints: [JointPoint::default(); JOINT_COUNT],
            hand_states: [HandState::Unknown; 2],
            tracked: false,
        }
    }
}

impl BodySnapshot {
    pub fn joint(&self, joint: BodyJoint) -> &JointPoint {
        &self.joints[joint.index()]
    }

    /// Position of a hand's joint.
    pub fn hand(&self, hand: Hand) -> &JointPoint {
        self.joint(hand.joint())
    }

    pub fn hand_state(&self, hand: Hand) -> HandState {
        self.hand_states[hand.index()]
    }
}

// ── Body frame ─────────────────────────────────────────────

/// One sensor frame: every body the sensor reported, tracked or not.
#[derive(Debug, Clone)]
pub struct BodyFrame {
    /// Sensor timestamp in milliseconds, monotonic per session.
    pub timestamp_ms: u64,
    pub bodies: Vec<BodySnapshot>,
}

// ── Wire parsing ───────────────────────────────────────────

/// Find the value following `:key` in an s-expression plist.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            if let Value::Cons(next) = pair.cdr() {
                return Some(next.car());
            }
            return None;
        }
        current = pair.cdr();
    }
    None
}

/// Collect the items of a proper list.
fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        items.push(pair.car());
        current = pair.cdr();
    }
    items
}

fn symbol_str(value: &Value) -> Option<&str> {
    match value {
        Value::Symbol(s) => Some(s.as_ref()),
        Value::Keyword(k) => Some(k.as_ref()),
        Value::String(s) => Some(s.as_ref()),
        _ => None,
    }
}

fn number_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Symbol(s) => s.as_ref() != "nil",
        _ => true,
    }
}

/// Parse one body plist:
/// `(:tracked t :hands (closed open) :joints ((head X Y tracked) ...))`.
/// Unlisted joints stay at the untracked origin; a missing `:hands` list
/// leaves both hands unknown; joint confidence defaults to tracked.
fn parse_body(value: &Value) -> Result<BodySnapshot> {
    let mut body = BodySnapshot {
        tracked: plist_get(value, "tracked").map(truthy).unwrap_or(false),
        ..BodySnapshot::default()
    };

    if let Some(hands) = plist_get(value, "hands") {
        let items = list_items(hands);
        for (i, item) in items.iter().take(2).enumerate() {
            let name = symbol_str(item)
                .ok_or_else(|| Error::Frame("hand state is not a symbol".into()))?;
            body.hand_states[i] = HandState::from_str(name)
                .ok_or_else(|| Error::Frame(format!("unknown hand state: {name}")))?;
        }
    }

    if let Some(joints) = plist_get(value, "joints") {
        for entry in list_items(joints) {
            let fields = list_items(entry);
            if fields.len() < 3 {
                return Err(Error::Frame("joint entry needs (name x y [conf])".into()));
            }
            let name = symbol_str(fields[0])
                .ok_or_else(|| Error::Frame("joint name is not a symbol".into()))?;
            let joint = BodyJoint::from_str(name)
                .ok_or_else(|| Error::Frame(format!("unknown joint: {name}")))?;
            let x = number_f64(fields[1])
                .ok_or_else(|| Error::Frame(format!("joint {name}: bad x")))?;
            let y = number_f64(fields[2])
                .ok_or_else(|| Error::Frame(format!("joint {name}: bad y")))?;
            let confidence = match fields.get(3) {
                Some(v) => {
                    let s = symbol_str(v)
                        .ok_or_else(|| Error::Frame(format!("joint {name}: bad confidence")))?;
                    TrackingConfidence::from_str(s).ok_or_else(|| {
                        Error::Frame(format!("joint {name}: unknown confidence {s}"))
                    })?
                }
                None => TrackingConfidence::Tracked,
            };
            body.joints[joint.index()] = JointPoint { x, y, confidence };
        }
    }

    Ok(body)
}

/// Parse a body-frame plist:
/// `(:type :body-frame :timestamp-ms N :bodies (BODY ...))`.
pub fn parse_frame(value: &Value) -> Result<BodyFrame> {
    let timestamp_ms = plist_get(value, "timestamp-ms")
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .ok_or_else(|| Error::Frame("missing :timestamp-ms".into()))?;

    let mut bodies = Vec::new();
    if let Some(list) = plist_get(value, "bodies") {
        for entry in list_items(list) {
            bodies.push(parse_body(entry)?);
        }
    }

    Ok(BodyFrame {
        timestamp_ms,
        bodies,
    })
}

// ── Tests ──────────────────────────────────────────────────
