//! Gesture evaluation subsystem.
//!
//! Provides:
//! - `skeleton`: body-frame data model and wire parsing
//! - `zones`: proportional-band hit testing
//! - `latch`: closed-hand edge debounce
//! - `coaching`: placement margins and coaching messages
//! - `menu`: page and button definitions
//! - `slider`: three-position difficulty slider
//! - `agility`: timed target-touch game
//! - `evaluator`: the per-frame state machine tying it together

pub mod skeleton;
pub mod zones;
pub mod latch;
pub mod coaching;
pub mod menu;
pub mod slider;
pub mod agility;
pub mod evaluator;

pub use evaluator::{Evaluator, GestureState, PanelEvent};
