//! Daemon state: the central struct owning the evaluator, the live
//! session, and the IPC server, passed as `&mut self` through the event
//! loop and every IPC handler.

use tracing::info;

use crate::body::skeleton::BodyFrame;
use crate::body::{Evaluator, GestureState, PanelEvent};
use crate::config::Config;
use crate::ipc::IpcServer;

/// Central daemon state.
pub struct PanelState {
    pub config: Config,
    pub evaluator: Evaluator,
    /// Live session state, advanced by frames and clock ticks.
    pub gesture: GestureState,
    pub ipc_server: IpcServer,
    /// Frames evaluated since startup.
    pub frames_seen: u64,
    /// Timestamp of the most recent frame.
    pub last_frame_ms: Option<u64>,
    /// Cleared to stop the run loop.
    pub running: bool,
}

impl PanelState {
    pub fn new(config: Config) -> Self {
        let evaluator = Evaluator::new(config.clone());
        let gesture = evaluator.initial_state();
        let socket_path = IpcServer::default_socket_path();
        Self {
            config,
            evaluator,
            gesture,
            ipc_server: IpcServer::new(socket_path),
            frames_seen: 0,
            last_frame_ms: None,
            running: true,
        }
    }

    /// Evaluate every tracked body in a frame, in frame order, and
    /// broadcast the resulting events. Returns the events for callers
    /// that surface them directly (replay).
    pub fn advance_frame(&mut self, frame: &BodyFrame) -> Vec<PanelEvent> {
        self.frames_seen += 1;
        self.last_frame_ms = Some(frame.timestamp_ms);
        let mut all_events = Vec::new();
        for body in frame.bodies.iter().filter(|b| b.tracked) {
            let (next, events) = self.evaluator.step(&self.gesture, body);
            self.gesture = next;
            all_events.extend(events);
        }
        self.broadcast(&all_events);
        if self.gesture.exit_requested && self.running {
            info!("exit requested by cancel gesture");
            self.running = false;
        }
        all_events
    }

    /// Advance the session clock by one second.
    pub fn tick_clock(&mut self) -> Vec<PanelEvent> {
        let (next, events) = self.evaluator.tick_clock(&self.gesture);
        self.gesture = next;
        self.broadcast(&events);
        events
    }

    /// Discard the session and start a fresh one.
    pub fn reset_session(&mut self) {
        self.gesture = self.evaluator.initial_state();
        info!("session state reset");
    }

    pub(crate) fn broadcast(&mut self, events: &[PanelEvent]) {
        for event in events {
            let sexp = event.to_sexp();
            IpcServer::broadcast_event(self, &sexp);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
