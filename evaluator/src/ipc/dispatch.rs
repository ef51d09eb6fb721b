//! IPC message dispatch: parse s-expressions and route to handlers.

use lexpr::Value;
use tracing::{debug, info, warn};

use crate::body::coaching::MarginEdge;
use crate::body::evaluator::format_clock;
use crate::body::skeleton;
use crate::body::slider::SliderEvent;
use crate::body::PanelEvent;
use crate::state::PanelState;

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(state: &mut PanelState, client_id: u64, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(client_id, "malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    // Check authentication (hello must be first message)
    let is_authenticated = state
        .ipc_server
        .clients
        .get(&client_id)
        .map(|c| c.authenticated)
        .unwrap_or(false);

    match msg_type.as_deref() {
        Some("hello") => handle_hello(state, client_id, msg_id, &value),
        _ if !is_authenticated => Some(error_response(msg_id, "hello handshake required")),
        Some(command) => dispatch_command(state, command, msg_id, &value),
        None => Some(error_response(msg_id, "missing :type field")),
    }
}

/// Route an authenticated command to its handler. Shared by the socket
/// path and the replay driver, which has no transport handshake.
pub(crate) fn dispatch_command(
    state: &mut PanelState,
    command: &str,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    match command {
        "ping" => handle_ping(msg_id, value),
        "status" => handle_status(state, msg_id),
        "config" => handle_config(state, msg_id),
        "body-frame" => handle_body_frame(state, msg_id, value),
        "margin-adjust" => handle_margin_adjust(state, msg_id, value),
        "set-difficulty" => handle_set_difficulty(state, msg_id, value),
        "set-night-mode" => handle_set_night_mode(state, msg_id, value),
        "toggle-overlay" => handle_toggle_overlay(state, msg_id),
        "game-status" => handle_game_status(state, msg_id),
        "coaching-status" => handle_coaching_status(state, msg_id),
        "reset" => handle_reset(state, msg_id),
        "shutdown" => handle_shutdown(state, msg_id),
        other => Some(error_response(
            msg_id,
            &format!("unknown message type: {other}"),
        )),
    }
}

// ── Handlers ────────────────────────────────────────────────

fn handle_hello(
    state: &mut PanelState,
    client_id: u64,
    msg_id: i64,
    value: &Value,
) -> Option<String> {
    let version = get_int(value, "version").unwrap_or(0);
    if version != 1 {
        return Some(error_response(
            msg_id,
            &format!("unsupported protocol version: {version}"),
        ));
    }

    // SO_PEERCRED: only clients running as the daemon's own user may
    // drive the panel.
    if let Some(client) = state.ipc_server.clients.get(&client_id) {
        if let Some(peer_uid) = client.peer_uid {
            let our_uid = unsafe { libc::getuid() };
            if peer_uid != our_uid {
                warn!(client_id, peer_uid, our_uid, "rejecting client: UID mismatch");
                return Some(error_response(msg_id, "authentication failed: UID mismatch"));
            }
        }
    }

    let client_name = get_string(value, "client").unwrap_or_default();
    debug!(client_id, client_name, "hello handshake (authenticated)");

    let peer_pid = state
        .ipc_server
        .clients
        .get(&client_id)
        .and_then(|c| c.peer_pid);
    if let Some(client) = state.ipc_server.clients.get_mut(&client_id) {
        client.authenticated = true;
    }

    // The greeting carries the surface geometry and target count so the
    // presentation layer can lay the panel out before the first frame.
    let pid_field = peer_pid
        .map(|p| format!(" :peer-pid {}", p))
        .unwrap_or_default();
    Some(format!(
        "(:type :hello :id {} :version 1 :server \"kinpanel-evaluator\" :surface (:width {:.0} :height {:.0}) :targets {}{})",
        msg_id,
        state.config.surface.width,
        state.config.surface.height,
        state.config.game.targets.len(),
        pid_field
    ))
}

fn handle_ping(msg_id: i64, value: &Value) -> Option<String> {
    let client_ts = get_int(value, "timestamp").unwrap_or(0);
    Some(format!(
        "(:type :response :id {} :status :ok :client-timestamp {} :server-timestamp {})",
        msg_id,
        client_ts,
        unix_millis()
    ))
}

fn handle_status(state: &mut PanelState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :panel {})",
        msg_id,
        state.evaluator.status_sexp(&state.gesture)
    ))
}

fn handle_config(state: &mut PanelState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        state.evaluator.config_sexp()
    ))
}

fn handle_body_frame(state: &mut PanelState, msg_id: i64, value: &Value) -> Option<String> {
    let frame = match skeleton::parse_frame(value) {
        Ok(frame) => frame,
        Err(e) => return Some(error_response(msg_id, &e.to_string())),
    };
    // Events are broadcast by advance_frame; the response just counts them.
    let events = state.advance_frame(&frame);
    Some(format!(
        "(:type :response :id {} :status :ok :events {})",
        msg_id,
        events.len()
    ))
}

fn handle_margin_adjust(state: &mut PanelState, msg_id: i64, value: &Value) -> Option<String> {
    let edge = match get_keyword(value, "edge").and_then(|s| MarginEdge::from_str(&s)) {
        Some(edge) => edge,
        None => {
            return Some(error_response(
                msg_id,
                "missing or unknown :edge (top, bottom, sides)",
            ))
        }
    };
    let steps = match get_int(value, "steps") {
        Some(n) => i32::try_from(n).unwrap_or(0),
        None => 1,
    };

    let fraction = state.gesture.margins.adjust(edge, steps);
    let margins = state.gesture.margins;
    debug!(edge = edge.as_str(), steps, fraction, "margins adjusted");
    Some(format!(
        "(:type :response :id {} :status :ok :edge :{} :fraction {:.2} :margins (:top {:.2} :bottom {:.2} :sides {:.2}))",
        msg_id,
        edge.as_str(),
        fraction,
        margins.top,
        margins.bottom,
        margins.sides
    ))
}

fn handle_set_difficulty(state: &mut PanelState, msg_id: i64, value: &Value) -> Option<String> {
    let target = match get_int(value, "value") {
        Some(v @ 0..=2) => v as u8,
        Some(other) => {
            return Some(error_response(
                msg_id,
                &format!("difficulty out of range: {other}"),
            ))
        }
        None => return Some(error_response(msg_id, "missing :value")),
    };

    if target != state.gesture.slider.value {
        let event = PanelEvent::Slider(SliderEvent::ValueChanged {
            from: state.gesture.slider.value,
            to: target,
        });
        state.gesture.slider.value = target;
        state.broadcast(&[event]);
    }
    Some(format!(
        "(:type :response :id {} :status :ok :value {})",
        msg_id, target
    ))
}

fn handle_set_night_mode(state: &mut PanelState, msg_id: i64, value: &Value) -> Option<String> {
    let enabled = match get_bool(value, "enabled") {
        Some(b) => b,
        None => return Some(error_response(msg_id, "missing :enabled")),
    };

    if enabled != state.gesture.night_mode {
        state.gesture.night_mode = enabled;
        state.broadcast(&[PanelEvent::NightMode { enabled }]);
    }
    Some(format!(
        "(:type :response :id {} :status :ok :enabled {})",
        msg_id,
        if enabled { "t" } else { "nil" }
    ))
}

/// Hotkey analog for the skeleton overlay. The options page forces the
/// flag back to the night-mode value on its next frame.
fn handle_toggle_overlay(state: &mut PanelState, msg_id: i64) -> Option<String> {
    let enabled = !state.gesture.overlay;
    state.gesture.overlay = enabled;
    state.broadcast(&[PanelEvent::Overlay { enabled }]);
    Some(format!(
        "(:type :response :id {} :status :ok :enabled {})",
        msg_id,
        if enabled { "t" } else { "nil" }
    ))
}

fn handle_game_status(state: &mut PanelState, msg_id: i64) -> Option<String> {
    let gesture = &state.gesture;
    let touched: Vec<&str> = gesture
        .game
        .touched
        .iter()
        .map(|&t| if t { "t" } else { "nil" })
        .collect();
    let active = gesture
        .game
        .active_target()
        .map(|i| i.to_string())
        .unwrap_or_else(|| "nil".to_string());
    let best = gesture
        .best_seconds
        .map(|s| s.to_string())
        .unwrap_or_else(|| "nil".to_string());
    Some(format!(
        "(:type :response :id {} :status :ok :touched ({}) :active-target {} :complete {} \
         :seconds {} :clock \"{}\" :clock-running {} :best-seconds {})",
        msg_id,
        touched.join(" "),
        active,
        if gesture.game.all_touched() { "t" } else { "nil" },
        gesture.clock.seconds,
        format_clock(gesture.clock.seconds),
        if gesture.clock.running { "t" } else { "nil" },
        best,
    ))
}

fn handle_coaching_status(state: &mut PanelState, msg_id: i64) -> Option<String> {
    let gesture = &state.gesture;
    let (symbol, text) = match gesture.coaching {
        Some(message) => (format!(":{}", message.as_str()), message.display_text()),
        None => ("nil".to_string(), ""),
    };
    let margins = gesture.margins;
    Some(format!(
        "(:type :response :id {} :status :ok :coaching {} :text \"{}\" :positioned {} \
         :margins (:top {:.2} :bottom {:.2} :sides {:.2}))",
        msg_id,
        symbol,
        text,
        if gesture.positioned() { "t" } else { "nil" },
        margins.top,
        margins.bottom,
        margins.sides
    ))
}

fn handle_reset(state: &mut PanelState, msg_id: i64) -> Option<String> {
    state.reset_session();
    Some(ok_response(msg_id))
}

fn handle_shutdown(state: &mut PanelState, msg_id: i64) -> Option<String> {
    info!("shutdown requested over IPC");
    state.running = false;
    Some(ok_response(msg_id))
}

// ── Helpers ────────────────────────────────────────────────

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Extract a keyword value from an s-expression plist.
/// Walks cons pairs directly to find `:key` followed by its value.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
pub(crate) fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                let car = pair.car();
                let is_key = match car {
                    Value::Keyword(k) => k.as_ref() == key,
                    Value::Symbol(s) => s.as_ref() == prefixed,
                    _ => false,
                };
                if is_key {
                    // Value is the car of the next cons cell
                    if let Value::Cons(next) = pair.cdr() {
                        let val = next.car();
                        return match val {
                            Value::Keyword(v) => Some(v.to_string()),
                            Value::Symbol(v) => {
                                let s = v.to_string();
                                Some(s.strip_prefix(':').unwrap_or(&s).to_string())
                            }
                            Value::String(v) => Some(v.to_string()),
                            Value::Number(n) => Some(n.to_string()),
                            Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
                            Value::Null => Some("nil".to_string()),
                            _ => Some(val.to_string()),
                        };
                    }
                    return None;
                }
                current = pair.cdr();
            }
            _ => break,
        }
    }
    None
}

/// Extract an integer value from an s-expression plist.
pub(crate) fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a string value from an s-expression plist.
fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Extract a boolean value from an s-expression plist.
/// Treats "t" as true, "nil" as false.
fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

// ── Tests ──────────────────────────────────────────────────
