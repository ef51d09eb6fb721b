//! Session drivers: the daemon event loop and the replay runner.
//!
//! The daemon owns the wall clock: a one-second tick advances the
//! session timer between socket polls. Replay has no wall clock and
//! synthesizes ticks from the frame timestamps instead, so a recorded
//! scenario produces the same event stream on every run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use calloop::EventLoop;
use tracing::{debug, info, warn};

use crate::body::skeleton;
use crate::config::Config;
use crate::ipc::{dispatch, IpcServer};
use crate::state::PanelState;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Event loop poll interval. Short enough to keep up with a 30 Hz frame
/// stream arriving over the socket.
const POLL_INTERVAL_MS: u64 = 10;

/// Interval between periodic status log lines.
const STATUS_LOG_SECS: u64 = 60;

/// Daemon options from the command line.
#[derive(Debug, Clone, Default)]
pub struct DaemonOptions {
    /// Override for the IPC socket path.
    pub socket_path: Option<PathBuf>,
    /// Log all IPC messages.
    pub ipc_trace: bool,
    /// Exit after N seconds (CI testing).
    pub exit_after: Option<u64>,
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Run the evaluator as an IPC daemon.
pub fn run_daemon(config: Config, options: DaemonOptions) -> anyhow::Result<()> {
    let mut event_loop = EventLoop::<PanelState>::try_new()?;
    let mut state = PanelState::new(config);

    state.ipc_server.ipc_trace = options.ipc_trace;
    if let Some(path) = options.socket_path {
        state.ipc_server.socket_path = path;
    }
    let socket_path = state.ipc_server.socket_path.clone();
    IpcServer::bind(&socket_path, &event_loop.handle())?;

    // Signal handling via libc keeps the loop body free to poll.
    install_signal_handlers();

    let start_time = Instant::now();
    let exit_duration = options.exit_after.map(Duration::from_secs);
    let tick_interval = Duration::from_millis(state.config.clock.tick_ms);
    let poll_interval = Duration::from_millis(POLL_INTERVAL_MS);
    let status_interval = Duration::from_secs(STATUS_LOG_SECS);
    let mut last_tick = Instant::now();
    let mut last_status_log = Instant::now();

    info!(
        "daemon initialized (poll interval: {}ms), entering event loop",
        POLL_INTERVAL_MS
    );

    while state.running {
        // Check global shutdown flag (set by signal handler)
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("shutdown signal received, exiting");
            state.running = false;
            break;
        }

        // Exit timer for CI
        if let Some(dur) = exit_duration {
            if start_time.elapsed() >= dur {
                info!("exit timer fired after {}s", dur.as_secs());
                state.running = false;
                break;
            }
        }

        // Session clock
        if last_tick.elapsed() >= tick_interval {
            state.tick_clock();
            last_tick = Instant::now();
        }

        // Periodic status logging
        if last_status_log.elapsed() >= status_interval {
            info!(
                frames = state.frames_seen,
                last_frame_ms = ?state.last_frame_ms,
                clients = state.ipc_server.clients.len(),
                page = state.gesture.page.as_str(),
                "daemon status"
            );
            last_status_log = Instant::now();
        }

        // Poll IPC clients
        IpcServer::poll_clients(&mut state);

        event_loop.dispatch(Some(poll_interval), &mut state)?;
    }

    // Clean up IPC socket
    let _ = std::fs::remove_file(&state.ipc_server.socket_path);

    info!(
        frames = state.frames_seen,
        clients = state.ipc_server.clients.len(),
        "daemon shutting down"
    );
    Ok(())
}

/// Replay a message file: one s-expression per line, events and command
/// responses printed to stdout.
pub fn run_replay(config: Config, path: &Path) -> anyhow::Result<()> {
    let file =
        File::open(path).with_context(|| format!("open replay file {}", path.display()))?;
    let mut state = PanelState::new(config);
    info!(path = %path.display(), "replaying messages");

    replay_stream(&mut state, BufReader::new(file), &mut |line| {
        println!("{line}");
    })?;

    info!(
        frames = state.frames_seen,
        seconds = state.gesture.clock.seconds,
        page = state.gesture.page.as_str(),
        "replay finished"
    );
    Ok(())
}

/// Feed replay lines through the evaluator. Blank lines and `;` comments
/// are skipped; malformed lines are logged and skipped; captured output
/// (events, responses) and the transport handshake are ignored so a raw
/// session transcript replays cleanly.
fn replay_stream<R: BufRead>(
    state: &mut PanelState,
    reader: R,
    emit: &mut impl FnMut(&str),
) -> anyhow::Result<()> {
    let tick_ms = state.config.clock.tick_ms;
    let mut next_tick_ms: Option<u64> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }
        if !state.running {
            info!(line = line_no, "evaluator stopped, ignoring remaining input");
            break;
        }

        let value = match lexpr::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = line_no, "skipping malformed message: {}", e);
                continue;
            }
        };

        match dispatch::get_keyword(&value, "type").as_deref() {
            Some("body-frame") => {
                let frame = match skeleton::parse_frame(&value) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(line = line_no, "skipping bad frame: {}", e);
                        continue;
                    }
                };
                // Synthesize wall-clock ticks from the frame timeline.
                let next = next_tick_ms.get_or_insert(frame.timestamp_ms + tick_ms);
                while frame.timestamp_ms >= *next {
                    for event in state.tick_clock() {
                        emit(&event.to_sexp());
                    }
                    *next += tick_ms;
                }
                for event in state.advance_frame(&frame) {
                    emit(&event.to_sexp());
                }
            }
            Some("hello") => debug!(line = line_no, "ignoring handshake message"),
            Some("event") | Some("response") => {
                debug!(line = line_no, "ignoring captured output message");
            }
            Some(command) => {
                let msg_id = dispatch::get_int(&value, "id").unwrap_or(0);
                if let Some(response) = dispatch::dispatch_command(state, command, msg_id, &value)
                {
                    emit(&response);
                }
            }
            None => warn!(line = line_no, "skipping message without :type"),
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────
