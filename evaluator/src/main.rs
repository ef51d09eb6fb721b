//! KinPanel evaluator - gesture-zone evaluation for Kinect v2 body
//! tracking panels.
//!
//! Consumes screen-space joint positions and hand states over IPC and
//! drives a three-page panel UI: menu, agility game, and options.

mod body;
mod config;
mod error;
pub mod ipc;
mod session;
mod state;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::config::Config;
use crate::session::DaemonOptions;

#[derive(Parser, Debug)]
#[command(name = "kinpanel-evaluator", about = "Kinect v2 gesture-zone evaluator")]
struct Cli {
    /// Mode to run: daemon, replay, or print-config
    #[arg(long, default_value = "daemon")]
    mode: String,

    /// Configuration file (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay input file, one s-expression message per line
    #[arg(long)]
    replay_file: Option<PathBuf>,

    /// Exit after N seconds (daemon CI testing)
    #[arg(long)]
    exit_after: Option<u64>,

    /// IPC socket path (default: $XDG_RUNTIME_DIR/kinpanel-ipc.sock)
    #[arg(long)]
    ipc_socket: Option<String>,

    /// Log all IPC messages
    #[arg(long)]
    ipc_trace: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("kinpanel-evaluator {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout is reserved for replay output and
    // config dumps.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinpanel_evaluator=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("kinpanel-evaluator v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match cli.config {
        Some(ref path) => {
            info!("loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.validate()?;

    match cli.mode.as_str() {
        "daemon" => {
            info!("mode: daemon");
            session::run_daemon(
                config,
                DaemonOptions {
                    socket_path: cli.ipc_socket.map(PathBuf::from),
                    ipc_trace: cli.ipc_trace,
                    exit_after: cli.exit_after,
                },
            )
        }
        "replay" => {
            let path = match cli.replay_file {
                Some(path) => path,
                None => {
                    eprintln!("replay mode needs --replay-file");
                    std::process::exit(1);
                }
            };
            info!("mode: replay ({})", path.display());
            session::run_replay(config, &path)
        }
        "print-config" => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        other => {
            eprintln!("Unknown mode: {other}. Use: daemon, replay, or print-config");
            std::process::exit(1);
        }
    }
}
