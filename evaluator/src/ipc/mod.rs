//! IPC subsystem: Unix-socket s-expression protocol.
//!
//! Clients connect to a length-prefixed message socket, authenticate
//! with a hello handshake, push body frames and control commands, and
//! receive every panel event as a broadcast.

pub mod dispatch;
pub mod server;

pub use server::IpcServer;
