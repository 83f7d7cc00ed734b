//! scw-exec - run a command on a Scaleway server over SSH
//!
//! This crate resolves a server name or id through the compute API,
//! optionally waits for the server to be running and for its SSH port to
//! accept connections, then runs the command through the system `ssh`
//! client with the caller's terminal attached.
//!
//! # Features
//!
//! - Server lookup by full id, id prefix or exact name
//! - `--wait`: poll the server state, then TCP port 22, once per second
//! - Optional deadline on waits (`--timeout`), Ctrl-C to abort them
//! - `DEBUG=1` for verbose ssh and `sh -x` tracing on the remote side
//! - `exec_secure=1` to keep ssh host key verification
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! scw-exec myserver 'tmux a -t joe || tmux new -s joe || bash'
//! scw-exec -w myserver uptime
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod exec;
pub mod ssh;
pub mod wait;

// Re-exports for convenience
pub use api::{resolve_server, ScalewayClient, Server, ServerApi, ServerState};
pub use config::{Args, Config, ExecOptions};
pub use error::{ExecError, Result};
pub use exec::RemoteExec;
pub use ssh::{build_ssh_args, Launcher, SshInvocation, SystemSsh};
pub use wait::{
    poll_until, wait_for_server_ready, wait_for_server_state, wait_for_tcp_port_open, WaitPolicy,
};
