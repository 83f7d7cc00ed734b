//! Running the ssh client
//!
//! The child gets the caller's stdin, stdout and stderr untouched, so
//! interactive sessions behave as if ssh had been started directly.

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::command::SshInvocation;
use crate::error::{ExecError, Result};

/// Exit code used when ssh died without one (killed by a signal)
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// Something that can run an ssh invocation to completion
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run the session and return its exit code
    async fn launch(&self, invocation: &SshInvocation) -> Result<i32>;
}

/// Launches the system ssh client as a child process
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSsh;

#[async_trait]
impl Launcher for SystemSsh {
    async fn launch(&self, invocation: &SshInvocation) -> Result<i32> {
        debug!("Executing: {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Launch {
                program: invocation.program.display().to_string(),
                source,
            })?;

        // SIGINT belongs to the session: the terminal delivers it to ssh as
        // well, so the parent only keeps waiting for the child to finish.
        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                _ = tokio::signal::ctrl_c() => {
                    debug!("Interrupt received, waiting for ssh to exit");
                }
            }
        };

        debug!("ssh exited with {}", status);
        Ok(exit_code(status))
    }
}

/// Exit code of a finished session
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(FALLBACK_EXIT_CODE)
}
