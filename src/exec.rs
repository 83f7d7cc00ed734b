//! The exec pipeline
//!
//! resolve → (optionally) wait for readiness → build the ssh invocation →
//! run it and hand back its exit code.

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::api::{resolve_server, Server, ServerApi};
use crate::config::{Config, ExecOptions, DEFAULT_SSH_BIN};
use crate::error::{ExecError, Result};
use crate::ssh::{Launcher, SshInvocation};
use crate::wait::{wait_for_server_ready, WaitPolicy};

/// Runs one command on one server
#[derive(Debug, Clone)]
pub struct RemoteExec<A, L> {
    /// Server API
    api: A,

    /// Session runner
    launcher: L,

    /// ssh executable
    ssh_bin: PathBuf,

    /// Invocation switches
    options: ExecOptions,

    /// Cadence and deadline of readiness waits
    policy: WaitPolicy,
}

impl<A: ServerApi, L: Launcher> RemoteExec<A, L> {
    /// Create a pipeline with the default ssh binary and wait policy
    pub fn new(api: A, launcher: L, options: ExecOptions) -> Self {
        Self {
            api,
            launcher,
            ssh_bin: PathBuf::from(DEFAULT_SSH_BIN),
            options,
            policy: WaitPolicy::default(),
        }
    }

    /// Create a pipeline from the validated configuration
    pub fn from_config(api: A, launcher: L, config: &Config) -> Self {
        Self::new(api, launcher, config.options)
            .with_ssh_bin(config.ssh_bin.clone())
            .with_policy(WaitPolicy::default().with_deadline(config.timeout))
    }

    /// Use another ssh executable
    pub fn with_ssh_bin(mut self, ssh_bin: impl Into<PathBuf>) -> Self {
        self.ssh_bin = ssh_bin.into();
        self
    }

    /// Use another wait policy
    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Server API in use
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Session runner in use
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Resolve `needle` and fetch the server, waiting for it if requested
    pub async fn locate(&self, needle: &str) -> Result<Server> {
        let id = resolve_server(&self.api, needle).await?;

        if self.options.wait {
            info!("Waiting for server {} to be ready", id);
            wait_for_server_ready(&self.api, &id, self.policy).await
        } else {
            self.api.get_server(&id).await
        }
    }

    /// Build the ssh invocation running `command` on `server`
    pub fn invocation<S: AsRef<str>>(&self, server: &Server, command: &[S]) -> Result<SshInvocation> {
        let address = server
            .public_address()
            .ok_or_else(|| ExecError::NoPublicAddress(server.id.clone()))?;
        Ok(SshInvocation::new(
            self.ssh_bin.clone(),
            address,
            command,
            &self.options,
        ))
    }

    /// Run `command` on the server named by `needle`.
    ///
    /// `cancel` only interrupts the lookup and readiness phase; once ssh is
    /// running the session owns the terminal until it exits.
    pub async fn run<S, C>(&self, needle: &str, command: &[S], cancel: C) -> Result<i32>
    where
        S: AsRef<str>,
        C: Future<Output = ()>,
    {
        let server = tokio::select! {
            server = self.locate(needle) => server?,
            _ = cancel => return Err(ExecError::Cancelled(format!("server {}", needle))),
        };
        debug!("Server {} ({}) is {}", server.name, server.id, server.state);

        let invocation = self.invocation(&server, command)?;
        self.launcher.launch(&invocation).await
    }
}
