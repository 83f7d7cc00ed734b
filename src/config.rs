//! Configuration and CLI argument parsing for scw-exec

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ExecError, Result};

/// Default endpoint of the compute API
pub const DEFAULT_API_ENDPOINT: &str = "https://api.scaleway.com/";

/// Default ssh client executable
pub const DEFAULT_SSH_BIN: &str = "ssh";

/// Name of the credentials file in the home directory
pub const RC_FILE_NAME: &str = ".scwrc";

/// scw-exec CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "scw-exec")]
#[command(version)]
#[command(about = "Run a command on a running server")]
#[command(after_help = "Examples:
    $ scw-exec myserver bash
    $ scw-exec myserver 'tmux a -t joe || tmux new -s joe || bash'
    $ exec_secure=1 scw-exec myserver bash
    $ scw-exec -w myserver bash
    $ scw-exec myserver tmux new -d sleep 10
    $ scw-exec myserver ls -la | grep password")]
pub struct Args {
    /// Wait for SSH to be ready
    #[arg(short, long)]
    pub wait: bool,

    /// Do not force pseudo-terminal allocation
    #[arg(short = 'T', long)]
    pub no_tty: bool,

    /// Give up waiting after this many seconds (0 or unset waits forever)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Compute API endpoint
    #[arg(long, default_value = DEFAULT_API_ENDPOINT, env = "SCW_API_ENDPOINT")]
    pub api_endpoint: String,

    /// API token (falls back to ~/.scwrc)
    #[arg(long, env = "SCW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Organization id (falls back to ~/.scwrc)
    #[arg(long, env = "SCW_ORGANIZATION")]
    pub organization: Option<String>,

    /// ssh client executable
    #[arg(long, default_value = DEFAULT_SSH_BIN, env = "SCW_SSH_BIN")]
    pub ssh_bin: String,

    /// Server name, id or id prefix, then the command and its arguments.
    ///
    /// One positional so that option parsing stops at SERVER: everything
    /// after it belongs to the remote command.
    #[arg(
        value_names = ["SERVER", "COMMAND"],
        required = true,
        num_args = 2..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub target: Vec<String>,
}

impl Args {
    /// Server token (first positional)
    pub fn server(&self) -> &str {
        self.target.first().map(String::as_str).unwrap_or_default()
    }

    /// Remote command tokens (everything after SERVER)
    pub fn command(&self) -> &[String] {
        self.target.get(1..).unwrap_or_default()
    }
}

/// Contents of `~/.scwrc`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RcFile {
    #[serde(default)]
    pub organization: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub api_endpoint: Option<String>,
}

impl RcFile {
    /// Load `~/.scwrc`, returning `None` when it does not exist
    pub fn load() -> Result<Option<Self>> {
        match dirs::home_dir() {
            Some(home) => Self::load_from(&home.join(RC_FILE_NAME)),
            None => Ok(None),
        }
    }

    /// Load a credentials file from an explicit path
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let rc = serde_json::from_str(&content).map_err(|e| {
            ExecError::config(format!("Invalid {}: {}", path.display(), e))
        })?;
        Ok(Some(rc))
    }
}

/// Behavior switches for a single invocation.
///
/// Read once at startup and handed to the argument builder, so nothing
/// downstream looks at the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions {
    /// `DEBUG=1`: verbose ssh, shell tracing, debug logs
    pub debug: bool,

    /// `exec_secure=1`: keep ssh host key verification
    pub secure: bool,

    /// `-w`: wait for the server and its SSH port
    pub wait: bool,

    /// Force a pseudo-terminal on the remote side
    pub tty: bool,
}

impl ExecOptions {
    /// Build options from flags plus an environment lookup
    pub fn from_lookup<F>(wait: bool, tty: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = |key: &str| lookup(key).as_deref() == Some("1");
        Self {
            debug: enabled("DEBUG"),
            secure: enabled("exec_secure"),
            wait,
            tty,
        }
    }

    /// Build options from flags plus the process environment
    pub fn from_env(wait: bool, tty: bool) -> Self {
        Self::from_lookup(wait, tty, |key| std::env::var(key).ok())
    }
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Compute API endpoint
    pub api_endpoint: String,

    /// API token
    pub token: String,

    /// Organization id, used to narrow server listings
    pub organization: Option<String>,

    /// ssh client executable
    pub ssh_bin: PathBuf,

    /// Deadline for readiness waits (None = unbounded)
    pub timeout: Option<Duration>,

    /// User-supplied server token
    pub server: String,

    /// Remote command tokens
    pub command: Vec<String>,

    /// Invocation switches
    pub options: ExecOptions,
}

impl Config {
    /// Create Config from CLI Args, the environment and `~/.scwrc`
    pub fn from_args(args: Args) -> Result<Self> {
        let rc = if args.token.is_none() || args.organization.is_none() {
            RcFile::load()?
        } else {
            None
        };
        let options = ExecOptions::from_env(args.wait, !args.no_tty);
        Self::build(args, rc, options)
    }

    /// Assemble a Config from already-gathered inputs
    pub fn build(args: Args, rc: Option<RcFile>, options: ExecOptions) -> Result<Self> {
        validate_args(&args)?;

        let rc = rc.unwrap_or_default();
        let token = args
            .token
            .filter(|t| !t.is_empty())
            .or(rc.token.filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                ExecError::config("Missing API token: use --token, SCW_TOKEN or ~/.scwrc")
            })?;
        let organization = args.organization.or(rc.organization);

        // An explicit flag or env value wins over the rc file; clap fills in the
        // default otherwise, which the rc file may override.
        let api_endpoint = match rc.api_endpoint {
            Some(endpoint) if args.api_endpoint == DEFAULT_API_ENDPOINT => endpoint,
            _ => args.api_endpoint,
        };

        let mut target = args.target.into_iter();
        let server = target.next().unwrap_or_default();
        let command: Vec<String> = target.collect();

        Ok(Config {
            api_endpoint,
            token,
            organization,
            ssh_bin: PathBuf::from(args.ssh_bin),
            timeout: parse_timeout(args.timeout),
            server,
            command,
            options,
        })
    }
}

/// Validate CLI arguments
fn validate_args(args: &Args) -> Result<()> {
    let mut errors = Vec::new();

    if args.server().trim().is_empty() {
        errors.push("SERVER cannot be empty".to_string());
    }

    if args.command().iter().all(|token| token.is_empty()) {
        errors.push("COMMAND cannot be empty".to_string());
    }

    if args.ssh_bin.is_empty() {
        errors.push("--ssh-bin cannot be empty".to_string());
    }

    if !errors.is_empty() {
        return Err(ExecError::Config(errors.join("\n")));
    }

    Ok(())
}

/// Parse the wait deadline
///
/// - None (not provided) → None (unbounded)
/// - 0 → None (unbounded)
/// - positive → Some(seconds)
pub fn parse_timeout(value: Option<u64>) -> Option<Duration> {
    value.filter(|&secs| secs > 0).map(Duration::from_secs)
}
