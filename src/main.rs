//! scw-exec - Entry point
//!
//! Parses CLI arguments, sets up logging, runs the exec pipeline and exits
//! with the remote command's status.

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use scw_exec::config::{Args, Config};
use scw_exec::{RemoteExec, ScalewayClient, SystemSsh};

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the remote session
    let level = if std::env::var("DEBUG").as_deref() == Ok("1") {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit here, before any network call
    let args = Args::parse();

    let config = Config::from_args(args)?;
    debug!(
        "scw-exec v{}: {} on {} via {}",
        env!("CARGO_PKG_VERSION"),
        config.command.join(" "),
        config.server,
        config.api_endpoint
    );

    let api = ScalewayClient::from_config(&config)?;
    let exec = RemoteExec::from_config(api, SystemSsh, &config);

    let code = exec
        .run(&config.server, &config.command, interrupted())
        .await
        .with_context(|| format!("Failed to run command on {}", config.server))?;

    if code == 0 {
        debug!("Command successfully executed");
    } else {
        debug!("Command execution failed with exit code {}", code);
    }
    std::process::exit(code);
}
