//! ssh client invocation
//!
//! Builds the argument vector for the system ssh client and runs it with
//! the caller's standard streams.

pub mod command;
pub mod launcher;
pub mod sanitize;

// Re-exports
pub use command::{build_ssh_args, SshInvocation};
pub use launcher::{exit_code, Launcher, SystemSsh};
pub use sanitize::{escape_for_shell, quote_command, quote_word};
