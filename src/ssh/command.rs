//! ssh client argument vector
//!
//! Scripts drive this tool by exact invocation, so the order of the arguments
//! below is fixed:
//!
//! ```text
//! [-q] [-o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no]
//!     -l root ADDRESS [-t] -- /bin/sh -e [-x] -c 'COMMAND'
//! ```

use std::fmt;
use std::path::PathBuf;

use super::sanitize::{quote_command, quote_word};
use crate::config::ExecOptions;

/// Remote login user
pub const LOGIN_USER: &str = "root";

/// Remote interpreter for the command
pub const REMOTE_SHELL: &str = "/bin/sh";

/// Options turning off host key checking
pub const INSECURE_OPTIONS: [&str; 4] = [
    "-o",
    "UserKnownHostsFile=/dev/null",
    "-o",
    "StrictHostKeyChecking=no",
];

/// Build the ssh arguments running `command` on `address`.
///
/// The last element is always the quoted command.
///
/// # Example
/// ```
/// use scw_exec::config::ExecOptions;
/// use scw_exec::ssh::command::build_ssh_args;
///
/// let opts = ExecOptions { secure: true, ..Default::default() };
/// let args = build_ssh_args("10.0.0.5", &["uptime"], &opts);
/// assert_eq!(
///     args,
///     ["-q", "-l", "root", "10.0.0.5", "--", "/bin/sh", "-e", "-c", "'uptime'"]
/// );
/// ```
pub fn build_ssh_args<S: AsRef<str>>(
    address: &str,
    command: &[S],
    options: &ExecOptions,
) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    if !options.debug {
        args.push("-q".to_string());
    }

    if !options.secure {
        args.extend(INSECURE_OPTIONS.iter().map(|s| s.to_string()));
    }

    args.extend(["-l", LOGIN_USER, address].map(String::from));

    if options.tty {
        args.push("-t".to_string());
    }

    args.extend(["--", REMOTE_SHELL, "-e"].map(String::from));

    if options.debug {
        args.push("-x".to_string());
    }

    args.push("-c".to_string());
    args.push(quote_command(command));

    args
}

/// A fully built ssh client invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshInvocation {
    /// ssh executable
    pub program: PathBuf,

    /// Arguments, ending with the quoted remote command
    pub args: Vec<String>,
}

impl SshInvocation {
    /// Build the invocation for `command` on `address`
    pub fn new<S: AsRef<str>>(
        program: impl Into<PathBuf>,
        address: &str,
        command: &[S],
        options: &ExecOptions,
    ) -> Self {
        Self {
            program: program.into(),
            args: build_ssh_args(address, command, options),
        }
    }

    /// The quoted remote command (the final argument)
    pub fn remote_command(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

impl fmt::Display for SshInvocation {
    /// Copy-pasteable command line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let plain = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+".contains(c));
            if plain {
                write!(f, " {}", arg)?;
            } else {
                write!(f, " {}", quote_word(arg))?;
            }
        }
        Ok(())
    }
}
