//! Server records returned by the compute API

use serde::Deserialize;

/// Lifecycle state of a server.
///
/// Only the states the waiter cares about get their own variant; anything
/// else the API reports is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Starting,
    Stopping,
    Stopped,
    Other(String),
}

impl ServerState {
    /// Wire name of the state
    pub fn as_str(&self) -> &str {
        match self {
            ServerState::Running => "running",
            ServerState::Starting => "starting",
            ServerState::Stopping => "stopping",
            ServerState::Stopped => "stopped",
            ServerState::Other(s) => s,
        }
    }
}

impl From<&str> for ServerState {
    fn from(s: &str) -> Self {
        match s {
            "running" => ServerState::Running,
            "starting" => ServerState::Starting,
            "stopping" => ServerState::Stopping,
            "stopped" => ServerState::Stopped,
            other => ServerState::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ServerState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ServerState::from(s.as_str()))
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public address block of a server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicAddress {
    /// Dotted IP address
    pub address: String,

    #[serde(default)]
    pub id: Option<String>,
}

/// Snapshot of a server as seen by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Server {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub state: ServerState,

    #[serde(default)]
    pub public_ip: Option<PublicAddress>,
}

impl Server {
    /// Public IP, if the server has one attached
    pub fn public_address(&self) -> Option<&str> {
        self.public_ip
            .as_ref()
            .map(|ip| ip.address.as_str())
            .filter(|addr| !addr.is_empty())
    }
}

/// `GET /servers/{id}` body
#[derive(Debug, Deserialize)]
pub(crate) struct ServerEnvelope {
    pub server: Server,
}

/// `GET /servers` body
#[derive(Debug, Deserialize)]
pub(crate) struct ServerListEnvelope {
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
