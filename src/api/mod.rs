//! Compute API access
//!
//! The rest of the crate only talks to servers through [`ServerApi`], so the
//! waiter and the resolver can be driven by fakes in tests.

pub mod client;
pub mod resolve;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

// Re-exports
pub use client::ScalewayClient;
pub use resolve::resolve_server;
pub use types::{PublicAddress, Server, ServerState};

/// Read-only view of the server-management API
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Fetch the current record of one server by its canonical id
    async fn get_server(&self, id: &str) -> Result<Server>;

    /// List every server visible to the credentials
    async fn list_servers(&self) -> Result<Vec<Server>>;
}
