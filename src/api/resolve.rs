//! Mapping user-supplied server tokens to canonical ids

use tracing::debug;

use super::{Server, ServerApi};
use crate::error::{ExecError, Result};

/// Resolve a name, id or id prefix to exactly one server id.
///
/// An exact id match wins outright. Otherwise every server whose id starts
/// with `needle` or whose name equals it is a candidate, and exactly one
/// candidate must remain. The listing can be partial (first page only, or
/// narrowed to one organization), so when nothing in it matches, `needle`
/// is tried as a full id before giving up.
pub async fn resolve_server<A: ServerApi + ?Sized>(api: &A, needle: &str) -> Result<String> {
    let servers = api.list_servers().await?;
    let id = match pick_server(&servers, needle) {
        Err(ExecError::NotFound(_)) => fetch_by_id(api, needle).await?,
        other => other?,
    };
    debug!("Resolved '{}' to server {}", needle, id);
    Ok(id)
}

/// Direct lookup of `needle` as a canonical id
async fn fetch_by_id<A: ServerApi + ?Sized>(api: &A, needle: &str) -> Result<String> {
    match api.get_server(needle).await {
        Ok(server) => Ok(server.id),
        // Unknown or malformed ids
        Err(ExecError::Api {
            status: 400 | 404, ..
        }) => Err(ExecError::not_found(needle)),
        Err(e) => Err(e),
    }
}

/// Pure matching step of [`resolve_server`]
pub fn pick_server(servers: &[Server], needle: &str) -> Result<String> {
    if let Some(server) = servers.iter().find(|s| s.id == needle) {
        return Ok(server.id.clone());
    }

    let candidates: Vec<&Server> = servers
        .iter()
        .filter(|s| s.id.starts_with(needle) || s.name == needle)
        .collect();

    match candidates.as_slice() {
        [] => Err(ExecError::not_found(needle)),
        [only] => Ok(only.id.clone()),
        many => Err(ExecError::Ambiguous {
            needle: needle.to_string(),
            candidates: many
                .iter()
                .map(|s| format!("{} ({})", s.name, s.id))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
