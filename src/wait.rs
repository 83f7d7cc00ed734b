//! Readiness polling
//!
//! Every wait in the crate goes through [`poll_until`]: a fixed-cadence loop
//! with an optional overall deadline. Without a deadline a wait is unbounded
//! and only ends when its condition holds (or the caller drops the future).

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::api::{Server, ServerApi, ServerState};
use crate::error::{ExecError, Result};

/// Delay between two polling attempts
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Port checked before handing over to ssh
pub const SSH_PORT: u16 = 22;

/// Cadence and deadline of a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between attempts
    pub interval: Duration,

    /// Overall deadline (None = wait forever)
    pub deadline: Option<Duration>,

    /// Port checked once the server is running
    pub port: u16,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            deadline: None,
            port: SSH_PORT,
        }
    }
}

impl WaitPolicy {
    /// Unbounded policy with the given interval
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Set the overall deadline
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Check another port than 22
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn unbounded(self) -> Self {
        self.with_deadline(None)
    }
}

/// Run `fut`, failing with `ExecError::Timeout` once `deadline` elapses
async fn within<T>(
    deadline: Option<Duration>,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ExecError::Timeout(limit, what.to_string()))?,
        None => fut.await,
    }
}

/// Call `attempt` every `policy.interval` until it yields a value.
///
/// `Ok(None)` means "not yet" and schedules another attempt; an error ends
/// the loop immediately.
pub async fn poll_until<T, F, Fut>(policy: WaitPolicy, what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    within(policy.deadline, what, async {
        loop {
            if let Some(value) = attempt().await? {
                return Ok(value);
            }
            tokio::time::sleep(policy.interval).await;
        }
    })
    .await
}

/// Poll the API until the server reports `target`.
///
/// A failing fetch is not retried.
pub async fn wait_for_server_state<A: ServerApi + ?Sized>(
    api: &A,
    id: &str,
    target: &ServerState,
    policy: WaitPolicy,
) -> Result<Server> {
    let what = format!("server {} to be {}", id, target);
    poll_until(policy, &what, move || async move {
        let server = api.get_server(id).await?;
        if server.state == *target {
            Ok(Some(server))
        } else {
            debug!("Server {} is {}, waiting for {}", id, server.state, target);
            Ok(None)
        }
    })
    .await
}

/// Poll `address` until a TCP connection succeeds.
///
/// Connection failures are expected while a server boots and never end the
/// wait; only the policy deadline can.
pub async fn wait_for_tcp_port_open(address: &str, policy: WaitPolicy) -> Result<()> {
    let what = format!("{} to accept connections", address);
    poll_until(policy, &what, move || async move {
        match TcpStream::connect(address).await {
            Ok(stream) => {
                drop(stream);
                Ok(Some(()))
            }
            Err(e) => {
                debug!("{} not reachable yet: {}", address, e);
                Ok(None)
            }
        }
    })
    .await
}

/// Wait for the server to be running, then for its SSH port to open.
///
/// The policy deadline covers both phases together.
pub async fn wait_for_server_ready<A: ServerApi + ?Sized>(
    api: &A,
    id: &str,
    policy: WaitPolicy,
) -> Result<Server> {
    let inner = policy.unbounded();
    let what = format!("server {} to be ready", id);
    within(policy.deadline, &what, async {
        let server = wait_for_server_state(api, id, &ServerState::Running, inner).await?;
        info!("Server {} is running", id);

        let ip = server
            .public_address()
            .ok_or_else(|| ExecError::NoPublicAddress(id.to_string()))?;
        let dest = socket_destination(ip, policy.port);
        wait_for_tcp_port_open(&dest, inner).await?;
        info!("SSH port open on {}", dest);

        Ok(server)
    })
    .await
}

/// `host:port`, bracketing IPv6 literals
pub fn socket_destination(ip: &str, port: u16) -> String {
    if ip.contains(':') {
        format!("[{}]:{}", ip, port)
    } else {
        format!("{}:{}", ip, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PublicAddress;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Plays back a fixed sequence of states, repeating the last one
    struct ScriptedApi {
        states: Vec<&'static str>,
        address: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(states: Vec<&'static str>, address: Option<&'static str>) -> Self {
            Self {
                states,
                address,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ServerApi for ScriptedApi {
        async fn get_server(&self, id: &str) -> Result<Server> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let state = self.states[n.min(self.states.len() - 1)];
            Ok(Server {
                id: id.to_string(),
                name: "test".to_string(),
                state: ServerState::from(state),
                public_ip: self.address.map(|a| PublicAddress {
                    address: a.to_string(),
                    id: None,
                }),
            })
        }

        async fn list_servers(&self) -> Result<Vec<Server>> {
            Ok(Vec::new())
        }
    }

    struct FailingApi {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ServerApi for FailingApi {
        async fn get_server(&self, _id: &str) -> Result<Server> {
            *self.calls.lock().unwrap() += 1;
            Err(ExecError::api(500, "boom"))
        }

        async fn list_servers(&self) -> Result<Vec<Server>> {
            Ok(Vec::new())
        }
    }

    fn fast() -> WaitPolicy {
        WaitPolicy::every(Duration::from_millis(5))
    }

    #[test]
    fn test_default_policy() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert!(policy.deadline.is_none());
        assert_eq!(policy.port, 22);
    }

    #[test]
    fn test_socket_destination() {
        assert_eq!(socket_destination("10.0.0.5", SSH_PORT), "10.0.0.5:22");
        assert_eq!(socket_destination("2001:db8::1", 2222), "[2001:db8::1]:2222");
    }

    #[tokio::test]
    async fn test_state_wait_polls_until_running() {
        let api = ScriptedApi::new(vec!["starting", "starting", "running"], None);
        let server = wait_for_server_state(&api, "srv1", &ServerState::Running, fast())
            .await
            .unwrap();
        assert_eq!(server.state, ServerState::Running);
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_state_wait_returns_immediately_when_ready() {
        let api = ScriptedApi::new(vec!["running"], None);
        wait_for_server_state(&api, "srv1", &ServerState::Running, fast())
            .await
            .unwrap();
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_state_wait_fetch_error_is_not_retried() {
        let api = FailingApi {
            calls: Mutex::new(0),
        };
        let err = wait_for_server_state(&api, "srv1", &ServerState::Running, fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Api { status: 500, .. }));
        assert_eq!(*api.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_state_wait_deadline() {
        let api = ScriptedApi::new(vec!["stopped"], None);
        let policy = fast().with_deadline(Some(Duration::from_millis(50)));
        let err = wait_for_server_state(&api, "srv1", &ServerState::Running, policy)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout(..)));
        assert!(api.calls() > 1);
    }

    #[tokio::test]
    async fn test_port_wait_succeeds_once_listener_appears() {
        // Reserve a port, then free it so early attempts are refused
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = reserved.local_addr().unwrap();
        drop(reserved);

        let accepted = std::sync::Arc::new(AtomicUsize::new(0));
        let accepted_in_task = accepted.clone();
        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            let (_socket, _) = listener.accept().await.unwrap();
            accepted_in_task.fetch_add(1, Ordering::SeqCst);
        });

        wait_for_tcp_port_open(&addr.to_string(), WaitPolicy::every(Duration::from_millis(10)))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_port_wait_deadline() {
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = reserved.local_addr().unwrap();
        drop(reserved);

        let policy = fast().with_deadline(Some(Duration::from_millis(60)));
        let err = wait_for_tcp_port_open(&addr.to_string(), policy)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout(..)));
        assert!(err.to_string().starts_with("Timed out after 60ms"));
    }

    #[tokio::test]
    async fn test_ready_waits_for_state_then_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let api = ScriptedApi::new(vec!["stopped", "starting", "running"], Some("127.0.0.1"));

        let server = wait_for_server_ready(&api, "srv1", fast().with_port(port))
            .await
            .unwrap();
        assert_eq!(server.public_address(), Some("127.0.0.1"));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_ready_deadline_covers_both_phases() {
        let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = reserved.local_addr().unwrap().port();
        drop(reserved);
        let api = ScriptedApi::new(vec!["running"], Some("127.0.0.1"));

        let policy = fast()
            .with_port(port)
            .with_deadline(Some(Duration::from_millis(60)));
        let err = wait_for_server_ready(&api, "srv1", policy).await.unwrap_err();
        match err {
            ExecError::Timeout(_, what) => assert!(what.contains("srv1 to be ready")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_ready_requires_public_address() {
        let api = ScriptedApi::new(vec!["running"], None);
        let err = wait_for_server_ready(&api, "srv1", fast()).await.unwrap_err();
        assert!(matches!(err, ExecError::NoPublicAddress(_)));
    }
}
