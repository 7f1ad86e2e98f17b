//! Named pool of MCP client connections

use crate::client::McpClient;
use crate::connection::HttpConnectionParams;
use crate::session::{McpConnector, McpSession};
use crate::shield::{CleanupOutcome, shielded_cleanup};
use crate::streamable_http::StreamableHttpConnector;
use relay_core::{Error, RelayConfig, Result};
use relay_telemetry::connection_span;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::Instrument;

pub const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for stopping a single client
#[derive(Debug, Clone, Copy)]
pub struct StopOptions {
    /// How long to wait for cleanup; `None` waits until it finishes
    pub timeout: Option<Duration>,
    /// Discard cleanup failures instead of returning them
    pub suppress_errors: bool,
}

impl Default for StopOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_CLEANUP_TIMEOUT),
            suppress_errors: true,
        }
    }
}

impl StopOptions {
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn suppress_errors(mut self, suppress: bool) -> Self {
        self.suppress_errors = suppress;
        self
    }
}

/// Manages multiple MCP server connections by name.
///
/// Entries are removed from the pool before any cleanup starts, so `get` and
/// `list_clients` only ever observe fully connected clients.
///
/// # Example
///
/// ```no_run
/// use relay_mcp::{HttpConnectionParams, McpClientManager};
///
/// # async fn example() -> relay_core::Result<()> {
/// let manager = McpClientManager::new();
/// let math = manager
///     .start_client("math", HttpConnectionParams::new("http://localhost:8001/mcp"))
///     .await?;
/// let tools = math.list_tools().await?;
/// manager.stop_all(Some(std::time::Duration::from_secs(5))).await;
/// # Ok(())
/// # }
/// ```
pub struct McpClientManager {
    connector: Arc<dyn McpConnector>,
    clients: RwLock<Vec<(String, Arc<McpClient>)>>,
}

impl McpClientManager {
    /// Create a manager connecting over streamable HTTP
    pub fn new() -> Self {
        Self::with_connector(Arc::new(StreamableHttpConnector))
    }

    pub fn with_connector(connector: Arc<dyn McpConnector>) -> Self {
        Self {
            connector,
            clients: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, Arc<McpClient>)>> {
        self.clients.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, Arc<McpClient>)>> {
        self.clients.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Start and connect to an MCP server.
    ///
    /// Fails with [`Error::DuplicateName`] before any connection attempt when
    /// `name` is already tracked, and with [`Error::Connection`] when the
    /// server cannot be reached. A failed or cancelled attempt never leaves
    /// an entry in the pool.
    pub async fn start_client(
        &self,
        name: impl Into<String>,
        params: HttpConnectionParams,
    ) -> Result<Arc<McpClient>> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }

        let span = connection_span(&name, &params.url);
        self.connect_and_insert(name, params).instrument(span).await
    }

    async fn connect_and_insert(
        &self,
        name: String,
        params: HttpConnectionParams,
    ) -> Result<Arc<McpClient>> {
        let url = params.url.clone();
        let connection_error = |source| Error::Connection {
            name: name.clone(),
            url: url.clone(),
            source,
        };

        let session = self.connector.open(&params).map_err(connection_error)?;
        let mut half_open = HalfOpenGuard::new(session.clone());
        let client = Arc::new(McpClient::new(name.clone(), params, session));

        if let Err(source) = client.connect().await {
            tracing::warn!(error = %source, "Failed to connect to MCP server");
            half_open.release().await;
            return Err(connection_error(source));
        }

        // Another start with the same name may have won the race while we
        // were connecting.
        let inserted = {
            let mut clients = self.write();
            if clients.iter().any(|(n, _)| *n == name) {
                false
            } else {
                clients.push((name.clone(), client.clone()));
                true
            }
        };

        if !inserted {
            half_open.release().await;
            return Err(Error::DuplicateName(name));
        }

        half_open.disarm();
        tracing::info!("MCP client connected");
        Ok(client)
    }

    /// Start every server listed in the configuration, in order
    pub async fn start_from_config(&self, config: &RelayConfig) -> Result<Vec<Arc<McpClient>>> {
        let mut started = Vec::with_capacity(config.servers.len());
        for server in &config.servers {
            let client = self
                .start_client(server.name.clone(), HttpConnectionParams::from_config(server))
                .await?;
            started.push(client);
        }
        Ok(started)
    }

    /// Get a client by name
    pub fn get(&self, name: &str) -> Result<Arc<McpClient>> {
        self.read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, client)| client.clone())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Names of all active clients, in the order they were started
    pub fn list_clients(&self) -> Vec<String> {
        self.read().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Stop a single client with shielded cleanup.
    ///
    /// The client leaves the pool before cleanup begins. Stopping an unknown
    /// name does nothing.
    pub async fn stop_client(&self, name: &str, options: StopOptions) -> Result<()> {
        let removed = {
            let mut clients = self.write();
            clients
                .iter()
                .position(|(n, _)| n == name)
                .map(|index| clients.remove(index).1)
        };

        let Some(client) = removed else {
            return Ok(());
        };

        match close(client, options.timeout).await {
            Ok(_) => Ok(()),
            Err(source) if options.suppress_errors => {
                tracing::debug!(client = %name, error = %source, "Suppressed cleanup error");
                Ok(())
            }
            Err(source) => Err(Error::Cleanup {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Close all clients concurrently, each bounded by `timeout_per_client`.
    ///
    /// The pool is drained first. Failures are logged and never stop the
    /// other cleanups; this call always returns normally.
    pub async fn stop_all(&self, timeout_per_client: Option<Duration>) {
        let drained = std::mem::take(&mut *self.write());
        if drained.is_empty() {
            return;
        }

        tracing::info!(count = drained.len(), "Stopping all MCP clients");

        let closes = drained
            .into_iter()
            .map(|(name, client)| async move { (name, close(client, timeout_per_client).await) });
        let results = futures::future::join_all(closes).await;

        let mut failed = Vec::new();
        let mut timed_out = Vec::new();
        for (name, result) in results {
            match result {
                Ok(CleanupOutcome::Completed) => {}
                Ok(_) => timed_out.push(name),
                Err(_) => failed.push(name),
            }
        }

        tracing::info!(
            failed = ?failed,
            timed_out = ?timed_out,
            "Stopped all MCP clients"
        );
    }
}

impl Default for McpClientManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the client's cleanup behind the shield and record the outcome.
async fn close(client: Arc<McpClient>, timeout: Option<Duration>) -> anyhow::Result<CleanupOutcome> {
    client.begin_close();

    let session = client.session();
    let closing = client.clone();
    let result = shielded_cleanup(
        async move {
            let result = session.cleanup().await;
            closing.finish_close();
            result
        },
        timeout,
    )
    .await;

    match &result {
        Ok(CleanupOutcome::Completed) => {
            tracing::info!(client = %client.name(), "MCP client closed");
        }
        Ok(CleanupOutcome::TimedOut) => {
            tracing::warn!(
                client = %client.name(),
                timeout = ?timeout,
                "MCP client cleanup timed out, abandoning it"
            );
        }
        Ok(CleanupOutcome::Aborted) => {
            tracing::warn!(client = %client.name(), "MCP client cleanup aborted by runtime");
        }
        Err(e) => {
            tracing::warn!(client = %client.name(), error = %e, "MCP client cleanup failed");
        }
    }

    client.finish_close();
    result
}

/// Releases a session that never made it into the pool.
///
/// If the connect attempt is cancelled the guard is dropped while still
/// armed and the cleanup is spawned onto the runtime.
struct HalfOpenGuard {
    session: Option<Arc<dyn McpSession>>,
}

impl HalfOpenGuard {
    fn new(session: Arc<dyn McpSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Best-effort cleanup; errors are swallowed
    async fn release(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let result = shielded_cleanup(
            async move { session.cleanup().await },
            Some(DEFAULT_CLEANUP_TIMEOUT),
        )
        .await;

        if let Err(e) = result {
            tracing::debug!(error = %e, "Ignoring cleanup error for half-open session");
        }
    }

    fn disarm(&mut self) {
        self.session = None;
    }
}

impl Drop for HalfOpenGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = session.cleanup().await {
                    tracing::debug!(error = %e, "Ignoring cleanup error for cancelled connect");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConnectionState;
    use crate::testing::{MockConnector, MockSession};

    fn params(url: &str) -> HttpConnectionParams {
        HttpConnectionParams::new(url)
    }

    #[tokio::test]
    async fn test_start_and_list_preserves_order() {
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

        manager.start_client("math", params("http://math/mcp")).await.unwrap();
        manager.start_client("text", params("http://text/mcp")).await.unwrap();
        manager.start_client("data", params("http://data/mcp")).await.unwrap();

        assert_eq!(manager.list_clients(), vec!["math", "text", "data"]);
        assert_eq!(manager.len(), 3);
        assert!(manager.contains("text"));
    }

    #[tokio::test]
    async fn test_get_returns_same_handle() {
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

        let started = manager.start_client("math", params("http://math/mcp")).await.unwrap();
        let fetched = manager.get("math").unwrap();

        assert!(Arc::ptr_eq(&started, &fetched));
        assert_eq!(fetched.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

        assert!(matches!(manager.get("missing"), Err(Error::NotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_without_connecting() {
        let connector = Arc::new(MockConnector::new());
        let manager = McpClientManager::with_connector(connector.clone());

        let first = manager.start_client("math", params("http://math/mcp")).await.unwrap();
        let result = manager.start_client("math", params("http://other/mcp")).await;

        assert!(matches!(result, Err(Error::DuplicateName(name)) if name == "math"));
        assert_eq!(connector.opened().len(), 1);
        assert_eq!(manager.list_clients(), vec!["math"]);
        assert!(Arc::ptr_eq(&first, &manager.get("math").unwrap()));
    }

    #[tokio::test]
    async fn test_connection_failure_cleans_up_and_wraps_error() {
        let connector = Arc::new(
            MockConnector::new().with_session(
                "http://down/mcp",
                MockSession::new().with_connect_error("connection refused"),
            ),
        );
        let manager = McpClientManager::with_connector(connector.clone());

        let err = manager
            .start_client("math", params("http://down/mcp"))
            .await
            .unwrap_err();

        match err {
            Error::Connection { name, url, source } => {
                assert_eq!(name, "math");
                assert_eq!(url, "http://down/mcp");
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(manager.is_empty());
        let session = connector.session_for("http://down/mcp").unwrap();
        assert_eq!(session.cleanup_finished(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_error_after_failed_connect_is_swallowed() {
        let connector = Arc::new(
            MockConnector::new().with_session(
                "http://down/mcp",
                MockSession::new()
                    .with_connect_error("refused")
                    .with_cleanup_error("cleanup failed too"),
            ),
        );
        let manager = McpClientManager::with_connector(connector);

        let err = manager
            .start_client("math", params("http://down/mcp"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_start_releases_half_open_session() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://slow/mcp",
            MockSession::new().with_connect_delay(Duration::from_secs(3)),
        ));
        let manager = Arc::new(McpClientManager::with_connector(connector.clone()));

        let starting = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .start_client("slow", params("http://slow/mcp"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        starting.abort();
        let _ = starting.await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(manager.is_empty());
        let session = connector.session_for("http://slow/mcp").unwrap();
        assert_eq!(session.cleanup_finished(), 1);
    }

    #[tokio::test]
    async fn test_stop_client_removes_and_cleans_up() {
        let connector = Arc::new(MockConnector::new());
        let manager = McpClientManager::with_connector(connector.clone());

        let math = manager.start_client("math", params("http://math/mcp")).await.unwrap();
        manager.start_client("text", params("http://text/mcp")).await.unwrap();

        manager.stop_client("math", StopOptions::default()).await.unwrap();

        assert_eq!(manager.list_clients(), vec!["text"]);
        assert_eq!(math.state(), ConnectionState::Removed);
        assert_eq!(
            connector.session_for("http://math/mcp").unwrap().cleanup_finished(),
            1
        );
    }

    #[tokio::test]
    async fn test_stop_unknown_client_is_noop() {
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

        assert!(
            manager
                .stop_client("missing", StopOptions::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_stop_client_error_suppressed_by_default() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://math/mcp",
            MockSession::new().with_cleanup_error("socket already closed"),
        ));
        let manager = McpClientManager::with_connector(connector);

        manager.start_client("math", params("http://math/mcp")).await.unwrap();
        assert!(manager.stop_client("math", StopOptions::default()).await.is_ok());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_stop_client_error_surfaced_when_requested() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://math/mcp",
            MockSession::new().with_cleanup_error("socket already closed"),
        ));
        let manager = McpClientManager::with_connector(connector);

        let math = manager.start_client("math", params("http://math/mcp")).await.unwrap();
        let err = manager
            .stop_client("math", StopOptions::default().suppress_errors(false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cleanup { ref name, .. } if name == "math"));
        assert!(manager.is_empty());
        assert_eq!(math.state(), ConnectionState::Removed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_client_timeout_still_removes() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://math/mcp",
            MockSession::new().with_cleanup_delay(Duration::from_secs(60)),
        ));
        let manager = McpClientManager::with_connector(connector.clone());

        let math = manager.start_client("math", params("http://math/mcp")).await.unwrap();
        let options = StopOptions::default()
            .timeout(Some(Duration::from_secs(1)))
            .suppress_errors(false);

        manager.stop_client("math", options).await.unwrap();

        assert!(manager.is_empty());
        assert_eq!(math.state(), ConnectionState::Removed);
        let session = connector.session_for("http://math/mcp").unwrap();
        assert_eq!(session.cleanup_started(), 1);
        assert_eq!(session.cleanup_finished(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_from_pool_before_cleanup_finishes() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://math/mcp",
            MockSession::new().with_cleanup_delay(Duration::from_secs(2)),
        ));
        let manager = Arc::new(McpClientManager::with_connector(connector));
        let math = manager.start_client("math", params("http://math/mcp")).await.unwrap();

        let stopping = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.stop_client("math", StopOptions::default()).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(manager.get("math"), Err(Error::NotFound(_))));
        assert_eq!(math.state(), ConnectionState::Closing);

        stopping.await.unwrap().unwrap();
        assert_eq!(math.state(), ConnectionState::Removed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_stop_does_not_interrupt_cleanup() {
        let connector = Arc::new(MockConnector::new().with_session(
            "http://math/mcp",
            MockSession::new().with_cleanup_delay(Duration::from_secs(2)),
        ));
        let manager = Arc::new(McpClientManager::with_connector(connector.clone()));
        let math = manager.start_client("math", params("http://math/mcp")).await.unwrap();

        let stopping = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.stop_client("math", StopOptions::default()).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        stopping.abort();
        let _ = stopping.await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let session = connector.session_for("http://math/mcp").unwrap();
        assert_eq!(session.cleanup_finished(), 1);
        assert_eq!(math.state(), ConnectionState::Removed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_stop_all_does_not_interrupt_cleanups() {
        let connector = Arc::new(
            MockConnector::new()
                .with_session(
                    "http://a/mcp",
                    MockSession::new().with_cleanup_delay(Duration::from_secs(2)),
                )
                .with_session(
                    "http://b/mcp",
                    MockSession::new().with_cleanup_delay(Duration::from_secs(2)),
                ),
        );
        let manager = Arc::new(McpClientManager::with_connector(connector.clone()));
        let a = manager.start_client("a", params("http://a/mcp")).await.unwrap();
        let b = manager.start_client("b", params("http://b/mcp")).await.unwrap();

        let stopping = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.stop_all(Some(Duration::from_secs(5))).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(manager.list_clients().is_empty());
        stopping.abort();
        let _ = stopping.await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        for url in ["http://a/mcp", "http://b/mcp"] {
            let session = connector.session_for(url).unwrap();
            assert_eq!(session.cleanup_finished(), 1, "{}", url);
        }
        assert_eq!(a.state(), ConnectionState::Removed);
        assert_eq!(b.state(), ConnectionState::Removed);
    }

    #[tokio::test]
    async fn test_stop_all_drains_even_when_cleanups_fail() {
        let connector = Arc::new(
            MockConnector::new()
                .with_session("http://a/mcp", MockSession::new().with_cleanup_error("a failed"))
                .with_session("http://b/mcp", MockSession::new().with_cleanup_error("b failed")),
        );
        let manager = McpClientManager::with_connector(connector.clone());

        manager.start_client("a", params("http://a/mcp")).await.unwrap();
        manager.start_client("b", params("http://b/mcp")).await.unwrap();
        manager.start_client("c", params("http://c/mcp")).await.unwrap();

        manager.stop_all(Some(Duration::from_secs(5))).await;

        assert!(manager.list_clients().is_empty());
        for (_, session) in connector.opened() {
            assert_eq!(session.cleanup_finished(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_bounds_in_parallel() {
        let mut connector = MockConnector::new();
        for i in 0..10 {
            connector = connector.with_session(
                format!("http://slow-{i}/mcp"),
                MockSession::new().with_cleanup_delay(Duration::from_secs(60)),
            );
        }
        let manager = McpClientManager::with_connector(Arc::new(connector));
        for i in 0..10 {
            manager
                .start_client(format!("slow-{i}"), params(&format!("http://slow-{i}/mcp")))
                .await
                .unwrap();
        }

        let started = tokio::time::Instant::now();
        manager.stop_all(Some(Duration::from_secs(1))).await;
        let elapsed = started.elapsed();

        assert!(manager.is_empty());
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_stop_all_on_empty_pool() {
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));
        manager.stop_all(None).await;
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_start_from_config() {
        let config = RelayConfig::from_toml_str(
            r#"
            [[servers]]
            name = "math"
            url = "http://math/mcp"

            [[servers]]
            name = "text"
            url = "http://text/mcp"
            cache_tools_list = false
            "#,
        )
        .unwrap();
        let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

        let started = manager.start_from_config(&config).await.unwrap();

        assert_eq!(started.len(), 2);
        assert_eq!(manager.list_clients(), vec!["math", "text"]);
        assert!(!manager.get("text").unwrap().params().cache_tools_list);
    }
}
