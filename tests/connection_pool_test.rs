//! Connection pool behaviour against in-memory MCP sessions

use relay_core::Error;
use relay_mcp::testing::{MockConnector, MockSession};
use relay_mcp::{ConnectionState, HttpConnectionParams, McpClientManager, StopOptions};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn params(url: &str) -> HttpConnectionParams {
    HttpConnectionParams::new(url)
}

#[tokio::test]
async fn test_start_stop_scenario() -> anyhow::Result<()> {
    let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

    manager.start_client("a", params("http://addr1/mcp")).await?;
    manager.start_client("b", params("http://addr2/mcp")).await?;
    assert_eq!(manager.list_clients(), vec!["a", "b"]);

    manager.stop_client("a", StopOptions::default()).await?;
    assert_eq!(manager.list_clients(), vec!["b"]);

    manager.stop_all(Some(Duration::from_secs(5))).await;
    assert!(manager.list_clients().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_insertion_order_preserved() -> anyhow::Result<()> {
    let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));
    let names = ["math", "text", "data", "search", "files"];

    for name in names {
        manager
            .start_client(name, params(&format!("http://{}/mcp", name)))
            .await?;
    }

    assert_eq!(manager.list_clients(), names);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_name_leaves_pool_unchanged() -> anyhow::Result<()> {
    let connector = Arc::new(MockConnector::new());
    let manager = McpClientManager::with_connector(connector.clone());

    let original = manager.start_client("math", params("http://math/mcp")).await?;
    let err = manager
        .start_client("math", params("http://other/mcp"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateName(ref name) if name == "math"));
    assert_eq!(manager.list_clients(), vec!["math"]);
    assert!(Arc::ptr_eq(&manager.get("math")?, &original));
    // Rejected before any connection attempt.
    assert_eq!(connector.opened().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_connection_failure_not_tracked() {
    let connector = MockConnector::new().with_session(
        "http://down/mcp",
        MockSession::new().with_connect_error("connection refused"),
    );
    let manager = McpClientManager::with_connector(Arc::new(connector));

    let err = manager
        .start_client("down", params("http://down/mcp"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("'down'"));
    assert!(message.contains("http://down/mcp"));
    assert!(message.contains("connection refused"));
    assert!(!manager.contains("down"));
}

#[tokio::test]
async fn test_get_returns_same_handle() -> anyhow::Result<()> {
    let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));

    let started = manager.start_client("math", params("http://math/mcp")).await?;
    assert!(Arc::ptr_eq(&manager.get("math")?, &started));
    assert_eq!(started.state(), ConnectionState::Connected);

    manager.stop_client("math", StopOptions::default()).await?;
    assert!(matches!(manager.get("math"), Err(Error::NotFound(_))));
    assert!(matches!(manager.get("never"), Err(Error::NotFound(_))));
    assert_eq!(started.state(), ConnectionState::Removed);
    Ok(())
}

#[tokio::test]
async fn test_stop_client_absent_even_when_cleanup_fails() -> anyhow::Result<()> {
    let connector = Arc::new(
        MockConnector::new()
            .with_session(
                "http://broken/mcp",
                MockSession::new().with_cleanup_error("socket closed"),
            )
            .with_session(
                "http://slow/mcp",
                MockSession::new().with_cleanup_delay(Duration::from_secs(30)),
            ),
    );
    let manager = McpClientManager::with_connector(connector);
    manager.start_client("broken", params("http://broken/mcp")).await?;
    manager.start_client("slow", params("http://slow/mcp")).await?;

    manager.stop_client("broken", StopOptions::default()).await?;
    assert!(!manager.contains("broken"));

    manager
        .stop_client(
            "slow",
            StopOptions::default().timeout(Some(Duration::from_millis(50))),
        )
        .await?;
    assert!(manager.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_client_surfaces_errors_on_request() -> anyhow::Result<()> {
    let connector = MockConnector::new().with_session(
        "http://broken/mcp",
        MockSession::new().with_cleanup_error("socket closed"),
    );
    let manager = McpClientManager::with_connector(Arc::new(connector));
    manager.start_client("broken", params("http://broken/mcp")).await?;

    let err = manager
        .stop_client("broken", StopOptions::default().suppress_errors(false))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cleanup { ref name, .. } if name == "broken"));
    assert!(!manager.contains("broken"));
    Ok(())
}

#[tokio::test]
async fn test_stop_all_empties_pool_when_every_cleanup_fails() -> anyhow::Result<()> {
    let mut connector = MockConnector::new();
    for index in 0..3 {
        connector = connector.with_session(
            format!("http://server{}/mcp", index),
            MockSession::new().with_cleanup_error("boom"),
        );
    }
    let manager = McpClientManager::with_connector(Arc::new(connector));
    for index in 0..3 {
        manager
            .start_client(
                format!("server{}", index),
                params(&format!("http://server{}/mcp", index)),
            )
            .await?;
    }

    manager.stop_all(Some(Duration::from_secs(1))).await;
    assert!(manager.list_clients().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_all_bounds_cleanups_in_parallel() -> anyhow::Result<()> {
    const CLIENTS: usize = 8;
    let timeout = Duration::from_millis(200);

    let mut connector = MockConnector::new();
    for index in 0..CLIENTS {
        connector = connector.with_session(
            format!("http://slow{}/mcp", index),
            MockSession::new().with_cleanup_delay(Duration::from_secs(30)),
        );
    }
    let manager = McpClientManager::with_connector(Arc::new(connector));
    for index in 0..CLIENTS {
        manager
            .start_client(
                format!("slow{}", index),
                params(&format!("http://slow{}/mcp", index)),
            )
            .await?;
    }

    let started = Instant::now();
    manager.stop_all(Some(timeout)).await;
    let elapsed = started.elapsed();

    assert!(manager.is_empty());
    // Serial bounding would take CLIENTS * timeout.
    assert!(
        elapsed < timeout * 3,
        "stop_all took {:?} for {} clients",
        elapsed,
        CLIENTS
    );
    Ok(())
}

#[tokio::test]
async fn test_stop_unknown_client_is_noop() -> anyhow::Result<()> {
    let manager = McpClientManager::with_connector(Arc::new(MockConnector::new()));
    manager.start_client("math", params("http://math/mcp")).await?;

    manager.stop_client("nope", StopOptions::default()).await?;
    assert_eq!(manager.list_clients(), vec!["math"]);
    Ok(())
}

#[tokio::test]
async fn test_independent_managers_do_not_interact() -> anyhow::Result<()> {
    let first = McpClientManager::with_connector(Arc::new(MockConnector::new()));
    let second = McpClientManager::with_connector(Arc::new(MockConnector::new()));

    first.start_client("math", params("http://math/mcp")).await?;
    second.start_client("math", params("http://math/mcp")).await?;

    first.stop_all(None).await;
    assert!(first.is_empty());
    assert_eq!(second.list_clients(), vec!["math"]);
    Ok(())
}
