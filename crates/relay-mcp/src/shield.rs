//! Shielded cleanup
//!
//! Teardown of a connection runs in two layers. The inner layer is a spawned
//! task: dropping or cancelling the caller never interrupts it, so transport
//! bookkeeping is not torn down halfway. The outer layer waits on that task
//! with its own deadline; when the deadline passes the wait is abandoned and
//! the task is left to finish (or not) on its own.

use anyhow::{Result, anyhow};
use std::future::Future;
use std::time::Duration;

/// How a shielded cleanup ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The cleanup ran to completion without error
    Completed,
    /// The deadline passed before the cleanup finished
    TimedOut,
    /// The runtime cancelled the cleanup task (runtime shutdown)
    Aborted,
}

/// Run `op` to completion regardless of caller cancellation, waiting at most
/// `timeout` for it.
///
/// Errors returned by `op` are passed through; a timeout or a cancelled task
/// is reported as an outcome, not an error.
pub async fn shielded_cleanup<F>(op: F, timeout: Option<Duration>) -> Result<CleanupOutcome>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(op);

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => return Ok(CleanupOutcome::TimedOut),
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(())) => Ok(CleanupOutcome::Completed),
        Ok(Err(e)) => Err(e),
        Err(e) if e.is_cancelled() => Ok(CleanupOutcome::Aborted),
        Err(e) => Err(anyhow!("cleanup task panicked: {}", e)),
    }
}
