//! Observers for the text a wrapped agent streams while it works

use std::io::Write;

/// Receives the progress of an agent invoked as a tool.
///
/// Sinks only observe; the returned tool result is built independently.
pub trait StreamSink: Send + Sync {
    fn on_start(&self, _agent: &str, _task: &str) {}

    fn on_delta(&self, agent: &str, delta: &str);

    fn on_finish(&self, _agent: &str) {}
}

/// Echoes sub-agent progress to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StreamSink for StdoutSink {
    fn on_start(&self, agent: &str, task: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "  [{}] Processing: {}", agent, task);
        let _ = write!(out, "  [{}] Result: ", agent);
        let _ = out.flush();
    }

    fn on_delta(&self, _agent: &str, delta: &str) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{}", delta);
        let _ = out.flush();
    }

    fn on_finish(&self, _agent: &str) {
        let _ = writeln!(std::io::stdout().lock());
    }
}
