use crate::context::DefaultInvocationContext;
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use relay_core::{Agent, Content, Error, Event, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Boxed stream of events produced by a run
pub type EventStream = Box<dyn Stream<Item = Result<Event>> + Send + Unpin>;

/// Runs one agent against free-form input.
///
/// The turn limit in [`RunConfig`] is handed to the agent through its
/// invocation context; agents that exceed it end their stream with
/// [`Error::TurnLimitExceeded`].
pub struct Runner {
    app_name: String,
    agent: Arc<dyn Agent>,
}

impl Runner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub async fn run(&self, input: impl Into<String>, config: RunConfig) -> EventStream {
        self.run_with_cancellation(input, config, None).await
    }

    pub async fn run_with_cancellation(
        &self,
        input: impl Into<String>,
        config: RunConfig,
        cancel_token: Option<CancellationToken>,
    ) -> EventStream {
        let invocation_id = Uuid::new_v4().to_string();
        let ctx = Arc::new(DefaultInvocationContext::new(
            invocation_id.clone(),
            self.app_name.clone(),
            Some(Content::new_user_text(input)),
            config.max_turns,
        ));

        tracing::debug!(
            invocation_id = %invocation_id,
            agent = %self.agent.name(),
            max_turns = ?config.max_turns,
            "Starting run"
        );

        let agent = self.agent.clone();
        let cancel_token = cancel_token.unwrap_or_default();

        Box::new(Box::pin(stream! {
            let mut event_stream = agent.run(ctx).await;

            loop {
                // `None` means the token fired before the next event arrived.
                let next = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => None,
                    next = event_stream.next() => Some(next),
                };

                let Some(next) = next else {
                    tracing::debug!(invocation_id = %invocation_id, "Run cancelled");
                    yield Err(Error::Cancelled);
                    return;
                };

                match next {
                    Some(Ok(event)) => yield Ok(event),
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => return,
                }
            }
        }))
    }
}

/// Text increments of a run, in arrival order.
///
/// Only partial model events contribute; the first error ends the stream.
pub fn text_deltas(events: EventStream) -> impl Stream<Item = Result<String>> + Send + Unpin {
    Box::pin(events.filter_map(|event| async move {
        match event {
            Ok(event) => event.text_delta().map(Ok),
            Err(e) => Some(Err(e)),
        }
    }))
}

pub struct RunnerBuilder {
    app_name: Option<String>,
    agent: Option<Arc<dyn Agent>>,
}

impl RunnerBuilder {
    pub fn new() -> Self {
        Self {
            app_name: None,
            agent: None,
        }
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn build(self) -> Result<Runner> {
        let agent = self
            .agent
            .ok_or_else(|| Error::config_error("Agent is required"))?;

        Ok(Runner {
            app_name: self.app_name.unwrap_or_else(|| "relay".to_string()),
            agent,
        })
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Hard cap on agent turns; `None` leaves the agent's own default
    pub max_turns: Option<u32>,
}

impl RunConfig {
    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}
