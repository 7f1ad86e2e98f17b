use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client '{0}' already exists")]
    DuplicateName(String),

    #[error("Failed to connect to MCP server '{name}' at {url}: {source}")]
    Connection {
        name: String,
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Client '{0}' not found")]
    NotFound(String),

    #[error("Unknown agent type: {agent_type}. Available: {available:?}")]
    UnknownAgentType {
        agent_type: String,
        available: Vec<String>,
    },

    #[error("Duplicate tool name: {0}")]
    DuplicateToolName(String),

    #[error("Agent '{agent}' exceeded the maximum of {max_turns} turns")]
    TurnLimitExceeded { agent: String, max_turns: u32 },

    #[error("Cleanup of client '{name}' failed: {source}")]
    Cleanup {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool '{tool}' execution failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("LLM request failed: {0}")]
    LLMError(String),

    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use relay_core::Error;
    /// let err = Error::config_error("Agent type id must not be empty");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating general errors with a message
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }

    /// True for the turn-limit condition raised by the runner
    pub fn is_turn_limit(&self) -> bool {
        matches!(self, Error::TurnLimitExceeded { .. })
    }
}
