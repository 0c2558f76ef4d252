use thiserror::Error;

/// Top-level error type for Sidekick.
#[derive(Debug, Error)]
pub enum SidekickError {
    /// Error from the messaging transport (send, reply, chat fetch).
    #[error("transport error: {0}")]
    Transport(String),

    /// Error from the external AI service.
    #[error("ai service error: {0}")]
    Ai(String),

    /// An external call did not finish in time.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A trigger could not be turned into a dispatchable context.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
