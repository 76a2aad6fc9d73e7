use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model provider error: {0}")]
    Provider(String),

    /// Failure inside a tool. Displays as the bare message so the dispatcher
    /// can serialize it into an `{"error": ...}` observation payload.
    #[error("{0}")]
    ToolFailure(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("run exceeded the iteration budget of {max_iterations} without a final answer")]
    BudgetExhausted { max_iterations: usize },

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
