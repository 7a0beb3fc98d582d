use thiserror::Error;

/// Errors raised while building or executing a graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("No outgoing edge matched from task: {0}")]
    NoRoute(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
