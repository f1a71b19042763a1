use crate::model::TaskId;

/// Failure reported by the remote task-data provider. The message is
/// human-readable and is surfaced to the user on mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The request never completed (network, timeout, 5xx).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The store rejected the request (bad field, unknown id, 4xx).
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl ProviderError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Errors returned by the engine's public surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The referenced task is not in the local collection.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The engine was disposed; no further work is accepted.
    #[error("engine is disposed")]
    Disposed,
}
