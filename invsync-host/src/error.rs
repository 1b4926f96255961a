//! Host integration error types.

use thiserror::Error;
use uuid::Uuid;

use invsync_core::SyncError;

/// Errors raised while dispatching session events.
#[derive(Debug, Error)]
pub enum HostError {
    /// The sync layer failed.
    #[error("inventory sync failed: {0}")]
    Sync(#[from] SyncError),

    /// A blocking sync task panicked or was cancelled.
    #[error("sync task failed: {0}")]
    TaskFailed(String),

    /// A quit arrived for a player with no registered inventory.
    #[error("player {0} is not online")]
    NotOnline(Uuid),

    /// Logging could not be initialised.
    #[error("tracing setup failed: {0}")]
    Tracing(String),
}

impl From<tokio::task::JoinError> for HostError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            HostError::TaskFailed("cancelled".into())
        } else {
            HostError::TaskFailed(err.to_string())
        }
    }
}
