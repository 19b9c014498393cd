use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{StatementResult, TablesPayload};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{0}")]
    Transport(String),
    #[error("Server error: {0}")]
    Status(u16),
    #[error("{0}")]
    Decode(String),
}

impl BackendError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Remote service that owns every piece of real database logic.
#[async_trait]
pub trait PanelBackend: Send + Sync {
    async fn list_databases(&self) -> Result<Vec<String>, BackendError>;

    async fn fetch_tables(&self, database: &str) -> Result<TablesPayload, BackendError>;

    /// Runs free-text SQL; one result per statement, in submission order.
    async fn execute(&self, sql: &str) -> Result<Vec<StatementResult>, BackendError>;
}
