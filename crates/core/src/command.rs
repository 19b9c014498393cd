use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use thiserror::Error;

use crate::protocol::StatementResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Please enter an SQL command!")]
    EmptySql,
}

/// Returns the trimmed command, rejecting blank input before any request is made.
pub fn validate_sql(input: &str) -> Result<&str, CommandError> {
    let sql = input.trim();
    if sql.is_empty() {
        return Err(CommandError::EmptySql);
    }
    Ok(sql)
}

/// True when any result message names a database, i.e. the database list may have changed.
#[must_use]
pub fn mentions_database(results: &[StatementResult]) -> bool {
    results.iter().any(StatementResult::mentions_database)
}

/// Visible while at least one [`LoadingGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    in_flight: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn acquire(&self) -> LoadingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Everything a command request carries while it is in flight.
#[derive(Debug)]
pub struct CommandTicket {
    pub token: RequestToken,
    pub sql: String,
    pub loading: LoadingGuard,
}

/// Validates input, hands out request tokens and tracks which response is still wanted.
#[derive(Debug, Default)]
pub struct CommandSubmitter {
    latest: u64,
    loading: LoadingIndicator,
}

impl CommandSubmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, input: &str) -> Result<CommandTicket, CommandError> {
        let sql = validate_sql(input)?.to_string();
        self.latest += 1;
        Ok(CommandTicket {
            token: RequestToken(self.latest),
            sql,
            loading: self.loading.acquire(),
        })
    }

    /// Only the most recently issued token may render.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    #[must_use]
    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }
}
