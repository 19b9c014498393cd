use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("database `{0}` is not in the current database list")]
    UnknownDatabase(String),
}

/// The single selected database, shared by the schema fetcher and the command submitter.
///
/// Starts empty and is only ever overwritten by an explicit selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    current_database: Option<String>,
    known_databases: Vec<String>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    #[must_use]
    pub fn known_databases(&self) -> &[String] {
        &self.known_databases
    }

    pub fn replace_known_databases(&mut self, databases: Vec<String>) {
        self.known_databases = databases;
    }

    pub fn select(&mut self, database: &str) -> Result<(), SessionError> {
        if !self.known_databases.iter().any(|known| known == database) {
            return Err(SessionError::UnknownDatabase(database.to_string()));
        }
        self.current_database = Some(database.to_string());
        Ok(())
    }
}
