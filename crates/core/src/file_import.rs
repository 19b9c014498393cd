use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const SQL_EXTENSION: &str = ".sql";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Please upload a valid .sql file!")]
    NotSqlFile { path: PathBuf },
    #[error("failed to read SQL file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Case-sensitive check on the file name itself.
#[must_use]
pub fn has_sql_extension(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(SQL_EXTENSION))
}

/// Reads the file as text and trims surrounding whitespace. Invalid UTF-8 is replaced.
pub fn read_sql_file(path: &Path) -> Result<String, ImportError> {
    if !has_sql_extension(path) {
        return Err(ImportError::NotSqlFile {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// File picker state: at most one chosen file waiting to be imported.
#[derive(Debug, Clone, Default)]
pub struct FileImporter {
    selection: Option<PathBuf>,
}

impl FileImporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, path: impl Into<PathBuf>) {
        self.selection = Some(path.into());
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    /// Overwrites `input` with the chosen file's content and clears the selection so the
    /// same file can be imported again. Returns `Ok(false)` when nothing is selected.
    pub fn import_into(&mut self, input: &mut String) -> Result<bool, ImportError> {
        let Some(path) = self.selection.as_deref() else {
            return Ok(false);
        };

        let content = read_sql_file(path)?;
        *input = content;
        self.selection = None;
        Ok(true)
    }
}
