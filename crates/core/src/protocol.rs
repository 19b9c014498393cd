//! Wire shapes exchanged with the panel backend.
//!
//! Command responses are classified per entry rather than deserialized into a
//! fixed shape: the backend mixes tabular, informational and error entries in a
//! single array, and may answer with a bare object instead of an array.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// One entry of an executed command, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    Tabular(TabularResult),
    Info {
        message: String,
    },
    Error {
        error: String,
        message: Option<String>,
    },
    Unrecognized(Value),
}

impl StatementResult {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if let Some(table) = tabular_from_value(&value) {
            return Self::Tabular(table);
        }

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string);

        if let Some(error) = value.get("error").filter(|error| is_truthy(error)) {
            return Self::Error {
                error: value_text(error),
                message,
            };
        }

        match message {
            Some(message) => Self::Info { message },
            None => Self::Unrecognized(value),
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Info { message } => Some(message),
            Self::Error { message, .. } => message.as_deref(),
            Self::Tabular(_) | Self::Unrecognized(_) => None,
        }
    }

    #[must_use]
    pub fn mentions_database(&self) -> bool {
        self.message()
            .is_some_and(|message| message.to_lowercase().contains("database"))
    }
}

/// Wraps a bare object into a one-element sequence and classifies every entry.
#[must_use]
pub fn normalize_command_response(body: Value) -> Vec<StatementResult> {
    match body {
        Value::Array(entries) => entries
            .into_iter()
            .map(StatementResult::from_value)
            .collect(),
        other => vec![StatementResult::from_value(other)],
    }
}

fn tabular_from_value(value: &Value) -> Option<TabularResult> {
    let headers = value.get("headers")?.as_array()?;
    let rows = value.get("rows")?.as_array()?;

    Some(TabularResult {
        headers: headers.iter().map(value_text).collect(),
        rows: rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.clone(),
                other => vec![other.clone()],
            })
            .collect(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings render without quotes, everything else as compact JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    pub column: String,
    pub references: ForeignKeyTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableConstraints {
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    #[serde(default)]
    pub unique_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub constraints: Option<TableConstraints>,
}

impl TableMetadata {
    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        self.constraints
            .as_ref()
            .map_or(&[], |constraints| constraints.primary_key.as_slice())
    }

    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKeyMetadata] {
        self.constraints
            .as_ref()
            .map_or(&[], |constraints| constraints.foreign_keys.as_slice())
    }

    #[must_use]
    pub fn unique_key(&self) -> &[String] {
        self.constraints
            .as_ref()
            .map_or(&[], |constraints| constraints.unique_key.as_slice())
    }
}

/// Payload of `GET /tables`: tables keyed by name in server order, or an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TablesPayload {
    Error { error: String },
    Tables(IndexMap<String, TableMetadata>),
}
