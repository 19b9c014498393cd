use crate::backend::BackendError;
use crate::protocol::{TableMetadata, TablesPayload};

pub const PRIMARY_KEY_MARKER: &str = "🔑";
pub const FOREIGN_KEY_MARKER: &str = "🔗";
pub const PRIMARY_KEY_LABEL: &str = "Primary Key:";
pub const FOREIGN_KEYS_LABEL: &str = "Foreign Keys:";
pub const UNIQUE_LABEL: &str = "Unique:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLine {
    pub name: String,
    pub data_type: String,
    pub primary_key: bool,
    pub foreign_key: bool,
}

impl ColumnLine {
    /// Column name followed by its key markers.
    #[must_use]
    pub fn decorated_name(&self) -> String {
        let mut name = self.name.clone();
        if self.primary_key {
            name.push(' ');
            name.push_str(PRIMARY_KEY_MARKER);
        }
        if self.foreign_key {
            name.push(' ');
            name.push_str(FOREIGN_KEY_MARKER);
        }
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    pub name: String,
    pub columns: Vec<ColumnLine>,
    pub primary_key_summary: Option<String>,
    pub foreign_key_summary: Option<String>,
    pub unique_summary: Option<String>,
}

impl TableBlock {
    #[must_use]
    pub fn summary_lines(&self) -> Vec<(&'static str, &str)> {
        [
            (PRIMARY_KEY_LABEL, self.primary_key_summary.as_deref()),
            (FOREIGN_KEYS_LABEL, self.foreign_key_summary.as_deref()),
            (UNIQUE_LABEL, self.unique_summary.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, summary)| summary.map(|summary| (label, summary)))
        .collect()
    }
}

/// What the table display region currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaView {
    #[default]
    Empty,
    Tables(Vec<TableBlock>),
    /// The backend answered with an `{error}` payload.
    Error(String),
    /// The request itself failed.
    FetchFailed(String),
}

impl SchemaView {
    #[must_use]
    pub fn fetch_failed(error: &BackendError) -> Self {
        Self::FetchFailed(format!("Error occurred: {error}"))
    }

    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        match self {
            Self::Error(text) | Self::FetchFailed(text) => Some(text),
            Self::Empty | Self::Tables(_) => None,
        }
    }
}

#[must_use]
pub fn render_tables(payload: &TablesPayload) -> SchemaView {
    match payload {
        TablesPayload::Error { error } => SchemaView::Error(format!("Error: {error}")),
        TablesPayload::Tables(tables) => SchemaView::Tables(
            tables
                .iter()
                .map(|(name, table)| render_table(name, table))
                .collect(),
        ),
    }
}

fn render_table(name: &str, table: &TableMetadata) -> TableBlock {
    let primary_key = table.primary_key();
    let foreign_keys = table.foreign_keys();
    let unique_key = table.unique_key();

    let columns = table
        .columns
        .iter()
        .map(|column| ColumnLine {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            primary_key: primary_key.contains(&column.name),
            foreign_key: foreign_keys.iter().any(|fk| fk.column == column.name),
        })
        .collect();

    let foreign_key_summary = (!foreign_keys.is_empty()).then(|| {
        foreign_keys
            .iter()
            .map(|fk| {
                format!(
                    "{} → {}({})",
                    fk.column, fk.references.table, fk.references.column
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    });

    TableBlock {
        name: name.to_string(),
        columns,
        primary_key_summary: (!primary_key.is_empty()).then(|| primary_key.join(", ")),
        foreign_key_summary,
        unique_summary: (!unique_key.is_empty()).then(|| unique_key.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::BackendError;
    use crate::protocol::TablesPayload;

    use super::{render_tables, SchemaView, FOREIGN_KEY_MARKER, PRIMARY_KEY_MARKER};

    fn payload(raw: &str) -> TablesPayload {
        serde_json::from_str(raw).expect("payload should decode")
    }

    #[test]
    fn marks_primary_and_foreign_key_columns_from_own_constraints() {
        let view = render_tables(&payload(
            r#"{
                "users": {
                    "columns": [{"name": "id", "type": "INT"}, {"name": "email", "type": "VARCHAR(64)"}],
                    "constraints": {"primary_key": ["id"], "unique_key": ["email"], "foreign_keys": []}
                },
                "orders": {
                    "columns": [
                        {"name": "id", "type": "INT"},
                        {"name": "user_id", "type": "INT"},
                        {"name": "total", "type": "FLOAT"}
                    ],
                    "constraints": {
                        "primary_key": ["id"],
                        "foreign_keys": [{"column": "user_id", "references": {"table": "users", "column": "id"}}]
                    }
                }
            }"#,
        ));

        let SchemaView::Tables(blocks) = view else {
            panic!("expected table blocks");
        };
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "users");
        assert_eq!(blocks[1].name, "orders");

        let orders = &blocks[1];
        let flags = orders
            .columns
            .iter()
            .map(|column| (column.name.as_str(), column.primary_key, column.foreign_key))
            .collect::<Vec<_>>();
        assert_eq!(
            flags,
            vec![
                ("id", true, false),
                ("user_id", false, true),
                ("total", false, false)
            ]
        );
        assert_eq!(orders.primary_key_summary.as_deref(), Some("id"));
        assert_eq!(
            orders.foreign_key_summary.as_deref(),
            Some("user_id → users(id)")
        );
        assert!(orders.unique_summary.is_none());
        assert_eq!(blocks[0].unique_summary.as_deref(), Some("email"));
        assert!(blocks[0].foreign_key_summary.is_none());
    }

    #[test]
    fn summaries_are_omitted_without_constraints() {
        let view = render_tables(&payload(
            r#"{"logs": {"columns": [{"name": "line", "type": "TEXT"}]}}"#,
        ));
        let SchemaView::Tables(blocks) = view else {
            panic!("expected table blocks");
        };
        assert!(blocks[0].summary_lines().is_empty());
        assert!(!blocks[0].columns[0].primary_key);
    }

    #[test]
    fn decorated_name_appends_markers() {
        let view = render_tables(&payload(
            r#"{"t": {
                "columns": [{"name": "ref", "type": "INT"}],
                "constraints": {
                    "primary_key": ["ref"],
                    "foreign_keys": [{"column": "ref", "references": {"table": "u", "column": "id"}}]
                }
            }}"#,
        ));
        let SchemaView::Tables(blocks) = view else {
            panic!("expected table blocks");
        };
        assert_eq!(
            blocks[0].columns[0].decorated_name(),
            format!("ref {PRIMARY_KEY_MARKER} {FOREIGN_KEY_MARKER}")
        );
    }

    #[test]
    fn error_payload_suppresses_tables() {
        let view = render_tables(&payload(r#"{"error": "Database 'x' not found"}"#));
        assert_eq!(view, SchemaView::Error("Error: Database 'x' not found".to_string()));
    }

    #[test]
    fn fetch_failure_is_reported_as_plain_text() {
        let view = SchemaView::fetch_failed(&BackendError::transport("connection refused"));
        assert_eq!(view.error_text(), Some("Error occurred: connection refused"));
    }
}
