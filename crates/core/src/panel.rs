//! Orchestration between the backend and the rendered panel state.
//!
//! Every operation is split into a synchronous `begin`/`apply` pair so an event
//! loop can run the request elsewhere and feed the outcome back, plus an async
//! helper that performs both halves against a [`PanelBackend`].

use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::backend::{BackendError, PanelBackend};
use crate::command::{mentions_database, CommandSubmitter, CommandTicket, RequestToken};
use crate::database_list::DatabaseSelector;
use crate::file_import::{FileImporter, ImportError};
use crate::protocol::{StatementResult, TablesPayload};
use crate::results_view::{render_results, ResultsPane};
use crate::schema_view::{render_tables, SchemaView};
use crate::session::{SessionError, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Warning,
    Failure,
}

/// Plain text shown in the response region instead of a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Blank input; no request was made.
    Rejected,
    Rendered { refresh_databases: bool },
    Failed,
    /// A newer submission was issued before this response arrived. The render is
    /// dropped, but the server already ran the statement.
    Discarded { refresh_databases: bool },
}

impl CommandOutcome {
    /// Whether the database list should be fetched again after this response.
    #[must_use]
    pub fn refresh_databases(self) -> bool {
        match self {
            Self::Rendered { refresh_databases } | Self::Discarded { refresh_databases } => {
                refresh_databases
            }
            Self::Rejected | Self::Failed => false,
        }
    }
}

#[derive(Debug)]
pub struct AdminPanel {
    session: SessionState,
    selector: DatabaseSelector,
    schema: SchemaView,
    schema_visible: bool,
    results: ResultsPane,
    notice: Option<Notice>,
    submitter: CommandSubmitter,
    importer: FileImporter,
    alert: Option<String>,
    sql_input: String,
    page_size: usize,
}

impl AdminPanel {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            session: SessionState::new(),
            selector: DatabaseSelector::new(),
            schema: SchemaView::Empty,
            schema_visible: true,
            results: ResultsPane::new(),
            notice: None,
            submitter: CommandSubmitter::new(),
            importer: FileImporter::new(),
            alert: None,
            sql_input: String::new(),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn selector(&self) -> &DatabaseSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut DatabaseSelector {
        &mut self.selector
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaView {
        &self.schema
    }

    #[must_use]
    pub fn schema_visible(&self) -> bool {
        self.schema_visible
    }

    #[must_use]
    pub fn results(&self) -> &ResultsPane {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultsPane {
        &mut self.results
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.submitter.loading().is_visible()
    }

    #[must_use]
    pub fn sql_input(&self) -> &str {
        &self.sql_input
    }

    pub fn sql_input_mut(&mut self) -> &mut String {
        &mut self.sql_input
    }

    pub fn set_sql_input(&mut self, sql: impl Into<String>) {
        self.sql_input = sql.into();
    }

    /// Rebuilds the selector on success. Failures are logged and leave every piece of state alone.
    pub fn apply_database_list(&mut self, result: Result<Vec<String>, BackendError>) -> bool {
        match result {
            Ok(databases) => {
                info!(count = databases.len(), "database list loaded");
                self.session.replace_known_databases(databases.clone());
                self.selector.rebuild(databases);
                true
            }
            Err(err) => {
                error!(error = %err, "error loading databases");
                false
            }
        }
    }

    pub async fn refresh_databases<B>(&mut self, backend: &B) -> bool
    where
        B: PanelBackend + ?Sized,
    {
        let result = backend.list_databases().await;
        self.apply_database_list(result)
    }

    pub fn select_database(&mut self, database: &str) -> Result<(), SessionError> {
        self.session.select(database)?;
        // Keep the picker in sync when the selection came from elsewhere.
        let _ = self.selector.highlight(database);
        debug!(database, "database selected");
        Ok(())
    }

    /// Selects whatever the picker currently highlights.
    ///
    /// Choosing the placeholder empties the table region and returns `Ok(None)`.
    pub fn select_highlighted_database(&mut self) -> Result<Option<String>, SessionError> {
        let Some(database) = self.selector.highlighted_value().map(str::to_string) else {
            self.clear_schema();
            return Ok(None);
        };
        self.select_database(&database)?;
        Ok(Some(database))
    }

    #[must_use]
    pub fn can_load_tables(&self) -> bool {
        self.session.current_database().is_some()
    }

    /// Database to fetch table metadata for, or `None` when nothing is selected.
    #[must_use]
    pub fn tables_request(&self) -> Option<String> {
        self.session.current_database().map(str::to_string)
    }

    pub fn apply_tables(&mut self, result: Result<TablesPayload, BackendError>) {
        self.schema = match result {
            Ok(payload) => render_tables(&payload),
            Err(err) => SchemaView::fetch_failed(&err),
        };
    }

    /// Returns `false` without touching anything when no database is selected.
    pub async fn load_tables<B>(&mut self, backend: &B) -> bool
    where
        B: PanelBackend + ?Sized,
    {
        let Some(database) = self.tables_request() else {
            return false;
        };
        let result = backend.fetch_tables(&database).await;
        self.apply_tables(result);
        true
    }

    pub fn toggle_schema_visibility(&mut self) -> bool {
        self.schema_visible = !self.schema_visible;
        self.schema_visible
    }

    pub fn clear_schema(&mut self) {
        self.schema = SchemaView::Empty;
    }

    /// Validates the editor content and starts a request. Blank input only raises a warning.
    pub fn begin_command(&mut self) -> Option<CommandTicket> {
        match self.submitter.begin(&self.sql_input) {
            Ok(ticket) => {
                self.notice = None;
                self.results.clear_messages();
                debug!(token = ticket.token.value(), "command submitted");
                Some(ticket)
            }
            Err(err) => {
                self.notice = Some(Notice {
                    kind: NoticeKind::Warning,
                    text: err.to_string(),
                });
                None
            }
        }
    }

    pub fn apply_command_result(
        &mut self,
        token: RequestToken,
        result: Result<Vec<StatementResult>, BackendError>,
    ) -> CommandOutcome {
        if !self.submitter.is_current(token) {
            let refresh_databases = result.as_deref().is_ok_and(mentions_database);
            debug!(
                token = token.value(),
                refresh_databases, "discarding stale command response"
            );
            return CommandOutcome::Discarded { refresh_databases };
        }

        match result {
            Ok(results) => {
                self.results
                    .replace(render_results(&results, self.page_size));
                CommandOutcome::Rendered {
                    refresh_databases: mentions_database(&results),
                }
            }
            Err(err) => {
                error!(error = %err, "command request failed");
                self.notice = Some(Notice {
                    kind: NoticeKind::Failure,
                    text: format!("Error occurred: {err}"),
                });
                CommandOutcome::Failed
            }
        }
    }

    /// Runs the editor content end to end, refreshing the database list when a result mentions one.
    pub async fn submit_command<B>(&mut self, backend: &B) -> CommandOutcome
    where
        B: PanelBackend + ?Sized,
    {
        let Some(ticket) = self.begin_command() else {
            return CommandOutcome::Rejected;
        };

        let CommandTicket {
            token,
            sql,
            loading,
        } = ticket;
        let result = backend.execute(&sql).await;
        let outcome = self.apply_command_result(token, result);
        drop(loading);

        if outcome.refresh_databases() {
            self.refresh_databases(backend).await;
        }
        outcome
    }

    pub fn choose_import_file(&mut self, path: impl Into<PathBuf>) {
        self.importer.select(path);
    }

    /// Loads the chosen file into the editor; rejections and read failures raise the alert.
    pub fn import_selected_file(&mut self) -> Result<bool, ImportError> {
        match self.importer.import_into(&mut self.sql_input) {
            Ok(imported) => Ok(imported),
            Err(err) => {
                self.alert = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use serde_json::json;
    use tempfile::TempDir;

    use super::{AdminPanel, CommandOutcome, NoticeKind};
    use crate::backend::{BackendError, PanelBackend};
    use crate::database_list::PLACEHOLDER_LABEL;
    use crate::protocol::{normalize_command_response, StatementResult, TablesPayload};
    use crate::results_view::DEFAULT_PAGE_SIZE;
    use crate::schema_view::SchemaView;

    #[derive(Debug, Default)]
    struct FakeBackend {
        databases: Mutex<VecDeque<Result<Vec<String>, BackendError>>>,
        tables: Mutex<VecDeque<Result<TablesPayload, BackendError>>>,
        commands: Mutex<VecDeque<Result<Vec<StatementResult>, BackendError>>>,
        list_calls: AtomicUsize,
        table_calls: AtomicUsize,
        executed: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with_databases(self, result: Result<Vec<String>, BackendError>) -> Self {
            self.databases
                .lock()
                .expect("lock poisoned")
                .push_back(result);
            self
        }

        fn with_tables(self, result: Result<TablesPayload, BackendError>) -> Self {
            self.tables.lock().expect("lock poisoned").push_back(result);
            self
        }

        fn with_command(self, result: Result<Vec<StatementResult>, BackendError>) -> Self {
            self.commands
                .lock()
                .expect("lock poisoned")
                .push_back(result);
            self
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait::async_trait]
    impl PanelBackend for FakeBackend {
        async fn list_databases(&self) -> Result<Vec<String>, BackendError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.databases
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_tables(&self, _database: &str) -> Result<TablesPayload, BackendError> {
            self.table_calls.fetch_add(1, Ordering::SeqCst);
            self.tables
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::transport("no canned tables")))
        }

        async fn execute(&self, sql: &str) -> Result<Vec<StatementResult>, BackendError> {
            self.executed
                .lock()
                .expect("lock poisoned")
                .push(sql.to_string());
            self.commands
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[tokio::test]
    async fn refresh_populates_sorted_selector_and_failure_keeps_state() {
        let backend = FakeBackend::default()
            .with_databases(Ok(names(&["zoo", "Alpha", "beta"])))
            .with_databases(Err(BackendError::transport("connection refused")));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);

        assert!(panel.refresh_databases(&backend).await);
        let labels = panel
            .selector()
            .options()
            .iter()
            .map(|option| option.label.clone())
            .collect::<Vec<_>>();
        assert_eq!(labels, names(&[PLACEHOLDER_LABEL, "Alpha", "beta", "zoo"]));

        let before = panel.selector().clone();
        assert!(!panel.refresh_databases(&backend).await);
        assert_eq!(panel.selector(), &before);
        assert_eq!(panel.session().known_databases().len(), 3);
    }

    #[tokio::test]
    async fn loading_tables_without_selection_is_a_no_op() {
        let backend = FakeBackend::default();
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);

        assert!(!panel.can_load_tables());
        assert!(!panel.load_tables(&backend).await);
        assert_eq!(backend.table_calls.load(Ordering::SeqCst), 0);
        assert_eq!(panel.schema(), &SchemaView::Empty);
    }

    #[tokio::test]
    async fn loads_tables_for_selected_database_and_reports_failures() {
        let tables: TablesPayload = serde_json::from_value(json!({
            "users": {"columns": [{"name": "id", "type": "INT"}], "constraints": {"primary_key": ["id"]}}
        }))
        .expect("payload should decode");
        let backend = FakeBackend::default()
            .with_databases(Ok(names(&["shop"])))
            .with_tables(Ok(tables))
            .with_tables(Err(BackendError::transport("connection reset")));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.refresh_databases(&backend).await;

        panel.selector_mut().move_next();
        assert_eq!(
            panel.select_highlighted_database().expect("known database"),
            Some("shop".to_string())
        );
        assert!(panel.can_load_tables());

        assert!(panel.load_tables(&backend).await);
        assert!(matches!(panel.schema(), SchemaView::Tables(blocks) if blocks.len() == 1));

        assert!(panel.load_tables(&backend).await);
        assert_eq!(
            panel.schema(),
            &SchemaView::FetchFailed("Error occurred: connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn blank_command_warns_without_network_call() {
        let backend = FakeBackend::default();
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("   \n ");

        let outcome = panel.submit_command(&backend).await;
        assert_eq!(outcome, CommandOutcome::Rejected);
        assert!(backend.executed().is_empty());
        let notice = panel.notice().expect("warning should be shown");
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.text, "Please enter an SQL command!");
        assert!(!panel.is_loading());
    }

    #[tokio::test]
    async fn database_message_triggers_list_refresh() {
        let results = normalize_command_response(json!([
            {"headers": ["id"], "rows": [[1]]},
            {"message": "Database created"}
        ]));
        let backend = FakeBackend::default()
            .with_command(Ok(results))
            .with_databases(Ok(names(&["shop"])));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("  SELECT id FROM t; CREATE DATABASE shop;  ");

        let outcome = panel.submit_command(&backend).await;
        assert_eq!(
            outcome,
            CommandOutcome::Rendered {
                refresh_databases: true
            }
        );
        assert_eq!(backend.executed(), names(&["SELECT id FROM t; CREATE DATABASE shop;"]));
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(panel.results().view().grids[0].title(), "Query #1");
        assert_eq!(panel.results().view().messages.len(), 1);
        assert_eq!(panel.selector().options().len(), 2);
        assert!(!panel.is_loading());
    }

    #[tokio::test]
    async fn plain_messages_do_not_refresh_databases() {
        let backend = FakeBackend::default().with_command(Ok(vec![StatementResult::Info {
            message: "Table 'users' created".to_string(),
        }]));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("CREATE TABLE users (id INT PRIMARY KEY)");

        panel.submit_command(&backend).await;
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn server_error_is_surfaced_and_loading_released() {
        let backend = FakeBackend::default().with_command(Err(BackendError::Status(500)));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("SELECT 1");

        let outcome = panel.submit_command(&backend).await;
        assert_eq!(outcome, CommandOutcome::Failed);
        let notice = panel.notice().expect("failure should be shown");
        assert_eq!(notice.kind, NoticeKind::Failure);
        assert_eq!(notice.text, "Error occurred: Server error: 500");
        assert!(!panel.is_loading());
    }

    #[test]
    fn stale_response_is_discarded_in_favour_of_latest_submission() {
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("SELECT 1");
        let first = panel.begin_command().expect("valid sql");
        panel.set_sql_input("SELECT 2");
        let second = panel.begin_command().expect("valid sql");
        assert!(panel.is_loading());

        let latest = normalize_command_response(json!({"message": "second"}));
        assert_eq!(
            panel.apply_command_result(second.token, Ok(latest)),
            CommandOutcome::Rendered {
                refresh_databases: false
            }
        );

        let stale = normalize_command_response(json!({"message": "first"}));
        assert_eq!(
            panel.apply_command_result(first.token, Ok(stale)),
            CommandOutcome::Discarded {
                refresh_databases: false
            }
        );
        assert_eq!(panel.results().view().messages[0].text, "second");

        drop(first);
        drop(second);
        assert!(!panel.is_loading());
    }

    #[test]
    fn stale_database_change_still_asks_for_list_refresh() {
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("CREATE DATABASE shop;");
        let create = panel.begin_command().expect("valid sql");
        panel.set_sql_input("SELECT 1");
        let select = panel.begin_command().expect("valid sql");

        let latest = normalize_command_response(json!({"headers": ["1"], "rows": [[1]]}));
        assert_eq!(
            panel.apply_command_result(select.token, Ok(latest)),
            CommandOutcome::Rendered {
                refresh_databases: false
            }
        );

        let stale = normalize_command_response(json!({"message": "Database 'shop' created"}));
        let outcome = panel.apply_command_result(create.token, Ok(stale));
        assert_eq!(
            outcome,
            CommandOutcome::Discarded {
                refresh_databases: true
            }
        );
        assert!(outcome.refresh_databases());
        assert!(panel.results().has_grids());
        assert!(panel.results().view().messages.is_empty());
    }

    #[test]
    fn stale_failure_neither_renders_nor_refreshes() {
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("DROP DATABASE shop;");
        let first = panel.begin_command().expect("valid sql");
        panel.set_sql_input("SELECT 1");
        let _second = panel.begin_command().expect("valid sql");

        let outcome = panel.apply_command_result(first.token, Err(BackendError::Status(500)));

        assert!(!outcome.refresh_databases());
        assert!(panel.notice().is_none());
    }

    #[tokio::test]
    async fn choosing_placeholder_clears_loaded_tables() {
        let tables: TablesPayload = serde_json::from_value(json!({
            "users": {"columns": [{"name": "id", "type": "INT"}]}
        }))
        .expect("payload should decode");
        let backend = FakeBackend::default()
            .with_databases(Ok(names(&["shop"])))
            .with_databases(Ok(names(&["shop", "zoo"])))
            .with_tables(Ok(tables));
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.refresh_databases(&backend).await;
        panel.select_database("shop").expect("known database");
        assert!(panel.load_tables(&backend).await);
        assert!(matches!(panel.schema(), SchemaView::Tables(_)));

        // A list refresh puts the picker back on the placeholder.
        panel.refresh_databases(&backend).await;
        assert_eq!(panel.select_highlighted_database(), Ok(None));

        assert_eq!(panel.schema(), &SchemaView::Empty);
        assert_eq!(panel.session().current_database(), Some("shop"));
    }

    #[test]
    fn submitting_clears_previous_messages_but_keeps_grids_until_render() {
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("SELECT 1");
        let ticket = panel.begin_command().expect("valid sql");
        let rendered = normalize_command_response(json!([
            {"headers": ["n"], "rows": [[1]]},
            {"message": "ok"}
        ]));
        panel.apply_command_result(ticket.token, Ok(rendered));

        let _next = panel.begin_command().expect("valid sql");
        assert!(panel.results().view().messages.is_empty());
        assert!(panel.results().has_grids());
    }

    #[test]
    fn importing_non_sql_file_raises_alert_and_keeps_input() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "SELECT 2").expect("failed to write");

        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.set_sql_input("SELECT 1");
        panel.choose_import_file(&path);

        assert!(panel.import_selected_file().is_err());
        assert_eq!(panel.alert(), Some("Please upload a valid .sql file!"));
        assert_eq!(panel.sql_input(), "SELECT 1");

        panel.dismiss_alert();
        assert!(panel.alert().is_none());
    }

    #[test]
    fn importing_sql_file_replaces_input() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("seed.sql");
        fs::write(&path, "  SELECT * FROM users;\n").expect("failed to write");

        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        panel.choose_import_file(&path);
        assert!(panel.import_selected_file().expect("import should succeed"));
        assert_eq!(panel.sql_input(), "SELECT * FROM users;");
        assert!(panel.alert().is_none());
    }

    #[test]
    fn schema_visibility_toggles() {
        let mut panel = AdminPanel::new(DEFAULT_PAGE_SIZE);
        assert!(panel.schema_visible());
        assert!(!panel.toggle_schema_visibility());
        assert!(panel.toggle_schema_visibility());
    }
}
