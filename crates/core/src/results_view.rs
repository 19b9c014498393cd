use std::cmp::Ordering;

use serde_json::Value;

use crate::protocol::{value_text, StatementResult, TabularResult};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const ERROR_PREFIX: &str = "❌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageItem {
    pub kind: MessageKind,
    pub text: String,
}

impl MessageItem {
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.kind {
            MessageKind::Info => self.text.clone(),
            MessageKind::Error => format!("{ERROR_PREFIX} {}", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Paginated, sortable, searchable view over one tabular result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGrid {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
    page_size: usize,
    page: usize,
    sort: Option<(usize, SortDirection)>,
    search: String,
    visible: Vec<usize>,
}

impl ResultGrid {
    #[must_use]
    pub fn new(title: impl Into<String>, table: &TabularResult, page_size: usize) -> Self {
        let mut grid = Self {
            title: title.into(),
            headers: table.headers.clone(),
            rows: table.rows.clone(),
            page_size: page_size.max(1),
            page: 0,
            sort: None,
            search: String::new(),
            visible: Vec::new(),
        };
        grid.recompute();
        grid
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn matching_rows(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero-based.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    pub fn next_page(&mut self) {
        self.page = (self.page + 1).min(self.page_count() - 1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    #[must_use]
    pub fn sort(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    /// First click sorts ascending, the next one on the same column flips direction.
    pub fn sort_by(&mut self, column: usize) {
        if column >= self.headers.len() {
            return;
        }
        self.sort = match self.sort {
            Some((current, SortDirection::Ascending)) if current == column => {
                Some((column, SortDirection::Descending))
            }
            _ => Some((column, SortDirection::Ascending)),
        };
        self.recompute();
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.page = 0;
        self.recompute();
    }

    #[must_use]
    pub fn page_rows(&self) -> Vec<Vec<String>> {
        self.visible
            .iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .map(|index| self.rows[*index].iter().map(cell_text).collect())
            .collect()
    }

    fn recompute(&mut self) {
        let needle = self.search.trim().to_lowercase();
        let mut visible = (0..self.rows.len())
            .filter(|index| {
                needle.is_empty()
                    || self.rows[*index]
                        .iter()
                        .any(|cell| cell_text(cell).to_lowercase().contains(&needle))
            })
            .collect::<Vec<_>>();

        if let Some((column, direction)) = self.sort {
            visible.sort_by(|left, right| {
                let ordering = compare_cells(
                    self.rows[*left].get(column),
                    self.rows[*right].get(column),
                );
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        self.visible = visible;
        self.page = self.page.min(self.page_count() - 1);
    }
}

#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => value_text(other),
    }
}

fn compare_cells(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(l)), Some(Value::Number(r))) => l
            .as_f64()
            .partial_cmp(&r.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(l)), Some(Value::Bool(r))) => l.cmp(r),
        (Some(l), Some(r)) => cell_text(l).cmp(&cell_text(r)),
    }
}

/// Everything one command rendered: grids in submission order plus a message list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultsView {
    pub grids: Vec<ResultGrid>,
    pub messages: Vec<MessageItem>,
}

#[must_use]
pub fn render_results(results: &[StatementResult], page_size: usize) -> ResultsView {
    let mut view = ResultsView::default();
    let mut query_counter = 0_usize;

    for result in results {
        match result {
            StatementResult::Tabular(table) => {
                query_counter += 1;
                view.grids.push(ResultGrid::new(
                    format!("Query #{query_counter}"),
                    table,
                    page_size,
                ));
            }
            StatementResult::Error { error, .. } => view.messages.push(MessageItem {
                kind: MessageKind::Error,
                text: error.clone(),
            }),
            StatementResult::Info { message } => view.messages.push(MessageItem {
                kind: MessageKind::Info,
                text: message.clone(),
            }),
            StatementResult::Unrecognized(raw) => view.messages.push(MessageItem {
                kind: MessageKind::Info,
                text: raw.to_string(),
            }),
        }
    }

    view
}

/// Owns the rendered results; installing a new view always tears down the old one first.
#[derive(Debug, Clone, Default)]
pub struct ResultsPane {
    view: ResultsView,
    focused_grid: usize,
}

impl ResultsPane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view.grids.clear();
        self.view.messages.clear();
        self.focused_grid = 0;
    }

    pub fn clear_messages(&mut self) {
        self.view.messages.clear();
    }

    pub fn replace(&mut self, view: ResultsView) {
        self.clear();
        self.view = view;
    }

    #[must_use]
    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    #[must_use]
    pub fn has_grids(&self) -> bool {
        !self.view.grids.is_empty()
    }

    #[must_use]
    pub fn focused_grid_index(&self) -> usize {
        self.focused_grid
    }

    #[must_use]
    pub fn focused_grid_mut(&mut self) -> Option<&mut ResultGrid> {
        self.view.grids.get_mut(self.focused_grid)
    }

    pub fn focus_next_grid(&mut self) {
        if !self.view.grids.is_empty() {
            self.focused_grid = (self.focused_grid + 1) % self.view.grids.len();
        }
    }

    pub fn focus_previous_grid(&mut self) {
        if !self.view.grids.is_empty() {
            self.focused_grid = self
                .focused_grid
                .checked_sub(1)
                .unwrap_or(self.view.grids.len() - 1);
        }
    }
}
