use std::cmp::Ordering;

use unicase::UniCase;

pub const PLACEHOLDER_LABEL: &str = "-- Select database --";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
}

impl SelectOption {
    fn placeholder() -> Self {
        Self {
            value: String::new(),
            label: PLACEHOLDER_LABEL.to_string(),
            disabled: true,
        }
    }

    fn database(name: String) -> Self {
        Self {
            label: name.clone(),
            value: name,
            disabled: false,
        }
    }
}

/// Orders names the way a user-facing collation would: letters compare
/// case-insensitively first, lowercase wins ties, raw code points break the rest.
#[must_use]
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    UniCase::new(left)
        .cmp(&UniCase::new(right))
        .then_with(|| lowercase_first(left, right))
        .then_with(|| left.cmp(right))
}

fn lowercase_first(left: &str, right: &str) -> Ordering {
    for (l, r) in left.chars().zip(right.chars()) {
        if l == r {
            continue;
        }
        if l.is_lowercase() && r.is_uppercase() {
            return Ordering::Less;
        }
        if l.is_uppercase() && r.is_lowercase() {
            return Ordering::Greater;
        }
    }
    Ordering::Equal
}

/// Placeholder first, then the identifiers in collation order.
#[must_use]
pub fn database_options(mut databases: Vec<String>) -> Vec<SelectOption> {
    databases.sort_by(|left, right| locale_compare(left, right));

    let mut options = Vec::with_capacity(databases.len() + 1);
    options.push(SelectOption::placeholder());
    options.extend(databases.into_iter().map(SelectOption::database));
    options
}

/// Option list of the database picker plus its highlight cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSelector {
    options: Vec<SelectOption>,
    highlighted: usize,
}

impl Default for DatabaseSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseSelector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: vec![SelectOption::placeholder()],
            highlighted: 0,
        }
    }

    /// Drops every option and rebuilds the list; the placeholder ends up highlighted.
    pub fn rebuild(&mut self, databases: Vec<String>) {
        self.options = database_options(databases);
        self.highlighted = 0;
    }

    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    #[must_use]
    pub fn highlighted_index(&self) -> usize {
        self.highlighted
    }

    /// `None` while the placeholder is highlighted.
    #[must_use]
    pub fn highlighted_value(&self) -> Option<&str> {
        self.options
            .get(self.highlighted)
            .filter(|option| !option.disabled)
            .map(|option| option.value.as_str())
    }

    pub fn move_next(&mut self) {
        if let Some(index) = (self.highlighted + 1..self.options.len())
            .find(|index| !self.options[*index].disabled)
        {
            self.highlighted = index;
        }
    }

    pub fn move_previous(&mut self) {
        if let Some(index) = (0..self.highlighted)
            .rev()
            .find(|index| !self.options[*index].disabled)
        {
            self.highlighted = index;
        }
    }

    #[must_use]
    pub fn highlight(&mut self, value: &str) -> bool {
        let Some(index) = self
            .options
            .iter()
            .position(|option| !option.disabled && option.value == value)
        else {
            return false;
        };
        self.highlighted = index;
        true
    }
}
