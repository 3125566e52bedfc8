use std::collections::BTreeSet;
use std::str::FromStr;

use crate::theme::Theme;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown theme '{0}', expected one of: default, dark, neutral, forest")]
    UnknownTheme(String),
    #[error("Table filter is empty")]
    EmptyTableFilter,
    #[error("Table filter '{0}' contains an empty table name")]
    EmptyTableName(String),
}

/// Options for a single conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterConfig {
    pub theme: Theme,
    pub only_tables: Option<TableFilter>,
    pub html_output: bool,
}

impl ConverterConfig {
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_only_tables(mut self, filter: TableFilter) -> Self {
        self.only_tables = Some(filter);
        self
    }

    pub fn with_html_output(mut self, html_output: bool) -> Self {
        self.html_output = html_output;
        self
    }

    /// Whether `table` survives the allowlist.
    pub fn includes(&self, table: &str) -> bool {
        self.only_tables.as_ref().is_none_or(|f| f.contains(table))
    }
}

/// Table allowlist, e.g. from `--only users,posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    tables: BTreeSet<String>,
}

impl TableFilter {
    pub fn new<I, S>(tables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for table in tables {
            let table: String = table.into();
            let trimmed = table.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyTableName(table));
            }
            set.insert(trimmed.to_string());
        }
        if set.is_empty() {
            return Err(ConfigError::EmptyTableFilter);
        }
        Ok(Self { tables: set })
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }
}

impl FromStr for TableFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ConfigError::EmptyTableFilter);
        }
        Self::new(s.split(',')).map_err(|e| match e {
            ConfigError::EmptyTableName(_) => ConfigError::EmptyTableName(s.to_string()),
            other => other,
        })
    }
}
