use std::fmt;

use crate::columns::ColumnDescriptor;
use crate::gateway::{ResultColumn, Row, SqlResult};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Stable key of an open tab. Issued from a session-wide counter and never
/// handed out twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabName(String);

impl TabName {
    #[must_use]
    pub fn from_index(index: u64) -> Self {
        Self(format!("tab-{index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubView {
    #[default]
    Schema,
    Rows,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub table_name: String,
    pub schema_columns: Option<Vec<ColumnDescriptor>>,
    pub active_sub_view: SubView,
    pub rows: Vec<Row>,
    pub row_columns: Vec<ResultColumn>,
    pub page: u32,
    pub page_size: u32,
    pub total_rows: u64,
}

impl TableView {
    #[must_use]
    pub fn new(table_name: impl Into<String>, page_size: u32) -> Self {
        Self {
            table_name: table_name.into(),
            schema_columns: None,
            active_sub_view: SubView::Schema,
            rows: Vec::new(),
            row_columns: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            total_rows: 0,
        }
    }

    #[must_use]
    pub fn has_schema(&self) -> bool {
        self.schema_columns
            .as_ref()
            .is_some_and(|columns| !columns.is_empty())
    }

    #[must_use]
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    #[must_use]
    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total_rows
    }

    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.total_rows.div_ceil(u64::from(self.page_size.max(1))).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryView {
    pub sql_text: String,
    pub executing: bool,
    pub result: Option<SqlResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabKind {
    Table(TableView),
    Query(QueryView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub name: TabName,
    pub title: String,
    pub loading: bool,
    pub kind: TabKind,
}

impl Tab {
    #[must_use]
    pub fn table(name: TabName, table_name: &str, page_size: u32) -> Self {
        Self {
            name,
            title: table_name.to_string(),
            loading: false,
            kind: TabKind::Table(TableView::new(table_name, page_size)),
        }
    }

    #[must_use]
    pub fn query(name: TabName, sequence: u64) -> Self {
        Self {
            name,
            title: format!("SQL Query-{sequence}"),
            loading: false,
            kind: TabKind::Query(QueryView::default()),
        }
    }

    #[must_use]
    pub fn is_table(&self) -> bool {
        matches!(self.kind, TabKind::Table(_))
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&TableView> {
        match &self.kind {
            TabKind::Table(view) => Some(view),
            TabKind::Query(_) => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableView> {
        match &mut self.kind {
            TabKind::Table(view) => Some(view),
            TabKind::Query(_) => None,
        }
    }

    #[must_use]
    pub fn as_query(&self) -> Option<&QueryView> {
        match &self.kind {
            TabKind::Query(view) => Some(view),
            TabKind::Table(_) => None,
        }
    }

    pub fn as_query_mut(&mut self) -> Option<&mut QueryView> {
        match &mut self.kind {
            TabKind::Query(view) => Some(view),
            TabKind::Table(_) => None,
        }
    }

    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.as_table().map(|view| view.table_name.as_str())
    }
}
