use thiserror::Error;

use crate::columns::normalize_all;
use crate::config::WorkspaceConfig;
use crate::connection::{ConnectionDescriptor, TableInfo};
use crate::gateway::GatewayError;
use crate::notice::{Notice, NoticeQueue};
use crate::orchestrator::LoadRequest;
use crate::registry::TabRegistry;
use crate::view::{Tab, TabName};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not connected to a database")]
    NotConnected,
    #[error("tab `{0}` is not open")]
    TabNotFound(TabName),
    #[error("tab `{0}` is not a query tab")]
    NotAQueryTab(TabName),
    #[error("enter a SQL statement before executing")]
    EmptySql,
    #[error("tab `{0}` is already executing a statement")]
    AlreadyExecuting(TabName),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSnapshot {
    pub connection: Option<ConnectionDescriptor>,
    pub tables: Vec<TableInfo>,
    pub tabs: Vec<Tab>,
    pub active: Option<TabName>,
}

impl WorkspaceSnapshot {
    #[must_use]
    pub fn tab(&self, name: &TabName) -> Option<&Tab> {
        self.tabs.iter().find(|tab| &tab.name == name)
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.as_ref().and_then(|name| self.tab(name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub(crate) registry: TabRegistry,
    pub(crate) connection: Option<ConnectionDescriptor>,
    pub(crate) tables: Vec<TableInfo>,
    pub(crate) notices: NoticeQueue,
}

impl Workspace {
    #[must_use]
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            registry: TabRegistry::new(config.max_tabs, config.default_page_size),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn connection(&self) -> Option<&ConnectionDescriptor> {
        self.connection.as_ref()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    #[must_use]
    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    #[must_use]
    pub fn tab(&self, name: &TabName) -> Option<&Tab> {
        self.registry.get(name)
    }

    #[must_use]
    pub fn active(&self) -> Option<&TabName> {
        self.registry.active()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    #[must_use]
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            connection: self.connection.clone(),
            tables: self.tables.clone(),
            tabs: self.registry.tabs().to_vec(),
            active: self.registry.active().cloned(),
        }
    }

    pub fn attach(&mut self, connection: ConnectionDescriptor, tables: Vec<TableInfo>) {
        self.registry.close_all();
        self.connection = Some(connection);
        self.tables = tables;
    }

    pub fn detach(&mut self) {
        self.registry.close_all();
        self.connection = None;
        self.tables.clear();
    }

    pub fn open_table(&mut self, table_name: &str) -> Result<Vec<LoadRequest>, WorkspaceError> {
        if !self.is_connected() {
            return Err(WorkspaceError::NotConnected);
        }

        let opened = self.registry.open_table(table_name);
        if let Some(evicted) = &opened.evicted {
            self.notices.push(Notice::info(format!(
                "Tab limit reached, closed the oldest tab `{}`",
                evicted.title
            )));
        }
        if !opened.created {
            return Ok(Vec::new());
        }

        let listed = self
            .tables
            .iter()
            .find(|table| table.table_name == table_name)
            .and_then(|table| table.columns.as_deref());
        if let (Some(columns), Some(view)) = (
            listed,
            self.registry
                .get_mut(&opened.name)
                .and_then(|tab| tab.as_table_mut()),
        ) {
            view.schema_columns = Some(normalize_all(columns));
        }

        Ok(self.load_schema(table_name, None).into_iter().collect())
    }

    pub fn open_query_tab(&mut self) -> Result<TabName, WorkspaceError> {
        if !self.is_connected() {
            return Err(WorkspaceError::NotConnected);
        }

        let opened = self.registry.open_query_tab();
        if let Some(evicted) = &opened.evicted {
            self.notices.push(Notice::info(format!(
                "Tab limit reached, closed the oldest tab `{}`",
                evicted.title
            )));
        }
        Ok(opened.name)
    }

    pub fn close_tab(&mut self, name: &TabName) -> bool {
        self.registry.close(name).is_some()
    }

    pub fn close_all(&mut self) -> usize {
        self.registry.close_all()
    }

    pub fn set_active(&mut self, name: &TabName) -> bool {
        self.registry.set_active(name)
    }

    pub fn set_sql_text(
        &mut self,
        name: &TabName,
        sql_text: impl Into<String>,
    ) -> Result<(), WorkspaceError> {
        let tab = self
            .registry
            .get_mut(name)
            .ok_or_else(|| WorkspaceError::TabNotFound(name.clone()))?;
        let view = tab
            .as_query_mut()
            .ok_or_else(|| WorkspaceError::NotAQueryTab(name.clone()))?;
        view.sql_text = sql_text.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Workspace, WorkspaceError};
    use crate::config::WorkspaceConfig;
    use crate::connection::{ConnectionDescriptor, DbKind, TableInfo};
    use crate::eviction::MAX_TABS;
    use crate::notice::NoticeLevel;
    use crate::orchestrator::LoadRequest;
    use crate::view::{SubView, TabName};

    fn connected() -> Workspace {
        let mut workspace = Workspace::new(&WorkspaceConfig::default());
        workspace.attach(
            ConnectionDescriptor::new(DbKind::MySql, "127.0.0.1", "root", "shop"),
            vec![TableInfo::new("orders"), TableInfo::new("customers")],
        );
        workspace
    }

    #[test]
    fn tabs_require_a_connection() {
        let mut workspace = Workspace::default();
        assert!(matches!(
            workspace.open_table("orders"),
            Err(WorkspaceError::NotConnected)
        ));
        assert!(matches!(
            workspace.open_query_tab(),
            Err(WorkspaceError::NotConnected)
        ));
    }

    #[test]
    fn opening_a_table_issues_one_schema_load() {
        let mut workspace = connected();
        let requests = workspace.open_table("orders").expect("open should succeed");

        assert_eq!(requests.len(), 1);
        let LoadRequest::Schema(request) = &requests[0] else {
            panic!("expected a schema request, got {requests:?}");
        };
        assert_eq!(request.table_name, "orders");
        assert!(request.chain_rows);

        let tab = workspace.tab(&request.tab).expect("tab should exist");
        assert!(tab.loading);
        assert_eq!(
            tab.as_table().map(|view| view.active_sub_view),
            Some(SubView::Schema)
        );
        assert_eq!(workspace.active(), Some(&request.tab));
    }

    #[test]
    fn listed_columns_seed_the_schema_view() {
        let mut workspace = Workspace::new(&WorkspaceConfig::default());
        let mut orders = TableInfo::new("orders");
        orders.columns = Some(vec![json!({ "columnName": "id", "dataType": "bigint", "key": "PRI" })
            .as_object()
            .cloned()
            .expect("object")]);
        workspace.attach(
            ConnectionDescriptor::new(DbKind::MySql, "127.0.0.1", "root", "shop"),
            vec![orders, TableInfo::new("customers")],
        );

        let requests = workspace.open_table("orders").expect("open should succeed");
        assert_eq!(requests.len(), 1);
        let view = workspace
            .registry()
            .active_tab()
            .and_then(|tab| tab.as_table())
            .expect("table tab");
        let columns = view.schema_columns.as_ref().expect("columns should be seeded");
        assert_eq!(columns[0].column_name, "id");
        assert_eq!(columns[0].data_type, "bigint");
        assert!(columns[0].is_primary_key());

        workspace.open_table("customers").expect("open should succeed");
        let view = workspace
            .registry()
            .active_tab()
            .and_then(|tab| tab.as_table())
            .expect("table tab");
        assert!(view.schema_columns.is_none());
    }

    #[test]
    fn reopening_a_table_issues_no_load() {
        let mut workspace = connected();
        workspace.open_table("orders").expect("open should succeed");
        let query = workspace.open_query_tab().expect("query tab should open");
        assert_eq!(workspace.active(), Some(&query));

        let requests = workspace.open_table("orders").expect("reopen should succeed");
        assert!(requests.is_empty());
        assert_eq!(workspace.registry().len(), 2);
        assert_eq!(
            workspace
                .registry()
                .active_tab()
                .and_then(|tab| tab.table_name()),
            Some("orders")
        );
    }

    #[test]
    fn eviction_emits_one_info_notice() {
        let mut workspace = connected();
        for index in 0..MAX_TABS {
            workspace
                .open_table(&format!("t{index}"))
                .expect("open should succeed");
        }
        assert!(workspace.drain_notices().is_empty());

        workspace.open_table("t10").expect("open should succeed");
        let notices = workspace.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(notices[0].message.contains("t0"));
        assert_eq!(workspace.registry().len(), MAX_TABS);
        assert!(workspace.registry().find_table("t0").is_none());
    }

    #[test]
    fn sql_text_updates_only_query_tabs() {
        let mut workspace = connected();
        let query = workspace.open_query_tab().expect("query tab should open");
        workspace
            .set_sql_text(&query, "select 1")
            .expect("sql text should update");
        assert_eq!(
            workspace
                .tab(&query)
                .and_then(|tab| tab.as_query())
                .map(|view| view.sql_text.as_str()),
            Some("select 1")
        );

        workspace.open_table("orders").expect("open should succeed");
        let table_tab = workspace.active().cloned().expect("active tab");
        assert!(matches!(
            workspace.set_sql_text(&table_tab, "select 2"),
            Err(WorkspaceError::NotAQueryTab(_))
        ));
        assert!(matches!(
            workspace.set_sql_text(&TabName::from_index(404), "x"),
            Err(WorkspaceError::TabNotFound(_))
        ));
    }

    #[test]
    fn attach_and_detach_wipe_tabs_but_keep_counter() {
        let mut workspace = connected();
        let first = workspace.open_query_tab().expect("query tab should open");

        workspace.attach(
            ConnectionDescriptor::new(DbKind::PostgreSql, "db.internal", "app", "billing"),
            vec![TableInfo::new("invoices")],
        );
        assert!(workspace.registry().is_empty());
        assert_eq!(workspace.tables().len(), 1);

        let second = workspace.open_query_tab().expect("query tab should open");
        assert_ne!(first, second);

        workspace.detach();
        assert!(!workspace.is_connected());
        assert!(workspace.tables().is_empty());
        assert!(workspace.registry().is_empty());
        assert_eq!(workspace.active(), None);
    }

    #[test]
    fn snapshot_reflects_active_tab() {
        let mut workspace = connected();
        workspace.open_table("orders").expect("open should succeed");
        let snapshot = workspace.snapshot();

        assert_eq!(snapshot.tabs.len(), 1);
        assert_eq!(
            snapshot.active_tab().and_then(|tab| tab.table_name()),
            Some("orders")
        );
        assert_eq!(snapshot.tables.len(), 2);
    }
}
