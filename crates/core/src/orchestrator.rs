use crate::columns::normalize_all;
use crate::connection::ConnectionDescriptor;
use crate::gateway::{DataGateway, GatewayError, RawColumn, SqlResult, TablePage};
use crate::notice::Notice;
use crate::view::{SubView, TabName};
use crate::workspace::{Workspace, WorkspaceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRequest {
    pub connection: ConnectionDescriptor,
    pub tab: TabName,
    pub table_name: String,
    /// Fetch page one of the rows once the schema has landed.
    pub chain_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsRequest {
    pub connection: ConnectionDescriptor,
    pub tab: TabName,
    pub table_name: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub connection: ConnectionDescriptor,
    pub tab: TabName,
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Schema(SchemaRequest),
    Rows(RowsRequest),
    Execute(ExecuteRequest),
}

impl LoadRequest {
    #[must_use]
    pub fn tab(&self) -> &TabName {
        match self {
            Self::Schema(request) => &request.tab,
            Self::Rows(request) => &request.tab,
            Self::Execute(request) => &request.tab,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Schema(SchemaRequest, Result<Vec<RawColumn>, GatewayError>),
    Rows(RowsRequest, Result<TablePage, GatewayError>),
    Execute(ExecuteRequest, Result<SqlResult, GatewayError>),
}

pub async fn perform<G>(gateway: &G, request: LoadRequest) -> LoadOutcome
where
    G: DataGateway + ?Sized,
{
    match request {
        LoadRequest::Schema(request) => {
            log::debug!(
                "describing table `{}` for {}",
                request.table_name,
                request.tab
            );
            let result = gateway
                .describe_table(&request.connection, &request.table_name)
                .await;
            LoadOutcome::Schema(request, result)
        }
        LoadRequest::Rows(request) => {
            log::debug!(
                "fetching page {} (size {}) of `{}` for {}",
                request.page,
                request.page_size,
                request.table_name,
                request.tab
            );
            let result = gateway
                .query_page(
                    &request.connection,
                    &request.table_name,
                    request.page,
                    request.page_size,
                )
                .await;
            LoadOutcome::Rows(request, result)
        }
        LoadRequest::Execute(request) => {
            log::debug!("executing statement for {}", request.tab);
            let result = gateway.execute(&request.connection, &request.sql).await;
            LoadOutcome::Execute(request, result)
        }
    }
}

impl Workspace {
    pub fn load_schema(
        &mut self,
        table_name: &str,
        target: Option<SubView>,
    ) -> Option<LoadRequest> {
        let connection = self.connection.clone()?;
        let name = self.registry.find_table(table_name)?.name.clone();
        let tab = self.registry.get_mut(&name)?;
        let view = tab.as_table_mut()?;

        let sub_view = target.unwrap_or(view.active_sub_view);
        view.active_sub_view = sub_view;
        tab.loading = true;

        Some(LoadRequest::Schema(SchemaRequest {
            connection,
            tab: name,
            table_name: table_name.to_string(),
            chain_rows: target.is_none() && sub_view == SubView::Schema,
        }))
    }

    pub fn load_rows(
        &mut self,
        table_name: &str,
        page: u32,
        target: Option<SubView>,
        page_size: Option<u32>,
    ) -> Option<LoadRequest> {
        let connection = self.connection.clone()?;
        let name = self.registry.find_table(table_name)?.name.clone();
        let tab = self.registry.get_mut(&name)?;
        let view = tab.as_table_mut()?;

        let page = page.max(1);
        let page_size = page_size.unwrap_or(view.page_size).max(1);
        view.page = page;
        view.page_size = page_size;
        if let Some(target) = target {
            view.active_sub_view = target;
        }
        tab.loading = true;

        Some(LoadRequest::Rows(RowsRequest {
            connection,
            tab: name,
            table_name: table_name.to_string(),
            page,
            page_size,
        }))
    }

    pub fn set_active_sub_view(&mut self, name: &TabName, target: SubView) -> Vec<LoadRequest> {
        let Some(tab) = self.registry.get_mut(name) else {
            return Vec::new();
        };
        let loading = tab.loading;
        let Some(view) = tab.as_table_mut() else {
            return Vec::new();
        };
        view.active_sub_view = target;
        let (has_rows, has_schema) = (view.has_rows(), view.has_schema());
        let table_name = view.table_name.clone();

        let request = match target {
            SubView::Rows if !has_rows && !loading => {
                self.load_rows(&table_name, 1, Some(target), None)
            }
            SubView::Schema if !has_schema && !loading => {
                self.load_schema(&table_name, Some(target))
            }
            _ => None,
        };
        request.into_iter().collect()
    }

    pub fn refresh_schema(&mut self, name: &TabName) -> Option<LoadRequest> {
        let table_name = self.registry.get(name)?.table_name()?.to_string();
        self.load_schema(&table_name, None)
    }

    pub fn refresh_rows(&mut self, name: &TabName) -> Option<LoadRequest> {
        let view = self.registry.get(name)?.as_table()?;
        let (table_name, page) = (view.table_name.clone(), view.page);
        self.load_rows(&table_name, page, None, None)
    }

    pub fn next_page(&mut self, name: &TabName) -> Option<LoadRequest> {
        let view = self.registry.get(name)?.as_table()?;
        if !view.has_next_page() {
            return None;
        }
        let (table_name, page) = (view.table_name.clone(), view.page + 1);
        self.load_rows(&table_name, page, None, None)
    }

    pub fn previous_page(&mut self, name: &TabName) -> Option<LoadRequest> {
        let view = self.registry.get(name)?.as_table()?;
        if !view.has_previous_page() {
            return None;
        }
        let (table_name, page) = (view.table_name.clone(), view.page - 1);
        self.load_rows(&table_name, page, None, None)
    }

    pub fn change_page_size(&mut self, name: &TabName, page_size: u32) -> Option<LoadRequest> {
        let table_name = self.registry.get(name)?.table_name()?.to_string();
        self.load_rows(&table_name, 1, None, Some(page_size))
    }

    pub fn execute_sql(&mut self, name: &TabName) -> Result<LoadRequest, WorkspaceError> {
        let tab = self
            .registry
            .get_mut(name)
            .ok_or_else(|| WorkspaceError::TabNotFound(name.clone()))?;
        let view = tab
            .as_query_mut()
            .ok_or_else(|| WorkspaceError::NotAQueryTab(name.clone()))?;

        if view.sql_text.trim().is_empty() {
            self.notices
                .push(Notice::error(WorkspaceError::EmptySql.to_string()));
            return Err(WorkspaceError::EmptySql);
        }
        if view.executing {
            return Err(WorkspaceError::AlreadyExecuting(name.clone()));
        }
        let connection = self
            .connection
            .clone()
            .ok_or(WorkspaceError::NotConnected)?;

        view.executing = true;
        Ok(LoadRequest::Execute(ExecuteRequest {
            connection,
            tab: name.clone(),
            sql: view.sql_text.clone(),
        }))
    }

    /// The tab is looked up again by name; a tab closed since the request was
    /// issued drops the result. `active_sub_view` is never written here.
    pub fn complete(&mut self, outcome: LoadOutcome) -> Vec<LoadRequest> {
        match outcome {
            LoadOutcome::Schema(request, result) => self.complete_schema(request, result),
            LoadOutcome::Rows(request, result) => {
                self.complete_rows(&request, result);
                Vec::new()
            }
            LoadOutcome::Execute(request, result) => {
                self.complete_execute(&request, result);
                Vec::new()
            }
        }
    }

    fn complete_schema(
        &mut self,
        request: SchemaRequest,
        result: Result<Vec<RawColumn>, GatewayError>,
    ) -> Vec<LoadRequest> {
        let Some(tab) = self.registry.get_mut(&request.tab) else {
            log::debug!(
                "discarding schema of `{}`: {} was closed",
                request.table_name,
                request.tab
            );
            return Vec::new();
        };
        tab.loading = false;
        let Some(view) = tab.as_table_mut() else {
            return Vec::new();
        };

        match result {
            Ok(columns) => {
                view.schema_columns = Some(normalize_all(&columns));
                if request.chain_rows {
                    return self
                        .load_rows(&request.table_name, 1, None, None)
                        .into_iter()
                        .collect();
                }
            }
            Err(err) => {
                self.notices
                    .push(Notice::error(format!("Failed to load table structure: {err}")));
            }
        }
        Vec::new()
    }

    fn complete_rows(&mut self, request: &RowsRequest, result: Result<TablePage, GatewayError>) {
        let Some(tab) = self.registry.get_mut(&request.tab) else {
            log::debug!(
                "discarding page {} of `{}`: {} was closed",
                request.page,
                request.table_name,
                request.tab
            );
            return;
        };
        let Some(view) = tab.as_table_mut() else {
            return;
        };
        if view.page != request.page || view.page_size != request.page_size {
            log::debug!(
                "discarding page {} of `{}`: superseded by page {}",
                request.page,
                request.table_name,
                view.page
            );
            return;
        }

        match result {
            Ok(page) => {
                view.rows = page.rows.unwrap_or_default();
                view.row_columns = page.columns.unwrap_or_default();
                view.total_rows = page.total.unwrap_or(0);
            }
            Err(err) => {
                self.notices
                    .push(Notice::error(format!("Failed to load table data: {err}")));
            }
        }
        tab.loading = false;
    }

    fn complete_execute(
        &mut self,
        request: &ExecuteRequest,
        result: Result<SqlResult, GatewayError>,
    ) {
        let Some(view) = self
            .registry
            .get_mut(&request.tab)
            .and_then(|tab| tab.as_query_mut())
        else {
            log::debug!("discarding statement result: {} was closed", request.tab);
            return;
        };
        view.executing = false;

        match result {
            Ok(result) => {
                if let Some(error) = &result.error {
                    self.notices
                        .push(Notice::error(format!("Execution failed: {error}")));
                }
                view.result = Some(result);
            }
            Err(err) => {
                self.notices
                    .push(Notice::error(format!("Execution failed: {err}")));
            }
        }
    }
}
