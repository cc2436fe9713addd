use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;

use crate::config::WorkspaceConfig;
use crate::connection::ConnectionDescriptor;
use crate::gateway::{ConnectionTestResult, DataGateway};
use crate::notice::Notice;
use crate::orchestrator::{perform, LoadRequest};
use crate::session::{SessionState, SessionStore};
use crate::view::{SubView, TabName};
use crate::workspace::{Workspace, WorkspaceError, WorkspaceSnapshot};

/// The workspace lock is never held across an await.
pub struct WorkspaceController<G: DataGateway> {
    gateway: Arc<G>,
    workspace: Arc<Mutex<Workspace>>,
    store: Option<Arc<dyn SessionStore>>,
    history_limit: usize,
}

impl<G: DataGateway> Clone for WorkspaceController<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            workspace: Arc::clone(&self.workspace),
            store: self.store.clone(),
            history_limit: self.history_limit,
        }
    }
}

impl<G: DataGateway> WorkspaceController<G> {
    #[must_use]
    pub fn new(gateway: G, config: &WorkspaceConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            workspace: Arc::new(Mutex::new(Workspace::new(config))),
            store: None,
            history_limit: config.history_limit,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[must_use]
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.workspace().snapshot()
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.workspace().drain_notices()
    }

    pub fn with_workspace<T>(&self, f: impl FnOnce(&mut Workspace) -> T) -> T {
        f(&mut self.workspace())
    }

    #[must_use]
    pub fn history(&self) -> Vec<ConnectionDescriptor> {
        self.load_session().history
    }

    pub async fn test_connection(
        &self,
        connection: &ConnectionDescriptor,
    ) -> Result<ConnectionTestResult, WorkspaceError> {
        match self.gateway.test_connection(connection).await {
            Ok(result) => {
                let notice = if result.success {
                    Notice::success(
                        result
                            .message
                            .clone()
                            .unwrap_or_else(|| "Connection succeeded".to_string()),
                    )
                } else {
                    Notice::error(format!(
                        "Connection test failed: {}",
                        result.message.as_deref().unwrap_or("no details")
                    ))
                };
                self.workspace().notify(notice);
                Ok(result)
            }
            Err(err) => {
                self.workspace()
                    .notify(Notice::error(format!("Connection test failed: {err}")));
                Err(err.into())
            }
        }
    }

    pub async fn connect(&self, connection: ConnectionDescriptor) -> Result<usize, WorkspaceError> {
        log::info!("connecting to {}", connection.display_name());
        match self.gateway.list_tables(&connection).await {
            Ok(tables) => {
                let count = tables.len();
                {
                    let mut workspace = self.workspace();
                    workspace.attach(connection.clone(), tables);
                    workspace.notify(Notice::success(format!(
                        "Connected to {}, found {count} tables",
                        connection.display_name()
                    )));
                }
                let history_limit = self.history_limit;
                self.update_session(|session| {
                    session.connected = true;
                    session.remember(&connection, history_limit);
                    session.last_connection = Some(connection);
                });
                Ok(count)
            }
            Err(err) => {
                self.workspace()
                    .notify(Notice::error(format!("Connection failed: {err}")));
                self.update_session(|session| session.connected = false);
                Err(err.into())
            }
        }
    }

    pub async fn switch_connection(
        &self,
        connection: ConnectionDescriptor,
    ) -> Result<usize, WorkspaceError> {
        {
            let mut workspace = self.workspace();
            if workspace
                .connection()
                .is_some_and(|current| current.same_target(&connection))
            {
                return Ok(workspace.tables().len());
            }
            workspace.detach();
        }
        self.connect(connection).await
    }

    pub fn disconnect(&self) {
        {
            let mut workspace = self.workspace();
            workspace.detach();
            workspace.notify(Notice::info("Disconnected from database"));
        }
        self.update_session(|session| session.connected = false);
    }

    pub async fn restore(&self) -> SessionState {
        let session = self.load_session();
        if let (true, Some(connection)) = (session.connected, session.last_connection.clone()) {
            if let Err(err) = self.connect(connection).await {
                log::warn!("automatic reconnect failed: {err}");
            }
        }
        session
    }

    pub async fn open_table(&self, table_name: &str) -> Result<(), WorkspaceError> {
        let requests = self.workspace().open_table(table_name)?;
        self.dispatch_all(requests).await;
        Ok(())
    }

    pub fn open_query_tab(&self) -> Result<TabName, WorkspaceError> {
        self.workspace().open_query_tab()
    }

    pub fn close_tab(&self, name: &TabName) -> bool {
        self.workspace().close_tab(name)
    }

    pub fn close_all(&self) -> usize {
        self.workspace().close_all()
    }

    pub fn set_active(&self, name: &TabName) -> bool {
        self.workspace().set_active(name)
    }

    pub fn set_sql_text(
        &self,
        name: &TabName,
        sql_text: impl Into<String>,
    ) -> Result<(), WorkspaceError> {
        self.workspace().set_sql_text(name, sql_text)
    }

    pub async fn set_active_sub_view(&self, name: &TabName, target: SubView) {
        let requests = self.workspace().set_active_sub_view(name, target);
        self.dispatch_all(requests).await;
    }

    pub async fn load_schema(&self, table_name: &str, target: Option<SubView>) {
        let request = self.workspace().load_schema(table_name, target);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn load_rows(
        &self,
        table_name: &str,
        page: u32,
        target: Option<SubView>,
        page_size: Option<u32>,
    ) {
        let request = self
            .workspace()
            .load_rows(table_name, page, target, page_size);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn refresh_schema(&self, name: &TabName) {
        let request = self.workspace().refresh_schema(name);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn refresh_rows(&self, name: &TabName) {
        let request = self.workspace().refresh_rows(name);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn next_page(&self, name: &TabName) {
        let request = self.workspace().next_page(name);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn previous_page(&self, name: &TabName) {
        let request = self.workspace().previous_page(name);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn change_page_size(&self, name: &TabName, page_size: u32) {
        let request = self.workspace().change_page_size(name, page_size);
        self.dispatch_all(request.into_iter().collect()).await;
    }

    pub async fn execute_sql(&self, name: &TabName) -> Result<(), WorkspaceError> {
        let request = self.workspace().execute_sql(name)?;
        self.dispatch(request).await;
        Ok(())
    }

    pub async fn dispatch(&self, request: LoadRequest) {
        let mut pending = vec![request];
        while let Some(request) = pending.pop() {
            let outcome = perform(self.gateway.as_ref(), request).await;
            let follow_ups = self.workspace().complete(outcome);
            pending.extend(follow_ups);
        }
    }

    pub async fn dispatch_all(&self, requests: Vec<LoadRequest>) {
        join_all(requests.into_iter().map(|request| self.dispatch(request))).await;
    }

    fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_session(&self) -> SessionState {
        let Some(store) = &self.store else {
            return SessionState::default();
        };
        store.load().unwrap_or_else(|err| {
            log::warn!("ignoring unreadable session: {err}");
            SessionState::default()
        })
    }

    fn update_session(&self, update: impl FnOnce(&mut SessionState)) {
        let Some(store) = &self.store else {
            return;
        };
        let mut session = self.load_session();
        update(&mut session);
        if let Err(err) = store.save(&session) {
            log::warn!("failed to persist session: {err}");
        }
    }
}
