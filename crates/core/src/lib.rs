pub mod columns;
pub mod config;
pub mod connection;
pub mod controller;
pub mod eviction;
pub mod gateway;
pub mod notice;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod view;
pub mod workspace;

pub use config::{GatewayConfig, WorkspaceConfig};
pub use connection::{ConnectionDescriptor, DbKind, TableInfo};
pub use controller::WorkspaceController;
pub use gateway::{DataGateway, GatewayError, GatewayErrorKind};
pub use view::{SubView, TabName};
pub use workspace::{Workspace, WorkspaceError, WorkspaceSnapshot};

#[must_use]
pub fn domain_name() -> &'static str {
    "dbdesk-core"
}
