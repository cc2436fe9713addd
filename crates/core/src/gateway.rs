use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::connection::{ConnectionDescriptor, TableInfo};

/// Backend column record; keys differ between dialects.
pub type RawColumn = Map<String, Value>;

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayErrorKind {
    #[error("could not reach the data service")]
    Transport,
    #[error("the data service did not respond in time")]
    Timeout,
    #[error("the data service answered with status {0}")]
    Status(u16),
    #[error("the data service sent an unreadable response")]
    Decode,
    #[error("the data service rejected the request")]
    Application,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.message.as_deref().map_or_else(|| self.kind.to_string(), str::to_string))]
pub struct GatewayError {
    kind: GatewayErrorKind,
    message: Option<String>,
}

impl GatewayError {
    #[must_use]
    pub fn new(kind: GatewayErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind,
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    #[must_use]
    pub fn application(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorKind::Application, message)
    }

    #[must_use]
    pub fn kind(&self) -> GatewayErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectionTestResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
}

impl ResultColumn {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TablePage {
    #[serde(default, rename = "data")]
    pub rows: Option<Vec<Row>>,
    #[serde(default)]
    pub columns: Option<Vec<ResultColumn>>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SqlResult {
    #[serde(default)]
    pub columns: Vec<ResultColumn>,
    #[serde(default, rename = "data")]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn test_connection(
        &self,
        connection: &ConnectionDescriptor,
    ) -> Result<ConnectionTestResult, GatewayError>;

    async fn list_tables(
        &self,
        connection: &ConnectionDescriptor,
    ) -> Result<Vec<TableInfo>, GatewayError>;

    async fn describe_table(
        &self,
        connection: &ConnectionDescriptor,
        table_name: &str,
    ) -> Result<Vec<RawColumn>, GatewayError>;

    async fn query_page(
        &self,
        connection: &ConnectionDescriptor,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TablePage, GatewayError>;

    async fn execute(
        &self,
        connection: &ConnectionDescriptor,
        sql: &str,
    ) -> Result<SqlResult, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::{GatewayError, GatewayErrorKind, SqlResult, TablePage};

    #[test]
    fn display_prefers_backend_message() {
        let err = GatewayError::with_message(GatewayErrorKind::Status(500), "table is locked");
        assert_eq!(err.to_string(), "table is locked");
        assert_eq!(err.kind(), GatewayErrorKind::Status(500));
    }

    #[test]
    fn blank_message_falls_back_to_kind_description() {
        let err = GatewayError::with_message(GatewayErrorKind::Timeout, "   ");
        assert!(err.message().is_none());
        assert_eq!(
            err.to_string(),
            "the data service did not respond in time"
        );
    }

    #[test]
    fn errors_box_as_std_errors() {
        let boxed: Box<dyn std::error::Error> =
            Box::new(GatewayError::new(GatewayErrorKind::Status(404)));
        assert_eq!(
            boxed.to_string(),
            "the data service answered with status 404"
        );

        let kind: Box<dyn std::error::Error> = Box::new(GatewayErrorKind::Transport);
        assert_eq!(kind.to_string(), "could not reach the data service");
    }

    #[test]
    fn table_page_tolerates_missing_fields() {
        let page: TablePage = serde_json::from_str("{}").expect("empty page should parse");
        assert!(page.rows.is_none());
        assert!(page.columns.is_none());
        assert!(page.total.is_none());

        let page: TablePage = serde_json::from_str(
            r#"{"data":[{"id":1}],"columns":[{"name":"id"}],"total":7,"page":1}"#,
        )
        .expect("page should parse");
        assert_eq!(page.rows.map(|rows| rows.len()), Some(1));
        assert_eq!(page.total, Some(7));
    }

    #[test]
    fn sql_result_keeps_inline_error() {
        let result: SqlResult =
            serde_json::from_str(r#"{"columns":[],"data":[],"error":"syntax error near FROM"}"#)
                .expect("result should parse");
        assert_eq!(result.error.as_deref(), Some("syntax error near FROM"));
    }
}
