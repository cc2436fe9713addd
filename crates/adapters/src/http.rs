use async_trait::async_trait;
use dbdesk_core::config::GatewayConfig;
use dbdesk_core::connection::{ConnectionDescriptor, DbKind, TableInfo};
use dbdesk_core::gateway::{
    ConnectionTestResult, DataGateway, GatewayError, GatewayErrorKind, RawColumn, SqlResult,
    TablePage,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpGatewayError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct WireConnection<'a> {
    db_type: DbKind,
    ip: &'a str,
    port: u16,
    username: &'a str,
    password: &'a str,
    db_name: &'a str,
}

impl<'a> From<&'a ConnectionDescriptor> for WireConnection<'a> {
    fn from(connection: &'a ConnectionDescriptor) -> Self {
        Self {
            db_type: connection.db_kind,
            ip: &connection.host,
            port: connection.port,
            username: &connection.user,
            password: &connection.secret,
            db_name: &connection.database_name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableStructureBody<'a> {
    #[serde(flatten)]
    connection: WireConnection<'a>,
    table_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, HttpGatewayError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(HttpGatewayError::EmptyBaseUrl);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| HttpGatewayError::Client { source })?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        log::debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("POST {url} failed with {status}");
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(|err| {
            log::warn!("POST {url} returned an unreadable body: {err}");
            GatewayError::with_message(GatewayErrorKind::Decode, err.to_string())
        })
    }
}

#[async_trait]
impl DataGateway for HttpGateway {
    async fn test_connection(
        &self,
        connection: &ConnectionDescriptor,
    ) -> Result<ConnectionTestResult, GatewayError> {
        self.post(
            "/database/test-connection",
            &[],
            &WireConnection::from(connection),
        )
        .await
    }

    async fn list_tables(
        &self,
        connection: &ConnectionDescriptor,
    ) -> Result<Vec<TableInfo>, GatewayError> {
        self.post("/database/tables", &[], &WireConnection::from(connection))
            .await
    }

    async fn describe_table(
        &self,
        connection: &ConnectionDescriptor,
        table_name: &str,
    ) -> Result<Vec<RawColumn>, GatewayError> {
        let body = TableStructureBody {
            connection: WireConnection::from(connection),
            table_name,
        };
        self.post("/database/table-structure", &[], &body).await
    }

    async fn query_page(
        &self,
        connection: &ConnectionDescriptor,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TablePage, GatewayError> {
        let query = [
            ("tableName", table_name.to_string()),
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        self.post("/database/query", &query, &WireConnection::from(connection))
            .await
    }

    async fn execute(
        &self,
        connection: &ConnectionDescriptor,
        sql: &str,
    ) -> Result<SqlResult, GatewayError> {
        self.post(
            "/database/execute",
            &[("sql", sql.to_string())],
            &WireConnection::from(connection),
        )
        .await
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    let kind = if err.is_timeout() {
        GatewayErrorKind::Timeout
    } else if err.is_decode() {
        GatewayErrorKind::Decode
    } else {
        GatewayErrorKind::Transport
    };
    log::warn!("data service request failed: {err}");
    GatewayError::new(kind)
}

fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let kind = GatewayErrorKind::Status(status.as_u16());
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    match message {
        Some(message) => GatewayError::with_message(kind, message),
        None => GatewayError::new(kind),
    }
}

#[cfg(test)]
mod tests {
    use dbdesk_core::config::GatewayConfig;
    use dbdesk_core::connection::{ConnectionDescriptor, DbKind};
    use dbdesk_core::gateway::GatewayErrorKind;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{
        endpoint, status_error, HttpGateway, HttpGatewayError, TableStructureBody, WireConnection,
    };

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new(DbKind::PostgreSql, "db.internal", "app", "billing")
            .with_secret("s3cret")
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://localhost:8076/api/", "/database/tables"),
            "http://localhost:8076/api/database/tables"
        );
        assert_eq!(
            endpoint("http://localhost:8076/api", "database/query"),
            "http://localhost:8076/api/database/query"
        );
    }

    #[test]
    fn connection_serializes_with_service_field_names() {
        let descriptor = descriptor();
        let value = serde_json::to_value(WireConnection::from(&descriptor))
            .expect("connection should serialize");
        assert_eq!(
            value,
            json!({
                "dbType": "POSTGRESQL",
                "ip": "db.internal",
                "port": 5432,
                "username": "app",
                "password": "s3cret",
                "dbName": "billing",
            })
        );
    }

    #[test]
    fn table_structure_body_flattens_connection() {
        let descriptor = descriptor();
        let body = TableStructureBody {
            connection: WireConnection::from(&descriptor),
            table_name: "invoices",
        };
        let value = serde_json::to_value(&body).expect("body should serialize");
        assert_eq!(value["tableName"], "invoices");
        assert_eq!(value["dbName"], "billing");
    }

    #[test]
    fn status_error_prefers_service_message() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"Table 'shop.nope' doesn't exist"}"#,
        );
        assert_eq!(err.kind(), GatewayErrorKind::Status(500));
        assert_eq!(err.to_string(), "Table 'shop.nope' doesn't exist");

        let err = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.kind(), GatewayErrorKind::Status(502));
        assert_eq!(err.message(), None);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn gateway_requires_base_url() {
        let config = GatewayConfig {
            base_url: "  ".to_string(),
            timeout_secs: 1,
        };
        assert!(matches!(
            HttpGateway::new(&config),
            Err(HttpGatewayError::EmptyBaseUrl)
        ));

        let gateway = HttpGateway::new(&GatewayConfig {
            base_url: "http://localhost:8076/api/".to_string(),
            timeout_secs: 1,
        })
        .expect("gateway should build");
        assert_eq!(gateway.base_url(), "http://localhost:8076/api");
    }
}
