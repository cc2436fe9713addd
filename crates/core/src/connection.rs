use serde::{Deserialize, Serialize};

use crate::gateway::RawColumn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DbKind {
    #[default]
    #[serde(rename = "MYSQL")]
    MySql,
    Oracle,
    #[serde(rename = "POSTGRESQL")]
    PostgreSql,
    #[serde(rename = "SQLSERVER")]
    SqlServer,
    Db2,
    Sqlite,
    #[serde(rename = "MARIADB")]
    MariaDb,
    H2,
    Hive,
    #[serde(rename = "CLICKHOUSE")]
    ClickHouse,
}

impl DbKind {
    pub const ALL: [Self; 10] = [
        Self::MySql,
        Self::Oracle,
        Self::PostgreSql,
        Self::SqlServer,
        Self::Db2,
        Self::Sqlite,
        Self::MariaDb,
        Self::H2,
        Self::Hive,
        Self::ClickHouse,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Oracle => "Oracle",
            Self::PostgreSql => "PostgreSQL",
            Self::SqlServer => "SQL Server",
            Self::Db2 => "DB2",
            Self::Sqlite => "SQLite",
            Self::MariaDb => "MariaDB",
            Self::H2 => "H2",
            Self::Hive => "Hive",
            Self::ClickHouse => "ClickHouse",
        }
    }

    /// File-backed kinds report port 0.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::MySql | Self::MariaDb => 3306,
            Self::Oracle => 1521,
            Self::PostgreSql => 5432,
            Self::SqlServer => 1433,
            Self::Db2 => 50_000,
            Self::Sqlite => 0,
            Self::H2 => 9092,
            Self::Hive => 10_000,
            Self::ClickHouse => 8123,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    #[serde(default)]
    pub db_kind: DbKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub secret: String,
    pub database_name: String,
}

impl ConnectionDescriptor {
    #[must_use]
    pub fn new(
        db_kind: DbKind,
        host: impl Into<String>,
        user: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            db_kind,
            host: host.into(),
            port: db_kind.default_port(),
            user: user.into(),
            secret: String::new(),
            database_name: database_name.into(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Two descriptors address the same connection when database, host and
    /// port agree; credentials and kind are ignored.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.database_name == other.database_name
            && self.host == other.host
            && self.port == other.port
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}@{}", self.database_name, self.host)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_name: String,
    #[serde(default)]
    pub columns: Option<Vec<RawColumn>>,
}

impl TableInfo {
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: None,
        }
    }
}
