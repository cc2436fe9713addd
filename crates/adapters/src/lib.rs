pub mod http;

pub use http::{HttpGateway, HttpGatewayError};

#[must_use]
pub fn adapter_name() -> &'static str {
    "dbdesk-adapters"
}
