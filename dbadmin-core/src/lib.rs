pub mod config;
pub mod error;
pub mod handler;
pub mod testing;

pub use config::{DbAdminConfig, ResponseBody, SslMode};
pub use error::{DbAdminError, Result};
pub use handler::QueryHandler;

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Row = serde_json::Map<String, serde_json::Value>;

/// Invocation payload. The query is passed through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvent {
    pub query: String,
}

/// HTTP-shaped invocation result. An absent body is omitted when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl QueryResponse {
    pub fn ok(body: Option<String>) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }
}

/// Short-lived database credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[async_trait::async_trait]
pub trait TokenSigner: Send + Sync {
    async fn auth_token(&self) -> Result<AuthToken>;
}

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, token: &AuthToken) -> Result<Box<dyn Session>>;
}

/// One open database connection.
#[async_trait::async_trait]
pub trait Session: Send {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;
    async fn close(self: Box<Self>) -> Result<()>;
}
