use crate::row::row_to_json;
use async_trait::async_trait;
use dbadmin_core::{AuthToken, Connector, DbAdminConfig, DbAdminError, Result, Row, Session, SslMode};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::{Connection, Executor};
use tracing::debug;

/// Opens one unpooled MySQL connection per invocation, using the auth token
/// as a cleartext password over TLS.
pub struct MysqlConnector {
    options: MySqlConnectOptions,
}

impl MysqlConnector {
    pub fn new(config: &DbAdminConfig) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .database(&config.database)
            .ssl_mode(ssl_mode(config.ssl_mode))
            .enable_cleartext_plugin(true);
        if let Some(ca) = &config.ssl_ca {
            options = options.ssl_ca(ca);
        }
        Self { options }
    }

    pub fn from_options(options: MySqlConnectOptions) -> Self {
        Self { options }
    }
}

fn ssl_mode(mode: SslMode) -> MySqlSslMode {
    match mode {
        SslMode::Required => MySqlSslMode::Required,
        SslMode::VerifyCa => MySqlSslMode::VerifyCa,
        SslMode::VerifyIdentity => MySqlSslMode::VerifyIdentity,
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    async fn connect(&self, token: &AuthToken) -> Result<Box<dyn Session>> {
        let options = self.options.clone().password(token.expose());
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| DbAdminError::Connect(e.to_string()))?;
        Ok(Box::new(MysqlSession { conn }))
    }
}

pub struct MysqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MysqlSession {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        let conn: &mut MySqlConnection = &mut self.conn;
        let rows = conn
            .fetch_all(sqlx::raw_sql(sql))
            .await
            .map_err(|e| DbAdminError::Query(e.to_string()))?;
        debug!(rows = rows.len(), "query returned");

        rows.iter().map(row_to_json).collect()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DbAdminError::Close(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssl_modes_map_one_to_one() {
        assert!(matches!(ssl_mode(SslMode::Required), MySqlSslMode::Required));
        assert!(matches!(ssl_mode(SslMode::VerifyCa), MySqlSslMode::VerifyCa));
        assert!(matches!(ssl_mode(SslMode::VerifyIdentity), MySqlSslMode::VerifyIdentity));
    }

    #[test]
    fn options_carry_config_values() {
        let mut config = DbAdminConfig::new("db.example.rds.amazonaws.com", "lambda_iam", "us-east-1");
        config.port = 3307;
        let connector = MysqlConnector::new(&config);
        assert_eq!(connector.options.get_host(), "db.example.rds.amazonaws.com");
        assert_eq!(connector.options.get_port(), 3307);
        assert_eq!(connector.options.get_username(), "lambda_iam");
        assert_eq!(connector.options.get_database(), Some("lambdadb"));
    }
}
