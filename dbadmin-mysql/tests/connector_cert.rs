use dbadmin_core::testing::{self as cert, StaticSigner};
use dbadmin_core::{AuthToken, DbAdminConfig, SslMode};
use dbadmin_mysql::MysqlConnector;
use std::sync::Arc;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mysql::Mysql;

// testcontainers-modules mysql defaults: root with empty password, db = "test"
fn no_password() -> AuthToken {
    AuthToken::new("")
}

async fn create_connector() -> (MysqlConnector, impl std::any::Any) {
    let container = Mysql::default().start().await.unwrap();
    let port = container.get_host_port_ipv4(3306).await.unwrap();
    let mut config = DbAdminConfig::new("127.0.0.1", "root", "us-east-1");
    config.port = port;
    config.database = "test".to_string();
    config.ssl_mode = SslMode::Required;
    (MysqlConnector::new(&config), container)
}

#[tokio::test]
async fn query_should_return_rows_as_json_objects() {
    let (connector, _c) = create_connector().await;
    cert::test_query_returns_rows_as_json_objects(&connector, &no_password()).await;
}

#[tokio::test]
async fn query_without_matches_should_return_no_rows() {
    let (connector, _c) = create_connector().await;
    cert::test_query_with_no_rows_returns_empty(&connector, &no_password()).await;
}

#[tokio::test]
async fn invalid_sql_should_be_a_query_error() {
    let (connector, _c) = create_connector().await;
    cert::test_invalid_sql_is_a_query_error(&connector, &no_password()).await;
}

#[tokio::test]
async fn statement_without_result_set_should_return_no_rows() {
    let (connector, _c) = create_connector().await;
    cert::test_statements_without_rows_return_empty(&connector, &no_password()).await;
}

#[tokio::test]
async fn handler_should_respond_with_last_selected_row() {
    let (connector, _c) = create_connector().await;
    let table = format!("farm_{}", uuid::Uuid::new_v4().simple());
    cert::test_handler_returns_last_selected_row(
        Arc::new(connector),
        Arc::new(StaticSigner::new("")),
        &table,
    )
    .await;
}
