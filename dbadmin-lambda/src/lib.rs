use dbadmin_core::{DbAdminConfig, QueryEvent, QueryHandler, QueryResponse};
use dbadmin_iam::RdsTokenSigner;
use dbadmin_mysql::MysqlConnector;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

/// Run the query handler inside the AWS Lambda runtime.
///
/// The signer, connector and handler are built once per cold start; every
/// event then opens and closes its own connection.
pub async fn run_lambda(config: DbAdminConfig) -> Result<(), Error> {
    let signer = RdsTokenSigner::from_config(&config).await?;
    let connector = MysqlConnector::new(&config);
    let handler = QueryHandler::new(Arc::new(signer), Arc::new(connector), config.response_body);

    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "dbadmin ready"
    );

    lambda_runtime::run(service_fn(|event| function_handler(&handler, event))).await
}

/// Failures are returned to the runtime as-is; the caller gets no response body.
pub async fn function_handler(
    handler: &QueryHandler,
    event: LambdaEvent<QueryEvent>,
) -> Result<QueryResponse, Error> {
    let (payload, _context) = event.into_parts();
    Ok(handler.handle(payload).await?)
}
