use dbadmin_core::DbAdminConfig;
use lambda_runtime::{tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    let config = DbAdminConfig::from_env()?;
    dbadmin_lambda::run_lambda(config).await
}
