use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings};
use aws_sigv4::sign::v4;
use dbadmin_core::{AuthToken, DbAdminConfig, DbAdminError, Result, TokenSigner};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Lifetime RDS accepts for an IAM authentication token.
pub const TOKEN_TTL: Duration = Duration::from_secs(900);

const SIGNING_NAME: &str = "rds-db";

/// Generates RDS IAM authentication tokens for one (region, host, port, user).
///
/// Credentials are resolved on every call so rotated role credentials are
/// picked up; the provider itself is built once.
pub struct RdsTokenSigner {
    credentials: SharedCredentialsProvider,
    region: String,
    host: String,
    port: u16,
    username: String,
}

impl RdsTokenSigner {
    pub fn new(credentials: SharedCredentialsProvider, config: &DbAdminConfig) -> Self {
        Self {
            credentials,
            region: config.region.clone(),
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
        }
    }

    /// Use the default AWS credential chain (the Lambda execution role).
    pub async fn from_config(config: &DbAdminConfig) -> Result<Self> {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or_else(|| DbAdminError::Token("no AWS credentials provider found".to_string()))?;
        Ok(Self::new(credentials, config))
    }
}

#[async_trait]
impl TokenSigner for RdsTokenSigner {
    async fn auth_token(&self) -> Result<AuthToken> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| DbAdminError::Token(e.to_string()))?;

        let token = generate_auth_token(
            &credentials,
            &self.region,
            &self.host,
            self.port,
            &self.username,
            SystemTime::now(),
        )?;
        debug!(host = %self.host, user = %self.username, "generated RDS auth token");
        Ok(AuthToken::new(token))
    }
}

/// Presign `connect` for `username` and return the URL without its scheme,
/// which is the form RDS expects as the password.
pub fn generate_auth_token(
    credentials: &Credentials,
    region: &str,
    host: &str,
    port: u16,
    username: &str,
    time: SystemTime,
) -> Result<String> {
    let identity = credentials.clone().into();

    let mut settings = SigningSettings::default();
    settings.expires_in = Some(TOKEN_TTL);
    settings.signature_location = SignatureLocation::QueryParams;

    let params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SIGNING_NAME)
        .time(time)
        .settings(settings)
        .build()
        .map_err(|e| DbAdminError::Token(e.to_string()))?;

    let mut url = url::Url::parse(&format!("https://{host}:{port}/"))
        .map_err(|e| DbAdminError::Token(format!("invalid database host {host}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("Action", "connect")
        .append_pair("DBUser", username);

    let request = SignableRequest::new(
        "GET",
        url.as_str(),
        std::iter::empty(),
        SignableBody::Bytes(&[]),
    )
    .map_err(|e| DbAdminError::Token(e.to_string()))?;

    let (instructions, _signature) = sign(request, &params.into())
        .map_err(|e| DbAdminError::Token(e.to_string()))?
        .into_parts();

    for (name, value) in instructions.params() {
        url.query_pairs_mut().append_pair(name, value);
    }

    let signed = url.to_string();
    Ok(signed
        .strip_prefix("https://")
        .unwrap_or(&signed)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(session_token: Option<&str>) -> Credentials {
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            session_token.map(String::from),
            None,
            "test",
        )
    }

    // 2024-01-15T12:00:00Z
    fn fixed_time() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_705_320_000)
    }

    fn token(creds: &Credentials, user: &str) -> String {
        generate_auth_token(
            creds,
            "us-east-1",
            "db.cluster.us-east-1.rds.amazonaws.com",
            3306,
            user,
            fixed_time(),
        )
        .unwrap()
    }

    #[test]
    fn token_has_no_scheme_and_starts_with_host_and_action() {
        let t = token(&credentials(None), "lambda_iam");
        assert!(t.starts_with(
            "db.cluster.us-east-1.rds.amazonaws.com:3306/?Action=connect&DBUser=lambda_iam&"
        ));
    }

    #[test]
    fn token_carries_sigv4_query_parameters() {
        let t = token(&credentials(None), "lambda_iam");
        assert!(t.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(t.contains("X-Amz-Credential=AKIDEXAMPLE%2F20240115%2Fus-east-1%2Frds-db%2Faws4_request"));
        assert!(t.contains("X-Amz-Date=20240115T120000Z"));
        assert!(t.contains("X-Amz-Expires=900"));
        assert!(t.contains("X-Amz-SignedHeaders=host"));
        assert!(t.contains("X-Amz-Signature="));
        assert!(!t.contains("X-Amz-Security-Token"));
    }

    #[test]
    fn session_token_is_included_for_temporary_credentials() {
        let t = token(&credentials(Some("FQoGZXIvYXdzEXAMPLE")), "lambda_iam");
        assert!(t.contains("X-Amz-Security-Token=FQoGZXIvYXdzEXAMPLE"));
    }

    #[test]
    fn signing_is_deterministic_for_same_inputs() {
        let creds = credentials(None);
        assert_eq!(token(&creds, "lambda_iam"), token(&creds, "lambda_iam"));
        assert_ne!(token(&creds, "lambda_iam"), token(&creds, "reporting"));
    }

    #[test]
    fn username_is_url_encoded() {
        let t = token(&credentials(None), "app user");
        assert!(t.contains("DBUser=app+user&"));
    }

    #[tokio::test]
    async fn signer_produces_token_from_provider_credentials() {
        let config = DbAdminConfig::new("db.cluster.us-east-1.rds.amazonaws.com", "lambda_iam", "us-east-1");
        let signer = RdsTokenSigner::new(SharedCredentialsProvider::new(credentials(None)), &config);

        let first = signer.auth_token().await.unwrap();
        assert!(first
            .expose()
            .starts_with("db.cluster.us-east-1.rds.amazonaws.com:3306/?Action=connect&DBUser=lambda_iam&"));
        assert!(first.expose().contains("X-Amz-Credential=AKIDEXAMPLE%2F"));
    }
}
