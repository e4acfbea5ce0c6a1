use crate::{DbAdminError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_DATABASE: &str = "lambdadb";

/// Transport encryption requirement for the database connection.
///
/// The token travels as a cleartext password, so every mode requires TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Required,
    VerifyCa,
    VerifyIdentity,
}

impl FromStr for SslMode {
    type Err = DbAdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "preferred" => Err(DbAdminError::Config(format!(
                "SSL mode {s} would allow the auth token over plaintext"
            ))),
            "required" => Ok(Self::Required),
            "verify-ca" | "verify_ca" => Ok(Self::VerifyCa),
            "verify-identity" | "verify_identity" => Ok(Self::VerifyIdentity),
            other => Err(DbAdminError::Config(format!("unknown SSL mode: {other}"))),
        }
    }
}

/// What goes into the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseBody {
    /// JSON of the final row only, absent when the query returned nothing.
    #[default]
    LastRow,
    /// JSON array of every row.
    AllRows,
}

impl FromStr for ResponseBody {
    type Err = DbAdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "last-row" | "last_row" => Ok(Self::LastRow),
            "all-rows" | "all_rows" => Ok(Self::AllRows),
            other => Err(DbAdminError::Config(format!(
                "unknown response body mode: {other}"
            ))),
        }
    }
}

/// Process-wide settings, read once at cold start.
#[derive(Clone)]
pub struct DbAdminConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Read for compatibility with existing deployments. Authentication always
    /// uses an IAM token, so this is never sent to the database.
    pub password: Option<String>,
    pub region: String,
    pub database: String,
    pub ssl_mode: SslMode,
    pub ssl_ca: Option<PathBuf>,
    pub response_body: ResponseBody,
}

impl DbAdminConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: None,
            region: region.into(),
            database: DEFAULT_DATABASE.to_string(),
            ssl_mode: SslMode::Required,
            ssl_ca: None,
            response_body: ResponseBody::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DbAdminError::Config(format!("{key} not set")))
        };

        let mut config = Self::new(
            required("databaseHost")?,
            required("databaseUser")?,
            required("AWS_REGION")?,
        );

        config.password = lookup("databasePassword").filter(|v| !v.is_empty());
        if config.password.is_some() {
            warn!("databasePassword is set but ignored; connections authenticate with an IAM token");
        }

        if let Some(port) = lookup("databasePort").filter(|v| !v.is_empty()) {
            config.port = port
                .parse()
                .map_err(|_| DbAdminError::Config(format!("invalid databasePort: {port}")))?;
        }
        if let Some(database) = lookup("databaseName").filter(|v| !v.is_empty()) {
            config.database = database;
        }

        config.ssl_ca = lookup("databaseSslCa")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        config.ssl_mode = match lookup("databaseSslMode").filter(|v| !v.is_empty()) {
            Some(mode) => mode.parse()?,
            None if config.ssl_ca.is_some() => SslMode::VerifyIdentity,
            None => SslMode::Required,
        };

        if let Some(mode) = lookup("responseBody").filter(|v| !v.is_empty()) {
            config.response_body = mode.parse()?;
        }

        Ok(config)
    }
}

impl fmt::Debug for DbAdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbAdminConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("ssl_ca", &self.ssl_ca)
            .field("response_body", &self.response_body)
            .finish()
    }
}
