#[derive(thiserror::Error, Debug)]
pub enum DbAdminError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Token error: {0}")]
    Token(String),
    #[error("Connect error: {0}")]
    Connect(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Close error: {0}")]
    Close(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, DbAdminError>;
