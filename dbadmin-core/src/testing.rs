//! In-memory collaborators for exercising `QueryHandler`, plus certification
//! tests that any real `Connector` is expected to pass.

use crate::{
    AuthToken, Connector, DbAdminError, QueryEvent, QueryHandler, ResponseBody, Result, Row,
    Session, TokenSigner,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Token,
    Connect(String),
    Query(String),
    Close,
}

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

pub struct StaticSigner {
    token: std::result::Result<String, String>,
    log: CallLog,
}

impl StaticSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Ok(token.into()),
            log: CallLog::new(),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            token: Err(message.into()),
            log: CallLog::new(),
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait::async_trait]
impl TokenSigner for StaticSigner {
    async fn auth_token(&self) -> Result<AuthToken> {
        self.log.record(Call::Token);
        self.token
            .clone()
            .map(AuthToken::new)
            .map_err(DbAdminError::Token)
    }
}

/// Connector whose sessions replay a fixed outcome.
pub struct ScriptedConnector {
    rows: std::result::Result<Vec<Row>, String>,
    connect_error: Option<String>,
    close_error: Option<String>,
    log: CallLog,
}

impl ScriptedConnector {
    pub fn returning(rows: Vec<Row>) -> Self {
        Self {
            rows: Ok(rows),
            connect_error: None,
            close_error: None,
            log: CallLog::new(),
        }
    }

    pub fn failing_query(message: impl Into<String>) -> Self {
        Self {
            rows: Err(message.into()),
            ..Self::returning(Vec::new())
        }
    }

    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    pub fn failing_close(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, token: &AuthToken) -> Result<Box<dyn Session>> {
        self.log.record(Call::Connect(token.expose().to_string()));
        if let Some(message) = &self.connect_error {
            return Err(DbAdminError::Connect(message.clone()));
        }
        Ok(Box::new(ScriptedSession {
            rows: self.rows.clone(),
            close_error: self.close_error.clone(),
            log: self.log.clone(),
        }))
    }
}

struct ScriptedSession {
    rows: std::result::Result<Vec<Row>, String>,
    close_error: Option<String>,
    log: CallLog,
}

#[async_trait::async_trait]
impl Session for ScriptedSession {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.log.record(Call::Query(sql.to_string()));
        self.rows.clone().map_err(DbAdminError::Query)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.record(Call::Close);
        match self.close_error {
            Some(message) => Err(DbAdminError::Close(message)),
            None => Ok(()),
        }
    }
}

pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("row() expects a JSON object, got {other}"),
    }
}

// ---- Connector Certification Tests ----

pub async fn test_query_returns_rows_as_json_objects(connector: &dyn Connector, token: &AuthToken) {
    let mut session = connector.connect(token).await.unwrap();
    let rows = session
        .query("SELECT 1 AS n, 'farm' AS s, NULL AS z, CAST(2.50 AS DECIMAL(4,2)) AS m")
        .await
        .unwrap();
    session.close().await.unwrap();

    assert_eq!(rows.len(), 1);
    let first = &rows[0];
    assert_eq!(first.get("n").unwrap(), &json!(1));
    assert_eq!(first.get("s").unwrap(), &json!("farm"));
    assert_eq!(first.get("z").unwrap(), &json!(null));
    assert_eq!(first.get("m").unwrap(), &json!("2.50"));
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    assert_eq!(columns, vec!["n", "s", "z", "m"]);
}

pub async fn test_query_with_no_rows_returns_empty(connector: &dyn Connector, token: &AuthToken) {
    let mut session = connector.connect(token).await.unwrap();
    let rows = session.query("SELECT 1 AS n FROM DUAL WHERE 1 = 0").await.unwrap();
    session.close().await.unwrap();
    assert!(rows.is_empty());
}

pub async fn test_invalid_sql_is_a_query_error(connector: &dyn Connector, token: &AuthToken) {
    let mut session = connector.connect(token).await.unwrap();
    let err = session.query("SELEC nothing").await.unwrap_err();
    assert!(matches!(err, DbAdminError::Query(_)));
}

pub async fn test_statements_without_rows_return_empty(connector: &dyn Connector, token: &AuthToken) {
    let mut session = connector.connect(token).await.unwrap();
    let rows = session.query("DO 1").await.unwrap();
    session.close().await.unwrap();
    assert!(rows.is_empty());
}

/// Drives full invocations through `QueryHandler`: create, insert, select.
pub async fn test_handler_returns_last_selected_row(
    connector: Arc<dyn Connector>,
    signer: Arc<dyn TokenSigner>,
    table: &str,
) {
    let handler = QueryHandler::new(signer, connector, ResponseBody::LastRow);
    let run = |sql: String| {
        let handler = &handler;
        async move { handler.handle(QueryEvent { query: sql }).await.unwrap() }
    };

    let created = run(format!("CREATE TABLE `{table}` (id INT PRIMARY KEY, name VARCHAR(64))")).await;
    assert_eq!(created.status_code, 200);
    assert_eq!(created.body, None);

    run(format!("INSERT INTO `{table}` VALUES (1, 'coop'), (2, 'hen')")).await;

    let selected = run(format!("SELECT id, name FROM `{table}` ORDER BY id")).await;
    assert_eq!(selected.status_code, 200);
    let body: serde_json::Value = serde_json::from_str(selected.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"id": 2, "name": "hen"}));

    let empty = run(format!("SELECT id FROM `{table}` WHERE id > 10")).await;
    assert_eq!(empty.body, None);
}
