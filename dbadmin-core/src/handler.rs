use crate::{
    Connector, DbAdminError, QueryEvent, QueryResponse, ResponseBody, Result, Row, TokenSigner,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one query per invocation: sign, connect, query, log, close, respond.
///
/// Holds no per-invocation state, so a single instance serves every event
/// handled by the process.
pub struct QueryHandler {
    signer: Arc<dyn TokenSigner>,
    connector: Arc<dyn Connector>,
    response_body: ResponseBody,
}

impl QueryHandler {
    pub fn new(
        signer: Arc<dyn TokenSigner>,
        connector: Arc<dyn Connector>,
        response_body: ResponseBody,
    ) -> Self {
        Self {
            signer,
            connector,
            response_body,
        }
    }

    pub async fn handle(&self, event: QueryEvent) -> Result<QueryResponse> {
        let token = self.signer.auth_token().await?;
        let mut session = self.connector.connect(&token).await?;
        debug!("connection established");

        // A failed query returns before close; dropping the session tears the
        // socket down without a graceful quit.
        let rows = session.query(&event.query).await?;

        info!("Ran query: {}", event.query);
        for row in &rows {
            let line =
                serde_json::to_string(row).map_err(|e| DbAdminError::Serialize(e.to_string()))?;
            info!("{line}");
        }

        session.close().await?;
        debug!("connection closed");

        let body = render_body(self.response_body, rows)?;
        Ok(QueryResponse::ok(body))
    }
}

fn render_body(mode: ResponseBody, rows: Vec<Row>) -> Result<Option<String>> {
    let body = match mode {
        ResponseBody::LastRow => rows.last().map(serde_json::to_string),
        ResponseBody::AllRows => Some(serde_json::to_string(&rows)),
    };
    body.transpose()
        .map_err(|e| DbAdminError::Serialize(e.to_string()))
}
