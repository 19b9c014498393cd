use std::time::{Duration, Instant};

use async_trait::async_trait;
use dbpanel_core::backend::{BackendError, PanelBackend};
use dbpanel_core::protocol::{normalize_command_response, StatementResult, TablesPayload};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HttpBackendError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    sql: &'a str,
}

/// Talks to the panel server over its JSON endpoints.
#[derive(Debug, Clone)]
pub struct HttpPanelBackend {
    base_url: String,
    client: Client,
}

impl HttpPanelBackend {
    /// Without a timeout a hung request stays pending until the server answers.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, HttpBackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl PanelBackend for HttpPanelBackend {
    async fn list_databases(&self) -> Result<Vec<String>, BackendError> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(self.url("/databases"))
            .send()
            .await
            .map_err(to_transport_error)?;
        let response = ensure_success(response)?;

        let databases = response
            .json::<Vec<String>>()
            .await
            .map_err(to_decode_error)?;
        debug!(
            count = databases.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "GET /databases"
        );
        Ok(databases)
    }

    async fn fetch_tables(&self, database: &str) -> Result<TablesPayload, BackendError> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(self.url("/tables"))
            .query(&[("db", database)])
            .send()
            .await
            .map_err(to_transport_error)?;

        // The server reports unknown databases as 4xx with an `{error}` body worth showing.
        let status = response.status();
        let body = response.bytes().await.map_err(to_transport_error)?;
        let payload = match serde_json::from_slice::<TablesPayload>(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => return Err(BackendError::Status(status.as_u16())),
            Err(error) => return Err(BackendError::decode(error.to_string())),
        };

        debug!(
            database,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "GET /tables"
        );
        Ok(payload)
    }

    async fn execute(&self, sql: &str) -> Result<Vec<StatementResult>, BackendError> {
        let started_at = Instant::now();
        let response = self
            .client
            .post(self.url("/COMMAND"))
            .json(&CommandRequest { sql })
            .send()
            .await
            .map_err(to_transport_error)?;
        let response = ensure_success(response)?;

        let body = response.json::<Value>().await.map_err(to_decode_error)?;
        let results = normalize_command_response(body);
        debug!(
            statements = results.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "POST /COMMAND"
        );
        Ok(results)
    }
}

fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(status = status.as_u16(), url = %response.url(), "server returned error status");
    Err(BackendError::Status(status.as_u16()))
}

fn to_transport_error(error: reqwest::Error) -> BackendError {
    BackendError::transport(error.to_string())
}

fn to_decode_error(error: reqwest::Error) -> BackendError {
    BackendError::decode(error.to_string())
}
