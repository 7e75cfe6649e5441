//! Dataset store boundary.
//!
//! The statistics table lives behind a PostgREST-style read endpoint. The
//! loader fetches every row exactly once at startup; rows are immutable for
//! the rest of the session. A failed load is fatal: no partial dataset is
//! usable, so the coordinator blocks on [`DataLoadError`] with no retry
//! short of a full reload.

use async_trait::async_trait;
use tracing::debug;

use crate::error::DataLoadError;
use crate::records::StatRecord;

/// Read access to the statistics table.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Fetch the full table. Called once at application start.
    async fn load(&self) -> Result<Vec<StatRecord>, DataLoadError>;
}

/// Dataset store backed by an HTTP row endpoint.
pub struct HttpDatasetStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl HttpDatasetStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "cybersecurity_stats".to_string(),
        }
    }

    /// Read from a different table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

#[async_trait]
impl DatasetStore for HttpDatasetStore {
    async fn load(&self) -> Result<Vec<StatRecord>, DataLoadError> {
        let url = format!(
            "{}/rest/v1/{}?select=*",
            self.base_url.trim_end_matches('/'),
            self.table
        );

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| DataLoadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataLoadError::Api(format!("{status}: {body}")));
        }

        let rows: Vec<StatRecord> = response
            .json()
            .await
            .map_err(|e| DataLoadError::Parse(e.to_string()))?;

        debug!(rows = rows.len(), table = %self.table, "dataset loaded");
        Ok(rows)
    }
}
