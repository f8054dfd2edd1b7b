use crate::balance_sheet::BalanceSheetBackend;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::insights::InsightBackend;
use crate::schema::UploadedDocument;
use crate::search::SearchBackend;
use crate::statements::StatementBackend;
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::json;
use std::path::Path;
use tokio::fs;

/// reqwest-backed client for the search, statement and analysis services.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: DashboardConfig,
}

impl HttpClient {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    async fn json_or_error(res: Response, what: &str) -> Result<serde_json::Value> {
        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(DashboardError::Network(format!(
                "{} failed (status {}): {}",
                what, status, error_text
            )));
        }

        let body: serde_json::Value = res.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl SearchBackend for HttpClient {
    async fn search(&self, query: &str) -> Result<serde_json::Value> {
        debug!("GET {} q={}", self.config.search_url, query);
        let res = self
            .client
            .get(&self.config.search_url)
            .query(&[("q", query), ("v", "3"), ("fts", "1")])
            .send()
            .await?;

        Self::json_or_error(res, "Search").await
    }
}

#[async_trait]
impl StatementBackend for HttpClient {
    async fn fetch(&self, symbol: &str) -> Result<serde_json::Value> {
        let res = self
            .client
            .post(&self.config.statement_url)
            .header("Accept", "application/json")
            .json(&json!({ "stockName": symbol }))
            .send()
            .await?;

        Self::json_or_error(res, "Statement fetch").await
    }
}

#[async_trait]
impl BalanceSheetBackend for HttpClient {
    async fn fetch_quarterly(&self, symbol: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.config.balance_sheet_url, symbol);
        let mut request = self.client.get(&url).query(&[("period", "quarter")]);
        if let Some(key) = &self.config.balance_sheet_api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        debug!("GET {} period=quarter", url);
        let res = request.send().await?;
        Self::json_or_error(res, "Balance sheet fetch").await
    }
}

#[async_trait]
impl InsightBackend for HttpClient {
    async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.config.analysis_url);
        let res = self
            .client
            .get(&url)
            .timeout(self.config.analysis_timeout)
            .send()
            .await?;
        let body = Self::json_or_error(res, "Health check").await?;

        Ok(body.get("status").and_then(|s| s.as_str()) == Some("healthy"))
    }

    async fn analyze(&self, document: &UploadedDocument) -> Result<serde_json::Value> {
        let url = format!("{}/analyze-pdf", self.config.analysis_url);
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(&document.content_type)?;
        let form = Form::new().part("file", part);

        let timeout = self.config.analysis_timeout;
        let res = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DashboardError::Timeout(timeout.as_secs())
                } else {
                    DashboardError::from(e)
                }
            })?;

        Self::json_or_error(res, "Analysis").await
    }
}

/// Reads a document from disk, guessing its content type from the extension.
pub async fn load_document(path: &Path) -> Result<UploadedDocument> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DashboardError::Validation("Invalid file name".to_string()))?
        .to_string();

    let metadata = fs::metadata(path).await?;
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    let bytes = fs::read(path).await?;

    Ok(UploadedDocument::new(name, content_type, bytes, last_modified))
}
