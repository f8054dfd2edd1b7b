use crate::error::{DashboardError, Result};
use crate::handoff::validate_upload;
use crate::schema::{AnalysisReport, UploadedDocument};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;

pub const UNAVAILABLE_MESSAGE: &str = "The analysis service is unavailable. Please try again.";

#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// True when the service reports itself healthy.
    async fn health(&self) -> Result<bool>;

    async fn analyze(&self, document: &UploadedDocument) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisEvent {
    CheckingHealth,
    Submitting { filename: String },
    Completed { insights: usize, total_pages: u32 },
    Failed { reason: String },
}

pub fn parse_analysis_response(payload: serde_json::Value) -> Result<AnalysisReport> {
    if payload.get("success").and_then(|v| v.as_bool()) == Some(false) {
        let reason = payload
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("analysis was not successful");
        return Err(DashboardError::DataShape(reason.to_string()));
    }

    serde_json::from_value(payload).map_err(|e| DashboardError::DataShape(e.to_string()))
}

pub struct InsightSession<B: InsightBackend> {
    backend: B,
    timeout: Duration,
    check_health: bool,
}

impl<B: InsightBackend> InsightSession<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            check_health: true,
        }
    }

    pub fn without_health_check(mut self) -> Self {
        self.check_health = false;
        self
    }

    /// Health check, then a single submission bounded by the timeout.
    pub async fn run(
        &self,
        document: &UploadedDocument,
        progress: Option<Sender<AnalysisEvent>>,
    ) -> Result<AnalysisReport> {
        let result = self.run_inner(document, &progress).await;
        match &result {
            Ok(report) => {
                self.send_event(
                    &progress,
                    AnalysisEvent::Completed {
                        insights: report.insights.len(),
                        total_pages: report.total_pages,
                    },
                )
                .await
            }
            Err(e) => {
                warn!("Analysis of '{}' failed: {}", document.name, e);
                self.send_event(
                    &progress,
                    AnalysisEvent::Failed {
                        reason: e.to_string(),
                    },
                )
                .await
            }
        }
        result
    }

    /// Runs the analysis while publishing the side panel: `Loading` first,
    /// then the outcome.
    pub async fn run_into_panel(
        &self,
        document: &UploadedDocument,
        panel: &watch::Sender<InsightPanel>,
    ) {
        panel.send_replace(InsightPanel::Loading);
        let result = self.run(document, None).await;
        panel.send_replace(InsightPanel::from_result(result));
    }

    async fn run_inner(
        &self,
        document: &UploadedDocument,
        progress: &Option<Sender<AnalysisEvent>>,
    ) -> Result<AnalysisReport> {
        validate_upload(document)?;

        if self.check_health {
            self.send_event(progress, AnalysisEvent::CheckingHealth).await;
            let healthy = self.backend.health().await.unwrap_or(false);
            if !healthy {
                return Err(DashboardError::Network(UNAVAILABLE_MESSAGE.to_string()));
            }
        }

        self.send_event(
            progress,
            AnalysisEvent::Submitting {
                filename: document.name.clone(),
            },
        )
        .await;
        info!("Submitting '{}' ({} bytes) for analysis", document.name, document.size);

        let payload = tokio::time::timeout(self.timeout, self.backend.analyze(document))
            .await
            .map_err(|_| DashboardError::Timeout(self.timeout.as_secs()))??;

        parse_analysis_response(payload)
    }

    async fn send_event(&self, sender: &Option<Sender<AnalysisEvent>>, event: AnalysisEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

/// State of the insights side panel. The document viewer renders
/// independently of it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InsightPanel {
    #[default]
    Idle,
    Loading,
    Ready(AnalysisReport),
    Failed { message: String, retryable: bool },
}

impl InsightPanel {
    pub fn from_result(result: Result<AnalysisReport>) -> Self {
        match result {
            Ok(report) => InsightPanel::Ready(report),
            Err(e) => InsightPanel::Failed {
                message: match &e {
                    DashboardError::Network(msg) if msg == UNAVAILABLE_MESSAGE => msg.clone(),
                    _ => e.user_message(),
                },
                retryable: e.is_retryable(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_unsuccessful_response() {
        let err = parse_analysis_response(json!({"success": false, "error": "unreadable PDF"}))
            .unwrap_err();
        assert!(matches!(err, DashboardError::DataShape(ref m) if m == "unreadable PDF"));
    }

    #[test]
    fn test_parse_missing_fields() {
        assert!(parse_analysis_response(json!({"success": true})).is_err());
    }

    struct SlowBackend;

    #[async_trait]
    impl InsightBackend for SlowBackend {
        async fn health(&self) -> Result<bool> {
            Ok(true)
        }

        async fn analyze(&self, _document: &UploadedDocument) -> Result<serde_json::Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({
                "success": true,
                "totalPages": 3,
                "insights": {"financialHighlights": [], "keyMetrics": [], "futureOutlook": []}
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_shows_loading_until_result() {
        let document = UploadedDocument::new("q2.pdf", "application/pdf", b"%PDF".to_vec(), 0);
        let session = InsightSession::new(SlowBackend, Duration::from_secs(60));
        let (tx, mut rx) = watch::channel(InsightPanel::default());

        let observed = async {
            rx.wait_for(|p| *p == InsightPanel::Loading).await.unwrap();
            rx.wait_for(|p| matches!(p, InsightPanel::Ready(_))).await.unwrap();
        };
        tokio::join!(session.run_into_panel(&document, &tx), observed);

        assert!(matches!(&*tx.borrow(), InsightPanel::Ready(r) if r.total_pages == 3));
    }

    #[test]
    fn test_panel_from_timeout() {
        let panel = InsightPanel::from_result(Err(DashboardError::Timeout(60)));
        assert_eq!(
            panel,
            InsightPanel::Failed {
                message: "The analysis took longer than 60 seconds. Please retry.".to_string(),
                retryable: true,
            }
        );
    }
}
