use crate::error::{DashboardError, Result};
use crate::schema::InsightItem;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewerCommand {
    /// Go to a 1-based page and emphasise `highlight` if it is non-empty.
    JumpTo { page: u32, highlight: String },
}

/// Sending half held by the insights panel. The viewer context owns the
/// receiver; nothing flows back.
#[derive(Debug, Clone)]
pub struct ViewerChannel {
    tx: UnboundedSender<ViewerCommand>,
    total_pages: Option<u32>,
}

impl ViewerChannel {
    pub fn new() -> (Self, UnboundedReceiver<ViewerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                total_pages: None,
            },
            rx,
        )
    }

    /// Page count reported by the analysis; enables range checks.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = Some(total_pages);
    }

    pub fn select_insight(&self, item: &InsightItem) -> Result<ViewerCommand> {
        if item.page == 0 || self.total_pages.is_some_and(|total| item.page > total) {
            return Err(DashboardError::Validation(format!(
                "Page {} is outside the document",
                item.page
            )));
        }

        let command = ViewerCommand::JumpTo {
            page: item.page,
            highlight: item.keyword.trim().to_string(),
        };
        debug!("Viewer command: {:?}", command);

        self.tx
            .send(command.clone())
            .map_err(|_| DashboardError::Validation("Viewer is not open".to_string()))?;
        Ok(command)
    }
}
