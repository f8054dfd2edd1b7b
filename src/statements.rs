use crate::catalog::{build_sections, DashboardSection};
use crate::error::{DashboardError, Result};
use crate::schema::StatementBundle;
use async_trait::async_trait;
use log::{info, warn};

/// Source of the `{data: {profit_loss, balance_sheet, cash_flow}}` envelope.
#[async_trait]
pub trait StatementBackend: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<serde_json::Value>;
}

/// Validates the statement envelope. A missing `data` object is an error; a
/// missing statement inside it is treated as empty.
pub fn parse_statement_response(payload: serde_json::Value) -> Result<StatementBundle> {
    let data = payload
        .get("data")
        .filter(|d| d.is_object())
        .cloned()
        .ok_or_else(|| DashboardError::DataShape("response has no `data` object".to_string()))?;

    for section in ["profit_loss", "balance_sheet", "cash_flow"] {
        if let Some(rows) = data.get(section) {
            if !rows.is_array() && !rows.is_null() {
                return Err(DashboardError::DataShape(format!(
                    "`{}` is not a list of rows",
                    section
                )));
            }
        }
    }

    let mut data = data;
    if let Some(obj) = data.as_object_mut() {
        obj.retain(|_, v| !v.is_null());
    }

    serde_json::from_value(data).map_err(|e| DashboardError::DataShape(e.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardLoad {
    Ready {
        symbol: String,
        sections: Vec<DashboardSection>,
    },
    Failed {
        symbol: String,
        message: String,
    },
}

/// Fetches and lays out a company dashboard. Failures become a `Failed`
/// panel rather than an error.
pub async fn load_company<B: StatementBackend + ?Sized>(backend: &B, symbol: &str) -> DashboardLoad {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return DashboardLoad::Failed {
            symbol: String::new(),
            message: "No company selected".to_string(),
        };
    }

    info!("Loading statements for {}", symbol);
    let outcome = backend
        .fetch(symbol)
        .await
        .and_then(parse_statement_response);

    match outcome {
        Ok(bundle) => DashboardLoad::Ready {
            symbol: symbol.to_string(),
            sections: build_sections(&bundle),
        },
        Err(e) => {
            warn!("Statements for {} unavailable: {}", symbol, e);
            DashboardLoad::Failed {
                symbol: symbol.to_string(),
                message: e.user_message(),
            }
        }
    }
}
