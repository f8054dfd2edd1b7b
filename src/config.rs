use crate::error::{DashboardError, Result};
use std::time::Duration;

pub const DEFAULT_SEARCH_URL: &str = "https://www.screener.in/api/company/search/";
pub const DEFAULT_STATEMENT_URL: &str = "https://graphhplz.onrender.com/api/stock-data";
pub const DEFAULT_BALANCE_SHEET_URL: &str =
    "https://financialmodelingprep.com/api/v3/balance-sheet-statement";
pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub search_url: String,
    pub statement_url: String,
    pub balance_sheet_url: String,
    /// Sent as `apikey` on balance-sheet requests when set.
    pub balance_sheet_api_key: Option<String>,
    pub analysis_url: String,
    pub debounce: Duration,
    pub min_query_len: usize,
    pub analysis_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            statement_url: DEFAULT_STATEMENT_URL.to_string(),
            balance_sheet_url: DEFAULT_BALANCE_SHEET_URL.to_string(),
            balance_sheet_api_key: None,
            analysis_url: DEFAULT_ANALYSIS_URL.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    /// Loads `.env` if present, then overrides defaults from `STOCKPRO_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("STOCKPRO_SEARCH_URL") {
            config.search_url = url;
        }
        if let Some(url) = lookup("STOCKPRO_STATEMENT_URL") {
            config.statement_url = url;
        }
        if let Some(url) = lookup("STOCKPRO_BALANCE_SHEET_URL") {
            config.balance_sheet_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("STOCKPRO_BALANCE_SHEET_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.balance_sheet_api_key = Some(key);
        }
        if let Some(url) = lookup("STOCKPRO_ANALYSIS_URL") {
            config.analysis_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = lookup("STOCKPRO_DEBOUNCE_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                DashboardError::Config(format!("STOCKPRO_DEBOUNCE_MS is not a number: {}", ms))
            })?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = lookup("STOCKPRO_ANALYSIS_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                DashboardError::Config(format!(
                    "STOCKPRO_ANALYSIS_TIMEOUT_SECS is not a number: {}",
                    secs
                ))
            })?;
            if secs == 0 {
                return Err(DashboardError::Config(
                    "STOCKPRO_ANALYSIS_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.analysis_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
