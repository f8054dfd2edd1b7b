use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::schema::{RawSearchEntry, SearchResult};
use crate::utils::symbol_from_company_path;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch results. Please try again.";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response format";
pub const NO_MATCHES_MESSAGE: &str = "No stocks found matching your search";

/// Source of raw search payloads (`[{id, url, name}, ...]`).
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<serde_json::Value>;
}

/// Drops placeholder entries (null `id`) and derives each symbol from its
/// `/company/<symbol>/` path.
pub fn normalize_search_response(payload: serde_json::Value) -> Result<Vec<SearchResult>> {
    if !payload.is_array() {
        return Err(DashboardError::DataShape(
            "search response is not an array".to_string(),
        ));
    }

    let entries: Vec<RawSearchEntry> = serde_json::from_value(payload)
        .map_err(|e| DashboardError::DataShape(format!("search entry: {}", e)))?;

    entries
        .into_iter()
        .filter_map(|entry| entry.id.map(|id| (id, entry)))
        .map(|(id, entry)| {
            let url = entry.url.ok_or_else(|| {
                DashboardError::DataShape(format!("search entry {} has no url", id))
            })?;
            Ok(SearchResult {
                symbol: symbol_from_company_path(&url),
                name: entry.name.unwrap_or_default(),
                id,
                url,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<String>,
    /// Informational text, e.g. when a search matched nothing.
    pub notice: Option<String>,
}

/// Accepts keystrokes and issues at most one request per idle period.
///
/// Every accepted keystroke takes a new token. A response is published only
/// if its token is still the newest, so a slow earlier request can never
/// overwrite a later one.
pub struct DebouncedSearch<B: SearchBackend + 'static> {
    backend: Arc<B>,
    delay: Duration,
    min_query_len: usize,
    latest: Arc<AtomicU64>,
    timer: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<SearchState>>,
}

impl<B: SearchBackend + 'static> DebouncedSearch<B> {
    pub fn new(backend: B, config: &DashboardConfig) -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            backend: Arc::new(backend),
            delay: config.debounce,
            min_query_len: config.min_query_len,
            latest: Arc::new(AtomicU64::new(0)),
            timer: None,
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Must be called from within a Tokio runtime.
    pub fn input(&mut self, raw: &str) {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let query = raw.trim().to_string();
        if query.chars().count() < self.min_query_len {
            self.state.send_replace(SearchState {
                query,
                ..SearchState::default()
            });
            return;
        }

        let backend = Arc::clone(&self.backend);
        let latest = Arc::clone(&self.latest);
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != token {
                return;
            }

            state.send_modify(|s| {
                s.query = query.clone();
                s.loading = true;
                s.error = None;
                s.notice = None;
            });

            // Detached: later keystrokes abort the timer only, never a request in flight.
            tokio::spawn(run_request(backend, latest, state, query, token));
        }));
    }
}

async fn run_request<B: SearchBackend + 'static>(
    backend: Arc<B>,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<SearchState>>,
    query: String,
    token: u64,
) {
    info!("Searching for '{}'", query);
    let outcome = backend
        .search(&query)
        .await
        .and_then(normalize_search_response);

    if latest.load(Ordering::SeqCst) != token {
        debug!("Dropping stale results for '{}'", query);
        return;
    }

    let next = match outcome {
        Ok(results) => SearchState {
            notice: results.is_empty().then(|| NO_MATCHES_MESSAGE.to_string()),
            query,
            results,
            loading: false,
            error: None,
        },
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            let message = match e {
                DashboardError::DataShape(_) | DashboardError::SerializationError(_) => {
                    INVALID_RESPONSE_MESSAGE
                }
                _ => FETCH_FAILED_MESSAGE,
            };
            SearchState {
                query,
                results: Vec::new(),
                loading: false,
                error: Some(message.to_string()),
                notice: None,
            }
        }
    };
    state.send_replace(next);
}

impl<B: SearchBackend + 'static> Drop for DebouncedSearch<B> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
