use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stockpro::*;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
struct FakeSearch {
    calls: Arc<Mutex<Vec<String>>>,
    delays: HashMap<String, Duration>,
    failing: Option<String>,
    malformed: Option<String>,
}

impl FakeSearch {
    fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, query: &str) -> Result<serde_json::Value> {
        self.calls.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.as_deref() == Some(query) {
            return Err(DashboardError::Network("status 503".to_string()));
        }
        if self.malformed.as_deref() == Some(query) {
            return Ok(json!({"results": []}));
        }
        Ok(json!([
            {"id": null, "url": "/full-text-search/", "name": "Search everywhere"},
            {"id": 42, "url": format!("/company/{}/", query), "name": format!("{} Ltd", query)}
        ]))
    }
}

async fn settled(rx: &mut tokio::sync::watch::Receiver<SearchState>, query: &str) -> SearchState {
    rx.wait_for(|s| s.query == query && !s.loading && (s.error.is_some() || s.notice.is_some() || !s.results.is_empty()))
        .await
        .unwrap()
        .clone()
}

#[tokio::test(start_paused = true)]
async fn test_debounce_issues_single_request_for_last_query() {
    let backend = FakeSearch::default();
    let mut search = DebouncedSearch::new(backend.clone(), &DashboardConfig::default());
    let mut rx = search.subscribe();

    search.input("TAT");
    tokio::time::sleep(Duration::from_millis(200)).await;
    search.input("TATA");

    let state = settled(&mut rx, "TATA").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(backend.calls(), vec!["TATA".to_string()]);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].symbol, "TATA");
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_short_queries_never_hit_the_network() {
    let backend = FakeSearch::default();
    let mut search = DebouncedSearch::new(backend.clone(), &DashboardConfig::default());

    for query in ["", "T", "  T  ", " ", "é"] {
        search.input(query);
        let state = search.state();
        assert!(state.results.is_empty());
        assert!(!state.loading);
    }
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_earlier_request_cannot_overwrite_later_one() {
    let backend = FakeSearch::default().with_delay("INFY", Duration::from_secs(3));
    let mut search = DebouncedSearch::new(backend.clone(), &DashboardConfig::default());
    let mut rx = search.subscribe();

    search.input("INFY");
    // Let the first request go out, then type again while it is in flight.
    tokio::time::sleep(Duration::from_millis(600)).await;
    search.input("WIPRO");

    let state = settled(&mut rx, "WIPRO").await;
    assert_eq!(state.results[0].symbol, "WIPRO");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.calls(), vec!["INFY".to_string(), "WIPRO".to_string()]);
    assert_eq!(search.state().query, "WIPRO");
    assert_eq!(search.state().results[0].symbol, "WIPRO");
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_clears_results() {
    let backend = FakeSearch {
        failing: Some("HDFCX".to_string()),
        ..FakeSearch::default()
    };
    let mut search = DebouncedSearch::new(backend.clone(), &DashboardConfig::default());
    let mut rx = search.subscribe();

    search.input("HDFC");
    assert_eq!(settled(&mut rx, "HDFC").await.results.len(), 1);

    search.input("HDFCX");
    let state = settled(&mut rx, "HDFCX").await;

    assert!(state.results.is_empty());
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to fetch results. Please try again.")
    );
    assert_eq!(backend.calls(), vec!["HDFC".to_string(), "HDFCX".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_search_payload_clears_results() {
    let backend = FakeSearch {
        malformed: Some("RELI".to_string()),
        ..FakeSearch::default()
    };
    let mut search = DebouncedSearch::new(backend.clone(), &DashboardConfig::default());
    let mut rx = search.subscribe();

    search.input("REL");
    assert_eq!(settled(&mut rx, "REL").await.results.len(), 1);

    search.input("RELI");
    let state = settled(&mut rx, "RELI").await;

    assert!(state.results.is_empty());
    assert_eq!(state.error.as_deref(), Some("Invalid response format"));
    assert!(state.notice.is_none());
}

#[test]
fn test_statement_row_example() -> anyhow::Result<()> {
    let rows: Vec<StatementRow> = serde_json::from_value(json!([
        {"row_name": "Sales+", "Mar 2021": "1,234", "Mar 2022": "2,345", "TTM": "9,999"}
    ]))?;

    assert_eq!(
        transform_statement(&rows, "Sales+"),
        vec![
            TimeSeriesPoint::new("Mar 2021", 1234.0),
            TimeSeriesPoint::new("Mar 2022", 2345.0),
        ]
    );
    Ok(())
}

struct FakeStatements {
    payload: Option<serde_json::Value>,
}

#[async_trait]
impl StatementBackend for FakeStatements {
    async fn fetch(&self, _symbol: &str) -> Result<serde_json::Value> {
        self.payload
            .clone()
            .ok_or_else(|| DashboardError::Network("HTTP error! status: 500".to_string()))
    }
}

fn statement_payload() -> serde_json::Value {
    json!({
        "data": {
            "profit_loss": [
                {"row_name": "Sales+", "Mar 2021": "10,000", "Mar 2022": "12,000", "Mar 2023": "15,000", "TTM": "16,000"},
                {"row_name": "Expenses+", "Mar 2021": "8,000", "Mar 2022": "9,500", "Mar 2023": "11,000"},
                {"row_name": "Operating Profit", "Mar 2021": "2,000", "Mar 2022": "2,500", "Mar 2023": "4,000"},
                {"row_name": "Net Profit+", "Mar 2021": "1,200", "Mar 2022": "-300", "Mar 2023": "2,600"},
                {"row_name": "Profit before tax", "Mar 2021": "1,500", "Mar 2022": "-200", "Mar 2023": "3,100"}
            ],
            "balance_sheet": [
                {"row_name": "Total Assets", "Mar 2021": "40,000", "Mar 2022": "48,000", "Mar 2023": "50,000"},
                {"row_name": "Total Liabilities", "Mar 2021": "40,000", "Mar 2022": "48,000", "Mar 2023": "50,000"}
            ],
            "cash_flow": [
                {"row_name": "Net Cash Flow", "Mar 2021": "300", "Mar 2022": "-150", "Mar 2023": "420"}
            ]
        }
    })
}

#[tokio::test]
async fn test_company_dashboard_end_to_end() {
    let backend = FakeStatements {
        payload: Some(statement_payload()),
    };

    let DashboardLoad::Ready { symbol, sections } = load_company(&backend, "TCS").await else {
        panic!("dashboard should load");
    };
    assert_eq!(symbol, "TCS");

    let revenue = &sections[0].metrics[0];
    let row = MetricRowView::build(revenue, TimeWindow::OneYear, ViewMode::Collapsed);
    assert_eq!(row.summary.latest, 15000.0);
    assert!((row.summary.growth_rate - 25.0).abs() < 1e-9);
    assert!((row.summary.average - 12333.333333).abs() < 1e-3);

    let net_profit = &sections[0].metrics[1];
    let chart = render(net_profit, TimeWindow::All, ViewMode::Expanded);
    let Layer::Bar { bars, .. } = &chart.layers[0] else {
        panic!("net profit renders as bars");
    };
    assert_eq!(bars[1].fill, ColorToken::Loss);
    assert_eq!(bars[1].magnitude, 300.0);

    let utilization = sections[3]
        .metrics
        .iter()
        .find(|m| m.title == "Asset Utilization")
        .unwrap();
    let ratios = utilization.data.primary_series();
    assert_eq!(ratios.len(), 3);
    assert!((ratios[2].value - 30.0).abs() < 1e-9);

    let spec_json = serde_json::to_value(&chart).unwrap();
    assert_eq!(spec_json["layers"][0]["layer"], "bar");
}

#[tokio::test]
async fn test_company_dashboard_failure_is_local() {
    let backend = FakeStatements { payload: None };
    let load = load_company(&backend, "TCS").await;
    assert!(matches!(load, DashboardLoad::Failed { ref message, .. } if message.contains("Failed to fetch")));

    let malformed = FakeStatements {
        payload: Some(json!({"rows": []})),
    };
    let load = load_company(&malformed, "TCS").await;
    assert!(matches!(load, DashboardLoad::Failed { ref message, .. } if message == "No data available"));
}

#[derive(Clone)]
struct FakeAnalysis {
    healthy: bool,
    delay: Duration,
    submissions: Arc<Mutex<usize>>,
}

impl FakeAnalysis {
    fn new(healthy: bool, delay: Duration) -> Self {
        Self {
            healthy,
            delay,
            submissions: Arc::new(Mutex::new(0)),
        }
    }

    fn submissions(&self) -> usize {
        *self.submissions.lock().unwrap()
    }
}

#[async_trait]
impl InsightBackend for FakeAnalysis {
    async fn health(&self) -> Result<bool> {
        Ok(self.healthy)
    }

    async fn analyze(&self, _document: &UploadedDocument) -> Result<serde_json::Value> {
        *self.submissions.lock().unwrap() += 1;
        tokio::time::sleep(self.delay).await;
        Ok(json!({
            "success": true,
            "totalPages": 24,
            "insights": {
                "financialHighlights": [
                    {"title": "Revenue", "value": "₹15,000 Cr", "page": 7, "keyword": "Revenue from operations"}
                ],
                "keyMetrics": [
                    {"title": "EBITDA margin", "value": "26%", "page": 9, "keyword": "EBITDA"}
                ],
                "futureOutlook": []
            }
        }))
    }
}

fn annual_report() -> UploadedDocument {
    UploadedDocument::new(
        "annual-report-2023.pdf",
        "application/pdf",
        b"%PDF-1.7 ...".to_vec(),
        1_700_000_000_000,
    )
}

#[tokio::test]
async fn test_upload_analyze_and_jump_to_insight() -> anyhow::Result<()> {
    let storage = MemorySessionStorage::new();
    let registry = ResourceRegistry::new();
    let mut viewer = DocumentViewer::new(storage.clone(), registry.clone());

    let outcome = viewer.open(Some(annual_report()))?;
    assert!(matches!(outcome, OpenOutcome::Viewing { ref url } if url.starts_with("blob:")));

    let backend = FakeAnalysis::new(true, Duration::from_millis(10));
    let session = InsightSession::new(backend.clone(), Duration::from_secs(60));
    let (tx, mut events) = mpsc::channel(8);

    let document = viewer
        .document()
        .ok_or_else(|| anyhow::anyhow!("viewer has no document"))?;
    let report = session.run(document, Some(tx)).await?;
    assert_eq!(report.total_pages, 24);
    assert_eq!(backend.submissions(), 1);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.first(), Some(&AnalysisEvent::CheckingHealth));
    assert!(matches!(seen.last(), Some(AnalysisEvent::Completed { insights: 2, total_pages: 24 })));

    let (mut channel, mut commands) = ViewerChannel::new();
    channel.set_total_pages(report.total_pages);
    channel.select_insight(&report.insights.key_metrics[0])?;
    assert_eq!(
        commands.recv().await,
        Some(ViewerCommand::JumpTo {
            page: 9,
            highlight: "EBITDA".to_string()
        })
    );

    assert_eq!(viewer.delete(), Route::Dashboard);
    assert_eq!(registry.live_count(), 0);
    assert!(storage.get_item(handoff::SESSION_KEY).is_none());
    Ok(())
}

#[tokio::test]
async fn test_unhealthy_service_fails_fast() {
    let backend = FakeAnalysis::new(false, Duration::ZERO);
    let session = InsightSession::new(backend.clone(), Duration::from_secs(60));

    let result = session.run(&annual_report(), None).await;
    assert_eq!(backend.submissions(), 0);

    let panel = InsightPanel::from_result(result);
    assert!(matches!(panel, InsightPanel::Failed { retryable: true, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_analysis_timeout_is_distinct() {
    let backend = FakeAnalysis::new(true, Duration::from_secs(120));
    let session = InsightSession::new(backend, Duration::from_secs(60)).without_health_check();

    let err = session.run(&annual_report(), None).await.unwrap_err();
    assert!(matches!(err, DashboardError::Timeout(60)));
}

#[tokio::test]
async fn test_analysis_failure_leaves_viewer_intact() {
    let registry = ResourceRegistry::new();
    let mut viewer = DocumentViewer::new(MemorySessionStorage::new(), registry.clone());
    viewer.accept_upload(annual_report()).unwrap();

    let session = InsightSession::new(FakeAnalysis::new(false, Duration::ZERO), Duration::from_secs(60));
    let panel = InsightPanel::from_result(session.run(viewer.document().unwrap(), None).await);

    assert!(matches!(panel, InsightPanel::Failed { .. }));
    assert!(viewer.object_url().is_some());
    assert_eq!(registry.live_count(), 1);
}

#[test]
fn test_txt_upload_rejected_without_navigation() {
    let mut viewer = DocumentViewer::new(MemorySessionStorage::new(), ResourceRegistry::new());
    let txt = UploadedDocument::new("notes.txt", "text/plain", b"plain".to_vec(), 0);

    assert!(matches!(
        viewer.open(Some(txt)),
        Err(DashboardError::Validation(_))
    ));
    assert!(matches!(viewer.state(), DocumentState::Empty));
}

#[test]
fn test_route_guard_with_session() {
    let mut session = SessionContext::init();
    session.on_auth_state_changed(Some(User {
        uid: "u1".to_string(),
        email: "investor@example.com".to_string(),
        display_name: None,
        photo_url: None,
    }));

    let route = Route::parse("/company/TCS").unwrap();
    assert_eq!(guard(route.clone(), &session), RouteDecision::Allow(route));
    assert_eq!(session.user().unwrap().display_name(), "investor");
}

struct FakeBalanceSheets {
    payload: serde_json::Value,
    requested: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BalanceSheetBackend for FakeBalanceSheets {
    async fn fetch_quarterly(&self, symbol: &str) -> Result<serde_json::Value> {
        self.requested.lock().unwrap().push(symbol.to_string());
        Ok(self.payload.clone())
    }
}

#[tokio::test]
async fn test_company_page_balance_sheet() -> anyhow::Result<()> {
    let Some(Route::Company { symbol }) = Route::parse("/company/MSFT") else {
        anyhow::bail!("company route did not parse");
    };

    let backend = FakeBalanceSheets {
        payload: json!([
            {"date": "2024-03-31", "totalAssets": 484275000000u64, "totalLiabilities": 231123000000u64,
             "totalStockholdersEquity": 253152000000u64, "commonStock": 99193000000u64},
            {"date": "2023-12-31", "totalAssets": 470558000000u64}
        ]),
        requested: Arc::new(Mutex::new(Vec::new())),
    };

    let BalanceSheetLoad::Ready { view, .. } = load_balance_sheet(&backend, &symbol).await else {
        anyhow::bail!("balance sheet should load");
    };
    assert_eq!(backend.requested.lock().unwrap().as_slice(), ["MSFT".to_string()]);

    let mut view = view;
    let groups = view.groups();
    let equity = &groups[2];
    assert_eq!(equity.headline[0].display, "$253.2B");
    assert_eq!(equity.details[0].display, "$99.2B");

    view.select_period(1)?;
    view.toggle(BalanceSheetGroup::Equity);
    let groups = view.groups();
    assert_eq!(groups[0].headline[0].display, "$470.6B");
    assert!(!groups[2].expanded);

    let failing = FakeBalanceSheets {
        payload: json!({"Error Message": "Limit Reach"}),
        requested: Arc::new(Mutex::new(Vec::new())),
    };
    let load = load_balance_sheet(&failing, "MSFT").await;
    assert!(matches!(load, BalanceSheetLoad::Failed { ref message, .. } if message == "No data available"));
    Ok(())
}
