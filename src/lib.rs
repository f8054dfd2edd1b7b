//! # StockPro
//!
//! Core logic behind a financial dashboard for listed companies: debounced
//! company search, statement time series, derived metrics, chart
//! specifications, and the hand-off of an uploaded PDF report to an
//! analysis service and an embedded viewer.
//!
//! ## Core Concepts
//!
//! - **Statement rows** arrive in wide format (one column per period) and are
//!   reshaped into chronological [`TimeSeriesPoint`] series.
//! - **Metrics** pair a series with a chart kind and color; windows select the
//!   most recent periods.
//! - **Balance sheets** for a company page are quarterly reports grouped
//!   into assets, liabilities and equity, selectable by period.
//! - **Documents** are owned by the viewer through a scoped [`ObjectUrl`]
//!   that is released on delete, navigation and drop.
//!
//! ## Example
//!
//! ```rust,ignore
//! use stockpro::*;
//!
//! let bundle: StatementBundle = serde_json::from_str(payload)?;
//! let revenue = transform_statement(&bundle.profit_loss, "Sales+");
//! let summary = SeriesSummary::of(&TimeWindow::OneYear.apply(&revenue));
//! println!("latest {} growth {:.2}%", summary.latest, summary.growth_rate);
//! ```

pub mod balance_sheet;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod error;
pub mod handoff;
pub mod insights;
pub mod metrics;
pub mod schema;
pub mod search;
pub mod session;
pub mod statements;
pub mod transform;
pub mod utils;
pub mod viewer;

#[cfg(feature = "remote")]
pub mod remote;

pub use balance_sheet::{
    load_balance_sheet, parse_balance_sheet_response, BalanceSheetBackend, BalanceSheetGroup,
    BalanceSheetLoad, BalanceSheetReport, BalanceSheetView, GroupView, LineItem, PeriodOption,
};
pub use catalog::{build_sections, comparison_metrics, DashboardSection, MetricDescriptor, Statement};
pub use chart::{render, BarDirection, ChartSpec, Layer, MetricRowView, ViewMode};
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use handoff::{
    validate_upload, DocumentState, DocumentViewer, MemorySessionStorage, ObjectUrl, OpenOutcome,
    ResourceRegistry, SessionStorage,
};
pub use insights::{AnalysisEvent, InsightBackend, InsightPanel, InsightSession};
pub use metrics::{average, combine_by_date, growth_rate, latest, ratio_by_date, SeriesSummary, TimeWindow};
pub use schema::*;
pub use search::{normalize_search_response, DebouncedSearch, SearchBackend, SearchState};
pub use session::{guard, Route, RouteDecision, SessionContext, User};
pub use statements::{load_company, parse_statement_response, DashboardLoad, StatementBackend};
pub use transform::transform_statement;
pub use utils::*;
pub use viewer::{ViewerChannel, ViewerCommand};
