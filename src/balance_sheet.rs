use crate::error::{DashboardError, Result};
use crate::utils::{format_compact_currency, parse_period_label};
use async_trait::async_trait;
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shown for a line item the report does not carry.
pub const MISSING_VALUE: &str = "N/A";

/// One quarterly balance-sheet filing. Every figure is optional; providers
/// omit or null out items a company does not report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceSheetReport {
    #[schemars(description = "Period end date, e.g. '2024-03-31'")]
    pub date: String,
    pub symbol: Option<String>,
    pub reported_currency: Option<String>,

    pub total_assets: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub cash_and_cash_equivalents: Option<f64>,
    pub short_term_investments: Option<f64>,
    pub net_receivables: Option<f64>,
    pub inventory: Option<f64>,

    pub total_liabilities: Option<f64>,
    pub total_current_liabilities: Option<f64>,
    pub account_payables: Option<f64>,
    pub short_term_debt: Option<f64>,
    pub long_term_debt: Option<f64>,

    pub total_stockholders_equity: Option<f64>,
    pub common_stock: Option<f64>,
    pub retained_earnings: Option<f64>,
}

impl BalanceSheetReport {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BalanceSheetReport)
    }

    /// `Mar 31, 2024`; dates that do not parse are shown as received.
    pub fn period_label(&self) -> String {
        match parse_period_label(&self.date) {
            Some(date) => date.format("%b %-d, %Y").to_string(),
            None => self.date.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceSheetGroup {
    Assets,
    Liabilities,
    Equity,
}

impl BalanceSheetGroup {
    pub const ALL: [BalanceSheetGroup; 3] = [
        BalanceSheetGroup::Assets,
        BalanceSheetGroup::Liabilities,
        BalanceSheetGroup::Equity,
    ];

    pub fn title(self) -> &'static str {
        match self {
            BalanceSheetGroup::Assets => "Assets",
            BalanceSheetGroup::Liabilities => "Liabilities",
            BalanceSheetGroup::Equity => "Shareholders' Equity",
        }
    }

    /// Headline figures, then the detail lines below them.
    fn lines(self, r: &BalanceSheetReport) -> (Vec<LineItem>, Vec<LineItem>) {
        match self {
            BalanceSheetGroup::Assets => (
                vec![
                    LineItem::new("Total Assets", r.total_assets),
                    LineItem::new("Current Assets", r.total_current_assets),
                ],
                vec![
                    LineItem::new("Cash & Equivalents", r.cash_and_cash_equivalents),
                    LineItem::new("Short Term Investments", r.short_term_investments),
                    LineItem::new("Net Receivables", r.net_receivables),
                    LineItem::new("Inventory", r.inventory),
                ],
            ),
            BalanceSheetGroup::Liabilities => (
                vec![
                    LineItem::new("Total Liabilities", r.total_liabilities),
                    LineItem::new("Current Liabilities", r.total_current_liabilities),
                ],
                vec![
                    LineItem::new("Accounts Payable", r.account_payables),
                    LineItem::new("Short Term Debt", r.short_term_debt),
                    LineItem::new("Long Term Debt", r.long_term_debt),
                ],
            ),
            BalanceSheetGroup::Equity => (
                vec![LineItem::new(
                    "Total Shareholders' Equity",
                    r.total_stockholders_equity,
                )],
                vec![
                    LineItem::new("Common Stock", r.common_stock),
                    LineItem::new("Retained Earnings", r.retained_earnings),
                ],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub value: Option<f64>,
    pub display: String,
}

impl LineItem {
    fn new(label: &str, value: Option<f64>) -> Self {
        Self {
            label: label.to_string(),
            value,
            display: value
                .map(format_compact_currency)
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    pub group: BalanceSheetGroup,
    pub title: String,
    pub expanded: bool,
    pub headline: Vec<LineItem>,
    pub details: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOption {
    pub index: usize,
    pub label: String,
}

/// Quarterly balance sheets for one company with a selected period and
/// collapsible groups. All groups start expanded; reports keep the
/// provider's order (newest first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSheetView {
    reports: Vec<BalanceSheetReport>,
    selected: usize,
    collapsed: HashSet<BalanceSheetGroup>,
}

impl BalanceSheetView {
    pub fn new(reports: Vec<BalanceSheetReport>) -> Self {
        Self {
            reports,
            ..Self::default()
        }
    }

    pub fn periods(&self) -> Vec<PeriodOption> {
        self.reports
            .iter()
            .enumerate()
            .map(|(index, report)| PeriodOption {
                index,
                label: report.period_label(),
            })
            .collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn current(&self) -> Option<&BalanceSheetReport> {
        self.reports.get(self.selected)
    }

    /// Out-of-range indices are rejected and the selection is kept.
    pub fn select_period(&mut self, index: usize) -> Result<()> {
        if index >= self.reports.len() {
            return Err(DashboardError::Validation(format!(
                "Period {} is not available",
                index
            )));
        }
        self.selected = index;
        Ok(())
    }

    pub fn toggle(&mut self, group: BalanceSheetGroup) {
        if !self.collapsed.remove(&group) {
            self.collapsed.insert(group);
        }
    }

    pub fn is_expanded(&self, group: BalanceSheetGroup) -> bool {
        !self.collapsed.contains(&group)
    }

    /// Group breakdown for the selected period. With no reports every line
    /// shows [`MISSING_VALUE`].
    pub fn groups(&self) -> Vec<GroupView> {
        let empty = BalanceSheetReport::default();
        let report = self.current().unwrap_or(&empty);

        BalanceSheetGroup::ALL
            .into_iter()
            .map(|group| {
                let (headline, details) = group.lines(report);
                GroupView {
                    group,
                    title: group.title().to_string(),
                    expanded: self.is_expanded(group),
                    headline,
                    details,
                }
            })
            .collect()
    }
}

/// Source of the quarterly report array for a symbol.
#[async_trait]
pub trait BalanceSheetBackend: Send + Sync {
    async fn fetch_quarterly(&self, symbol: &str) -> Result<serde_json::Value>;
}

pub fn parse_balance_sheet_response(payload: serde_json::Value) -> Result<Vec<BalanceSheetReport>> {
    if !payload.is_array() {
        return Err(DashboardError::DataShape(
            "balance sheet response is not an array".to_string(),
        ));
    }

    serde_json::from_value(payload).map_err(|e| DashboardError::DataShape(e.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum BalanceSheetLoad {
    Ready {
        symbol: String,
        view: BalanceSheetView,
    },
    Failed {
        symbol: String,
        message: String,
    },
}

pub async fn load_balance_sheet<B: BalanceSheetBackend + ?Sized>(
    backend: &B,
    symbol: &str,
) -> BalanceSheetLoad {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return BalanceSheetLoad::Failed {
            symbol: String::new(),
            message: "No company selected".to_string(),
        };
    }

    info!("Loading quarterly balance sheets for {}", symbol);
    match backend
        .fetch_quarterly(symbol)
        .await
        .and_then(parse_balance_sheet_response)
    {
        Ok(reports) => BalanceSheetLoad::Ready {
            symbol: symbol.to_string(),
            view: BalanceSheetView::new(reports),
        },
        Err(e) => {
            warn!("Balance sheets for {} unavailable: {}", symbol, e);
            BalanceSheetLoad::Failed {
                symbol: symbol.to_string(),
                message: e.user_message(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reports() -> Vec<BalanceSheetReport> {
        parse_balance_sheet_response(json!([
            {
                "date": "2024-03-30",
                "symbol": "AAPL",
                "totalAssets": 337411000000u64,
                "totalCurrentAssets": 128416000000u64,
                "cashAndCashEquivalents": 32695000000u64,
                "inventory": 6232000000u64,
                "totalLiabilities": 263217000000u64,
                "accountPayables": 45753000000u64,
                "longTermDebt": 91831000000u64,
                "totalStockholdersEquity": 74194000000u64,
                "retainedEarnings": -4726000000i64,
                "shortTermInvestments": null
            },
            {
                "date": "2023-12-30",
                "totalAssets": 353514000000u64
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_groups_for_selected_period() {
        let view = BalanceSheetView::new(reports());
        let groups = view.groups();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].title, "Assets");
        assert_eq!(groups[0].headline[0].display, "$337.4B");
        assert_eq!(groups[0].details.len(), 4);
        assert_eq!(groups[0].details[1].display, MISSING_VALUE);
        assert_eq!(groups[1].details.len(), 3);
        assert_eq!(groups[1].details[2].display, "$91.8B");
        assert_eq!(groups[2].title, "Shareholders' Equity");
        assert_eq!(groups[2].details[1].display, "-$4.7B");
        assert!(groups.iter().all(|g| g.expanded));
    }

    #[test]
    fn test_select_period_by_index() {
        let mut view = BalanceSheetView::new(reports());
        let labels: Vec<String> = view.periods().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Mar 30, 2024", "Dec 30, 2023"]);

        view.select_period(1).unwrap();
        assert_eq!(view.groups()[0].headline[0].display, "$353.5B");
        assert_eq!(view.groups()[1].headline[0].display, MISSING_VALUE);

        assert!(matches!(view.select_period(2), Err(DashboardError::Validation(_))));
        assert_eq!(view.selected_index(), 1);
    }

    #[test]
    fn test_toggle_groups() {
        let mut view = BalanceSheetView::new(reports());
        view.toggle(BalanceSheetGroup::Liabilities);
        assert!(!view.is_expanded(BalanceSheetGroup::Liabilities));
        assert!(view.is_expanded(BalanceSheetGroup::Assets));

        view.toggle(BalanceSheetGroup::Liabilities);
        assert!(view.is_expanded(BalanceSheetGroup::Liabilities));
    }

    #[test]
    fn test_empty_view_shows_missing_values() {
        let view = BalanceSheetView::new(Vec::new());
        assert!(view.current().is_none());
        assert!(view
            .groups()
            .iter()
            .flat_map(|g| g.headline.iter().chain(g.details.iter()))
            .all(|line| line.display == MISSING_VALUE));
    }

    #[test]
    fn test_rejects_non_array_payload() {
        assert!(matches!(
            parse_balance_sheet_response(json!({"Error Message": "Invalid API KEY."})),
            Err(DashboardError::DataShape(_))
        ));
    }
}
