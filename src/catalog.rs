use crate::metrics::{combine_by_date, ratio_by_date};
use crate::schema::{
    ChartKind, ColorToken, CustomRender, Metric, MetricData, StatementBundle, StatementRow,
};
use crate::transform::transform_statement;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    ProfitLoss,
    BalanceSheet,
    CashFlow,
}

/// A single-series metric read straight from one statement row.
#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub title: &'static str,
    pub statement: Statement,
    pub row_name: &'static str,
    pub chart_kind: ChartKind,
    pub color: ColorToken,
}

pub const PROFIT_LOSS_METRICS: [MetricDescriptor; 4] = [
    MetricDescriptor {
        title: "Revenue",
        statement: Statement::ProfitLoss,
        row_name: "Sales+",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Primary,
    },
    MetricDescriptor {
        title: "Net Profit",
        statement: Statement::ProfitLoss,
        row_name: "Net Profit+",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Success,
    },
    MetricDescriptor {
        title: "Operating Profit",
        statement: Statement::ProfitLoss,
        row_name: "Operating Profit",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Warning,
    },
    MetricDescriptor {
        title: "Profit Before Tax",
        statement: Statement::ProfitLoss,
        row_name: "Profit before tax",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Warning,
    },
];

pub const BALANCE_SHEET_METRICS: [MetricDescriptor; 4] = [
    MetricDescriptor {
        title: "Total Assets",
        statement: Statement::BalanceSheet,
        row_name: "Total Assets",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Primary,
    },
    MetricDescriptor {
        title: "Investments",
        statement: Statement::BalanceSheet,
        row_name: "Investments",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Success,
    },
    MetricDescriptor {
        title: "Total Liabilities",
        statement: Statement::BalanceSheet,
        row_name: "Total Liabilities",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Danger,
    },
    MetricDescriptor {
        title: "Fixed Assets Growth",
        statement: Statement::BalanceSheet,
        row_name: "Fixed Assets+",
        chart_kind: ChartKind::Composed,
        color: ColorToken::Pink,
    },
];

pub const CASH_FLOW_METRICS: [MetricDescriptor; 4] = [
    MetricDescriptor {
        title: "Operating Cash Flow",
        statement: Statement::CashFlow,
        row_name: "Cash from Operating Activity+",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Success,
    },
    MetricDescriptor {
        title: "Investing Cash Flow",
        statement: Statement::CashFlow,
        row_name: "Cash from Investing Activity+",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Warning,
    },
    MetricDescriptor {
        title: "Financing Cash Flow",
        statement: Statement::CashFlow,
        row_name: "Cash from Financing Activity+",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Purple,
    },
    MetricDescriptor {
        title: "Net Cash Flow",
        statement: Statement::CashFlow,
        row_name: "Net Cash Flow",
        chart_kind: ChartKind::Bar,
        color: ColorToken::Primary,
    },
];

pub const PROFITABILITY_COMPARISON: &str = "Profitability Comparison";
pub const REVENUE_VS_EXPENSES: &str = "Revenue vs Expenses";
pub const ASSET_UTILIZATION: &str = "Asset Utilization";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSection {
    pub title: String,
    pub metrics: Vec<Metric>,
}

impl StatementBundle {
    pub fn rows(&self, statement: Statement) -> &[StatementRow] {
        match statement {
            Statement::ProfitLoss => &self.profit_loss,
            Statement::BalanceSheet => &self.balance_sheet,
            Statement::CashFlow => &self.cash_flow,
        }
    }
}

impl MetricDescriptor {
    pub fn build(&self, bundle: &StatementBundle) -> Metric {
        Metric {
            title: self.title.to_string(),
            data: MetricData::Single(transform_statement(bundle.rows(self.statement), self.row_name)),
            chart_kind: self.chart_kind,
            color: self.color,
            custom: None,
        }
    }
}

fn section(title: &str, descriptors: &[MetricDescriptor], bundle: &StatementBundle) -> DashboardSection {
    let statement = descriptors.first().map(|d| d.statement);
    let metrics = match statement {
        Some(s) if !bundle.rows(s).is_empty() => descriptors.iter().map(|d| d.build(bundle)).collect(),
        _ => Vec::new(),
    };

    DashboardSection {
        title: title.to_string(),
        metrics,
    }
}

/// Two-series and ratio metrics; needs both profit & loss and balance sheet.
pub fn comparison_metrics(bundle: &StatementBundle) -> Vec<Metric> {
    if bundle.profit_loss.is_empty() || bundle.balance_sheet.is_empty() {
        return Vec::new();
    }

    let pl = |row: &str| transform_statement(&bundle.profit_loss, row);
    let sales = pl("Sales+");
    let assets = transform_statement(&bundle.balance_sheet, "Total Assets");

    vec![
        Metric {
            title: PROFITABILITY_COMPARISON.to_string(),
            data: MetricData::Combined(combine_by_date(&pl("Operating Profit"), &pl("Net Profit+"))),
            chart_kind: ChartKind::Custom,
            color: ColorToken::Primary,
            custom: Some(CustomRender::BarWithLine),
        },
        Metric {
            title: REVENUE_VS_EXPENSES.to_string(),
            data: MetricData::Combined(combine_by_date(&sales, &pl("Expenses+"))),
            chart_kind: ChartKind::Custom,
            color: ColorToken::Success,
            custom: Some(CustomRender::DualArea),
        },
        Metric {
            title: ASSET_UTILIZATION.to_string(),
            data: MetricData::Single(ratio_by_date(&sales, &assets)),
            chart_kind: ChartKind::Custom,
            color: ColorToken::Cyan,
            custom: Some(CustomRender::RatioWithTrend),
        },
    ]
}

/// All dashboard sections in display order.
pub fn build_sections(bundle: &StatementBundle) -> Vec<DashboardSection> {
    vec![
        section("Profit & Loss", &PROFIT_LOSS_METRICS, bundle),
        section("Balance Sheet", &BALANCE_SHEET_METRICS, bundle),
        section("Cash Flow", &CASH_FLOW_METRICS, bundle),
        DashboardSection {
            title: "Comparisons".to_string(),
            metrics: comparison_metrics(bundle),
        },
    ]
}
