use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Key under which statement payloads carry the line-item name.
pub const ROW_NAME_KEY: &str = "row_name";

/// Some payloads put the line-item name under an unnamed column instead.
pub const UNNAMED_ROW_KEY: &str = "";

/// A company match from the search endpoint, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    pub id: u64,
    pub url: String,
}

/// Raw entry as returned by the search endpoint. A null `id` marks the
/// "search everywhere" placeholder.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchEntry {
    pub id: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One line item of a financial statement in wide format: period label to
/// locale-formatted value, plus the row-name key. Cells keep the payload's
/// column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementRow {
    pub cells: serde_json::Map<String, serde_json::Value>,
}

impl StatementRow {
    pub fn name(&self) -> Option<&str> {
        self.cells
            .get(ROW_NAME_KEY)
            .or_else(|| self.cells.get(UNNAMED_ROW_KEY))
            .and_then(|v| v.as_str())
    }

    pub fn is_name_key(key: &str) -> bool {
        key == ROW_NAME_KEY || key == UNNAMED_ROW_KEY
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for StatementRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The three statements for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementBundle {
    #[serde(default)]
    pub profit_loss: Vec<StatementRow>,
    #[serde(default)]
    pub balance_sheet: Vec<StatementRow>,
    #[serde(default)]
    pub cash_flow: Vec<StatementRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// Two metrics sharing a period label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSeriesPoint {
    pub date: String,
    pub metric1: f64,
    pub metric2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricData {
    Single(Vec<TimeSeriesPoint>),
    Combined(Vec<CombinedSeriesPoint>),
}

impl MetricData {
    pub fn len(&self) -> usize {
        match self {
            MetricData::Single(points) => points.len(),
            MetricData::Combined(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primary value per point: `value` for single series, `metric1` for combined ones.
    pub fn primary_series(&self) -> Vec<TimeSeriesPoint> {
        match self {
            MetricData::Single(points) => points.clone(),
            MetricData::Combined(points) => points
                .iter()
                .map(|p| TimeSeriesPoint::new(p.date.clone(), p.metric1))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    Radar,
    Treemap,
    Composed,
    Custom,
}

impl ChartKind {
    /// Unrecognized kinds fall back to the composed bar+line rendering.
    pub fn parse(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "line" => ChartKind::Line,
            "bar" => ChartKind::Bar,
            "area" => ChartKind::Area,
            "radar" => ChartKind::Radar,
            "treemap" => ChartKind::Treemap,
            "custom" => ChartKind::Custom,
            _ => ChartKind::Composed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Primary,
    Secondary,
    Success,
    Warning,
    Danger,
    Purple,
    Cyan,
    Pink,
    /// Fill for negative bars.
    Loss,
}

impl ColorToken {
    pub fn hex(self) -> &'static str {
        match self {
            ColorToken::Loss => "#ef4444",
            _ => "#9cbbff",
        }
    }
}

/// How a combined metric is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomRender {
    BarWithLine,
    DualArea,
    RatioWithTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub title: String,
    pub data: MetricData,
    pub chart_kind: ChartKind,
    pub color: ColorToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomRender>,
}

/// A PDF handed from the upload surface to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    pub name: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
        last_modified: i64,
    ) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            last_modified,
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// What survives a page reload: the document name and when it was opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightItem {
    #[schemars(description = "Short label for the insight, e.g. 'Revenue Growth'")]
    pub title: String,

    #[schemars(description = "The figure or statement extracted from the document")]
    pub value: String,

    #[schemars(description = "1-based page number where the insight was found")]
    pub page: u32,

    #[schemars(description = "Word or phrase to highlight on that page")]
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightGroups {
    #[schemars(description = "Headline results: revenue, profit, margins")]
    pub financial_highlights: Vec<InsightItem>,

    #[schemars(description = "Ratios and operating metrics")]
    pub key_metrics: Vec<InsightItem>,

    #[schemars(description = "Guidance and forward-looking statements")]
    pub future_outlook: Vec<InsightItem>,
}

impl InsightGroups {
    pub fn groups(&self) -> [(&'static str, &[InsightItem]); 3] {
        [
            ("Financial Highlights", &self.financial_highlights),
            ("Key Metrics", &self.key_metrics),
            ("Future Outlook", &self.future_outlook),
        ]
    }

    pub fn len(&self) -> usize {
        self.financial_highlights.len() + self.key_metrics.len() + self.future_outlook.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Response of the PDF analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[schemars(description = "Whether the analysis completed")]
    pub success: bool,

    #[schemars(description = "Insights grouped by theme")]
    pub insights: InsightGroups,

    #[schemars(description = "Number of pages in the analysed document")]
    pub total_pages: u32,
}

impl AnalysisReport {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
