use crate::metrics::{SeriesSummary, TimeWindow};
use crate::schema::{
    ChartKind, ColorToken, CombinedSeriesPoint, CustomRender, Metric, MetricData, TimeSeriesPoint,
};
use crate::utils::format_rupees;
use serde::{Deserialize, Serialize};

pub const COLLAPSED_HEIGHT: u32 = 50;
pub const EXPANDED_HEIGHT: u32 = 384;
/// Mini charts never show more than this many periods.
pub const MINI_CHART_POINTS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarDirection {
    Up,
    Down,
}

/// A bar drawn from the zero baseline. `magnitude` is always non-negative;
/// `direction` says which side of the baseline it sits on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSpec {
    pub date: String,
    pub value: f64,
    pub magnitude: f64,
    pub direction: BarDirection,
    pub fill: ColorToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapCell {
    pub name: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "lowercase")]
pub enum Layer {
    Bar {
        name: String,
        bars: Vec<BarSpec>,
    },
    Line {
        name: String,
        stroke: ColorToken,
        points: Vec<PointSpec>,
        markers: bool,
    },
    Area {
        name: String,
        fill: ColorToken,
        fill_opacity: f32,
        points: Vec<PointSpec>,
        markers: bool,
    },
    Radar {
        name: String,
        fill: ColorToken,
        points: Vec<PointSpec>,
    },
    Treemap {
        fill: ColorToken,
        cells: Vec<TreemapCell>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// The kind actually rendered, after any fallback.
    pub kind: ChartKind,
    pub view: ViewMode,
    pub height: u32,
    pub show_axes: bool,
    pub show_legend: bool,
    /// True when there is nothing to draw; renderers show "No data".
    pub empty: bool,
    pub layers: Vec<Layer>,
}

impl ChartSpec {
    fn empty(title: &str, kind: ChartKind, view: ViewMode) -> Self {
        let mut spec = Self::frame(title, kind, view);
        spec.empty = true;
        spec
    }

    fn frame(title: &str, kind: ChartKind, view: ViewMode) -> Self {
        let expanded = view == ViewMode::Expanded;
        Self {
            title: title.to_string(),
            kind,
            view,
            height: if expanded { EXPANDED_HEIGHT } else { COLLAPSED_HEIGHT },
            show_axes: expanded,
            show_legend: expanded,
            empty: false,
            layers: Vec::new(),
        }
    }
}

fn bars(series: &[TimeSeriesPoint], color: ColorToken) -> Vec<BarSpec> {
    series
        .iter()
        .map(|p| {
            let negative = p.value < 0.0;
            BarSpec {
                date: p.date.clone(),
                value: p.value,
                magnitude: p.value.abs(),
                direction: if negative { BarDirection::Down } else { BarDirection::Up },
                fill: if negative { ColorToken::Loss } else { color },
            }
        })
        .collect()
}

fn points(series: &[TimeSeriesPoint]) -> Vec<PointSpec> {
    series
        .iter()
        .map(|p| PointSpec {
            date: p.date.clone(),
            value: p.value,
        })
        .collect()
}

fn split_combined(series: &[CombinedSeriesPoint]) -> (Vec<TimeSeriesPoint>, Vec<TimeSeriesPoint>) {
    series
        .iter()
        .map(|p| {
            (
                TimeSeriesPoint::new(p.date.clone(), p.metric1),
                TimeSeriesPoint::new(p.date.clone(), p.metric2),
            )
        })
        .unzip()
}

fn line(name: &str, stroke: ColorToken, series: &[TimeSeriesPoint], markers: bool) -> Layer {
    Layer::Line {
        name: name.to_string(),
        stroke,
        points: points(series),
        markers,
    }
}

fn area(name: &str, fill: ColorToken, series: &[TimeSeriesPoint], markers: bool) -> Layer {
    Layer::Area {
        name: name.to_string(),
        fill,
        fill_opacity: 0.3,
        points: points(series),
        markers,
    }
}

fn bar(name: &str, color: ColorToken, series: &[TimeSeriesPoint]) -> Layer {
    Layer::Bar {
        name: name.to_string(),
        bars: bars(series, color),
    }
}

fn last_n<T: Clone>(items: Vec<T>, n: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(n);
    items.into_iter().skip(skip).collect()
}

/// Builds the chart for `metric` over `window`.
///
/// Collapsed views are mini charts of at most [`MINI_CHART_POINTS`] periods
/// without markers or axes. Radar and treemap kinds only render expanded;
/// their mini chart is a line. Unknown combinations fall back to bar+line.
pub fn render(metric: &Metric, window: TimeWindow, view: ViewMode) -> ChartSpec {
    let markers = view == ViewMode::Expanded;
    let title = metric.title.as_str();

    match &metric.data {
        MetricData::Combined(series) => {
            let mut windowed = window.apply_combined(series);
            if view == ViewMode::Collapsed {
                windowed = last_n(windowed, MINI_CHART_POINTS);
            }
            if windowed.is_empty() {
                return ChartSpec::empty(title, ChartKind::Custom, view);
            }

            let (first, second) = split_combined(&windowed);
            let mut spec = ChartSpec::frame(title, ChartKind::Custom, view);
            spec.layers = match metric.custom {
                Some(CustomRender::BarWithLine) => vec![
                    bar("metric1", ColorToken::Primary, &first),
                    line("metric2", ColorToken::Success, &second, markers),
                ],
                _ => vec![
                    area("metric1", ColorToken::Success, &first, markers),
                    area("metric2", ColorToken::Danger, &second, markers),
                ],
            };
            spec
        }
        MetricData::Single(series) => {
            let mut windowed = window.apply(series);
            if view == ViewMode::Collapsed {
                windowed = last_n(windowed, MINI_CHART_POINTS);
            }

            let kind = resolve_kind(metric, view);
            if windowed.is_empty() {
                return ChartSpec::empty(title, kind, view);
            }

            let mut spec = ChartSpec::frame(title, kind, view);
            spec.layers = match (kind, metric.custom) {
                (ChartKind::Line, _) => vec![line(title, metric.color, &windowed, markers)],
                (ChartKind::Bar, _) => vec![bar(title, metric.color, &windowed)],
                (ChartKind::Area, _) => vec![area(title, metric.color, &windowed, markers)],
                (ChartKind::Radar, _) => vec![Layer::Radar {
                    name: title.to_string(),
                    fill: metric.color,
                    points: points(&windowed),
                }],
                (ChartKind::Treemap, _) => vec![Layer::Treemap {
                    fill: metric.color,
                    cells: windowed
                        .iter()
                        .map(|p| TreemapCell {
                            name: p.date.clone(),
                            size: p.value,
                        })
                        .collect(),
                }],
                (ChartKind::Custom, Some(CustomRender::RatioWithTrend)) => vec![
                    bar("Asset Turnover Ratio", metric.color, &windowed),
                    line("Trend", metric.color, &windowed, markers),
                ],
                _ => vec![
                    bar(title, metric.color, &windowed),
                    line(&format!("{} Trend", title), metric.color, &windowed, markers),
                ],
            };
            spec
        }
    }
}

fn resolve_kind(metric: &Metric, view: ViewMode) -> ChartKind {
    match (metric.chart_kind, view) {
        (ChartKind::Radar | ChartKind::Treemap, ViewMode::Collapsed) => ChartKind::Line,
        (ChartKind::Custom, _) if metric.custom != Some(CustomRender::RatioWithTrend) => {
            ChartKind::Composed
        }
        (kind, _) => kind,
    }
}

pub fn tooltip_label(series_name: &str, value: f64) -> String {
    format!("{}: {}", series_name, format_rupees(value))
}

/// One row of a metrics list: headline numbers plus the chart for the
/// current view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRowView {
    pub title: String,
    pub summary: SeriesSummary,
    pub growing: bool,
    pub window: TimeWindow,
    pub chart: ChartSpec,
}

impl MetricRowView {
    pub fn build(metric: &Metric, window: TimeWindow, view: ViewMode) -> Self {
        let windowed = window.apply(&metric.data.primary_series());
        let summary = SeriesSummary::of(&windowed);
        Self {
            title: metric.title.clone(),
            growing: summary.is_growing(),
            summary,
            window,
            chart: render(metric, window, view),
        }
    }
}
