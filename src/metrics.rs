use crate::schema::{CombinedSeriesPoint, TimeSeriesPoint};
use crate::transform::sort_chronologically;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeWindow {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl TimeWindow {
    pub const PRESETS: [TimeWindow; 5] = [
        TimeWindow::OneMonth,
        TimeWindow::ThreeMonths,
        TimeWindow::SixMonths,
        TimeWindow::OneYear,
        TimeWindow::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::OneMonth => "1M",
            TimeWindow::ThreeMonths => "3M",
            TimeWindow::SixMonths => "6M",
            TimeWindow::OneYear => "1Y",
            TimeWindow::All => "ALL",
        }
    }

    /// Unknown labels select the default one-year window.
    pub fn from_label(label: &str) -> Self {
        Self::PRESETS
            .into_iter()
            .find(|w| w.label() == label)
            .unwrap_or_default()
    }

    /// Number of points kept, `None` for the whole series.
    pub fn points(self) -> Option<usize> {
        match self {
            TimeWindow::OneMonth => Some(1),
            TimeWindow::ThreeMonths => Some(3),
            TimeWindow::SixMonths => Some(6),
            TimeWindow::OneYear => Some(12),
            TimeWindow::All => None,
        }
    }

    /// Keeps the most recent points of a series, after ordering it by period.
    pub fn apply(self, series: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
        let mut sorted = series.to_vec();
        sort_chronologically(&mut sorted);
        trailing(sorted, self.points())
    }

    pub fn apply_combined(self, series: &[CombinedSeriesPoint]) -> Vec<CombinedSeriesPoint> {
        let mut sorted = series.to_vec();
        sorted.sort_by_key(|p| crate::utils::parse_period_label(&p.date));
        trailing(sorted, self.points())
    }
}

fn trailing<T>(mut sorted: Vec<T>, keep: Option<usize>) -> Vec<T> {
    match keep {
        Some(n) if sorted.len() > n => sorted.split_off(sorted.len() - n),
        _ => sorted,
    }
}

pub fn latest(series: &[TimeSeriesPoint]) -> f64 {
    series.last().map(|p| p.value).unwrap_or(0.0)
}

pub fn average(series: &[TimeSeriesPoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|p| p.value).sum::<f64>() / series.len() as f64
}

/// Signed percentage change between the last two points.
///
/// Zero when fewer than two points exist or the previous value is zero.
pub fn growth_rate(series: &[TimeSeriesPoint]) -> f64 {
    let [.., previous, last] = series else {
        return 0.0;
    };

    if previous.value == 0.0 {
        return 0.0;
    }
    (last.value - previous.value) / previous.value * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub latest: f64,
    pub average: f64,
    pub growth_rate: f64,
}

impl SeriesSummary {
    pub fn of(series: &[TimeSeriesPoint]) -> Self {
        Self {
            latest: latest(series),
            average: average(series),
            growth_rate: growth_rate(series),
        }
    }

    pub fn is_growing(&self) -> bool {
        self.growth_rate >= 0.0
    }
}

/// `numerator / denominator * 100` for each period label present in both
/// series. Labels found in only one series, zero inputs and non-finite
/// results are dropped. Output follows the denominator's order.
pub fn ratio_by_date(
    numerator: &[TimeSeriesPoint],
    denominator: &[TimeSeriesPoint],
) -> Vec<TimeSeriesPoint> {
    let numerators: HashMap<&str, f64> = numerator
        .iter()
        .map(|p| (p.date.as_str(), p.value))
        .collect();

    denominator
        .iter()
        .filter(|d| d.value != 0.0)
        .filter_map(|d| {
            let n = *numerators.get(d.date.as_str())?;
            if n == 0.0 {
                return None;
            }
            let ratio = n / d.value * 100.0;
            ratio
                .is_finite()
                .then(|| TimeSeriesPoint::new(d.date.clone(), ratio))
        })
        .collect()
}

/// Pairs two series on matching period labels, following the first
/// series' order. Periods where both values are zero are dropped.
pub fn combine_by_date(
    first: &[TimeSeriesPoint],
    second: &[TimeSeriesPoint],
) -> Vec<CombinedSeriesPoint> {
    let seconds: HashMap<&str, f64> = second
        .iter()
        .map(|p| (p.date.as_str(), p.value))
        .collect();

    first
        .iter()
        .filter_map(|p| {
            let metric2 = *seconds.get(p.date.as_str())?;
            Some(CombinedSeriesPoint {
                date: p.date.clone(),
                metric1: p.value,
                metric2,
            })
        })
        .filter(|p| p.metric1 != 0.0 || p.metric2 != 0.0)
        .collect()
}
