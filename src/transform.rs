use crate::schema::{StatementRow, TimeSeriesPoint};
use crate::utils::{cell_value, parse_period_label};
use log::debug;

/// Columns whose label contains this marker hold trailing-twelve-month
/// aggregates and are not part of the period series.
pub const AGGREGATE_MARKER: &str = "TTM";

pub fn find_row<'a>(rows: &'a [StatementRow], row_name: &str) -> Option<&'a StatementRow> {
    rows.iter().find(|row| row.name() == Some(row_name))
}

/// Returns the series for `row_name`, or an empty series when no row matches.
///
/// Row lookup is exact and case-sensitive. Cells that fail to parse become 0.
/// Points are ordered by their parsed period label; labels that do not parse
/// as a date sort first, in column order.
pub fn transform_statement(rows: &[StatementRow], row_name: &str) -> Vec<TimeSeriesPoint> {
    let Some(row) = find_row(rows, row_name) else {
        debug!("Statement row '{}' not present", row_name);
        return Vec::new();
    };

    row_to_series(row)
}

pub fn row_to_series(row: &StatementRow) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = row
        .cells
        .iter()
        .filter(|(label, _)| !StatementRow::is_name_key(label) && !label.contains(AGGREGATE_MARKER))
        .map(|(label, cell)| TimeSeriesPoint::new(label.clone(), cell_value(Some(cell))))
        .collect();

    sort_chronologically(&mut points);
    points
}

pub fn sort_chronologically(points: &mut [TimeSeriesPoint]) {
    points.sort_by_key(|p| parse_period_label(&p.date));
}
