//! Normalized price comparison chart.

use plotly::common::Mode;
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

/// Default chart title.
pub const CHART_TITLE: &str = "Normalized Stock Performance (Base=100)";

/// Chart title for a given normalization base.
pub fn chart_title(base: f64) -> String {
    format!("Normalized Stock Performance (Base={base})")
}

/// Errors raised while building or writing a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Polars error while reading the frame.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// The frame lacks a required column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// IO error while writing the HTML file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a line chart with one trace per symbol.
///
/// `normalized` is the frame returned by `normalize_prices` (columns
/// symbol, date, normalized). Traces follow the order in which symbols first
/// appear in the frame.
pub fn normalized_chart(normalized: &DataFrame, title: &str) -> Result<Plot, ChartError> {
    for name in ["symbol", "date", "normalized"] {
        if normalized.column(name).is_err() {
            return Err(ChartError::MissingColumn(name.to_string()));
        }
    }

    let df = normalized
        .clone()
        .lazy()
        .select([
            col("symbol"),
            col("date").cast(DataType::String),
            col("normalized"),
        ])
        .collect()?;

    let symbols = df.column("symbol")?.as_materialized_series().str()?;
    let dates = df.column("date")?.as_materialized_series().str()?;
    let values = df.column("normalized")?.as_materialized_series().f64()?;

    let mut series: Vec<(String, Vec<String>, Vec<f64>)> = Vec::new();
    for ((symbol, date), value) in symbols.into_iter().zip(dates).zip(values) {
        let (Some(symbol), Some(date), Some(value)) = (symbol, date, value) else {
            continue;
        };
        let idx = match series.iter().position(|(s, _, _)| s == symbol) {
            Some(idx) => idx,
            None => {
                series.push((symbol.to_string(), Vec::new(), Vec::new()));
                series.len() - 1
            }
        };
        series[idx].1.push(date.to_string());
        series[idx].2.push(value);
    }

    let mut plot = Plot::new();
    for (symbol, x, y) in series {
        let trace = Scatter::new(x, y).mode(Mode::Lines).name(&symbol);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Date").show_grid(true))
        .y_axis(Axis::new().title("Normalized Price").show_grid(true));
    plot.set_layout(layout);

    Ok(plot)
}

/// Write `plot` as a standalone HTML page.
pub fn write_chart(plot: &Plot, path: &Path) -> Result<(), ChartError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, plot.to_html())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame() -> DataFrame {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        df!(
            "symbol" => ["TME", "TME", "HACK", "HACK"],
            "date" => [d(2), d(3), d(2), d(3)],
            "close" => [10.0, 11.0, 50.0, 49.0],
            "normalized" => [100.0, 110.0, 100.0, 98.0],
        )
        .unwrap()
    }

    fn as_json(plot: &Plot) -> serde_json::Value {
        serde_json::from_str(&plot.to_json()).unwrap()
    }

    #[test]
    fn test_one_trace_per_symbol() {
        let plot = normalized_chart(&frame(), CHART_TITLE).unwrap();
        let json = as_json(&plot);

        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "TME");
        assert_eq!(data[1]["name"], "HACK");
        assert_eq!(data[0]["mode"], "lines");
        assert_eq!(data[0]["x"][0], "2024-01-02");
        assert_eq!(data[1]["y"][1], 98.0);
    }

    #[test]
    fn test_layout_titles() {
        let json = as_json(&normalized_chart(&frame(), CHART_TITLE).unwrap());
        let layout = &json["layout"];

        assert_eq!(layout["title"]["text"], CHART_TITLE);
        assert_eq!(layout["xaxis"]["title"]["text"], "Date");
        assert_eq!(layout["yaxis"]["title"]["text"], "Normalized Price");
        assert_eq!(layout["yaxis"]["showgrid"], true);
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(chart_title(100.0), CHART_TITLE);
        assert_eq!(chart_title(1.0), "Normalized Stock Performance (Base=1)");
    }

    #[test]
    fn test_missing_column() {
        let df = frame().drop("normalized").unwrap();
        assert!(matches!(
            normalized_chart(&df, CHART_TITLE),
            Err(ChartError::MissingColumn(c)) if c == "normalized"
        ));
    }

    #[test]
    fn test_write_chart() {
        let dir = std::env::temp_dir().join(format!("stockinfo-chart-{}", std::process::id()));
        let path = dir.join("chart.html");
        let plot = normalized_chart(&frame(), CHART_TITLE).unwrap();

        write_chart(&plot, &path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(html.contains("<html"));
        assert!(html.contains("Normalized Stock Performance"));
    }
}
