#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod etf_report;
pub mod export;
pub mod format;
pub mod summary;

pub use chart::{CHART_TITLE, ChartError, chart_title, normalized_chart, write_chart};
pub use etf_report::EtfReport;
pub use export::{
    ExportError, ExportFormat, Exporter, summary_to_csv_string, summary_to_json_string,
};
pub use summary::{SummaryRow, SummaryTable};
