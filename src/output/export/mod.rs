//! Export of run summaries
//!
//! A finished [`RunSummary`] can be written out as a report through an
//! [`Exporter`]. CSV ([`csv`]) is the only format so far.
//!
//! # Example
//!
//! ```rust,ignore
//! use ofpost_rs::output::export::{CsvExporter, Exporter};
//!
//! let summary = pipeline.run(case_root)?;
//! CsvExporter::default().export_summary(&summary, "report.csv".as_ref())?;
//! ```

pub mod csv;

pub use csv::{export_summary_csv, CsvConfig, CsvExporter, CsvMetadata};

use std::path::Path;

use crate::pipeline::RunSummary;

/// Report writer for one file format
pub trait Exporter {
    type Error: std::error::Error;

    /// Write one row per artifact of `summary` to `path`
    fn export_summary(&self, summary: &RunSummary, path: &Path) -> Result<(), Self::Error>;
}
