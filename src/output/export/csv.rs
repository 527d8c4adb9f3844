//! CSV export of run summaries
//!
//! One row per artifact, compatible with spreadsheets and pandas.
//!
//! # Quick Examples
//!
//! ## Minimal Export
//!
//! ```rust,ignore
//! use ofpost_rs::output::export::export_summary_csv;
//!
//! export_summary_csv(&summary, "report.csv".as_ref(), None)?;
//! ```
//!
//! **Output** (`report.csv`):
//! ```csv
//! path,kind,outcome,error,reason,images
//! /case/postProcessing/residuals/0/residuals.dat,table,succeeded,,,1
//! /case/postProcessing/surfaces/100/bad.vtk,mesh,failed,MalformedArtifact,"malformed artifact ...: POINT_DATA 3, expected 4",0
//! ```
//!
//! ## With Metadata
//!
//! ```rust,ignore
//! let metadata = CsvMetadata::from_run("cavity", &policy);
//! let config = CsvConfig::default().with_metadata(metadata);
//! export_summary_csv(&summary, "report.csv".as_ref(), Some(&config))?;
//! ```
//!
//! **Output**:
//! ```csv
//! # Post-processing Run Summary
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Case: cavity
//! # Policy: 3d steady incompressible png
//! # Artifacts: 2 (1 succeeded, 0 skipped, 1 failed)
//! #
//! path,kind,outcome,error,reason,images
//! ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::Exporter;
use crate::context::{Compressibility, Dimensionality, RenderPolicy, TimeRegime};
use crate::error::{PostError, PostResult};
use crate::pipeline::{Outcome, RunSummary};

// =============================================================================
// Report options
// =============================================================================

/// How the run report is laid out
///
/// ```rust,ignore
/// let config = CsvConfig::european().problems_only();
/// ```
#[derive(Clone, Debug)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Write only skipped and failed artifacts (default: false)
    pub problems_only: bool,

    /// Comment header describing the run; omitted when `None`
    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            problems_only: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Semicolon-separated report, for locales with a decimal comma
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: drop succeeded artifacts from the rows
    pub fn problems_only(mut self) -> Self {
        self.problems_only = true;
        self
    }

    /// Builder pattern: write a comment header
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Comment header of a run report
///
/// Missing entries are left out of the header.
#[derive(Clone, Debug, Default)]
pub struct CsvMetadata {
    /// Case root(s) the run covered
    pub case: Option<String>,

    /// One-line description of the policy
    pub policy: Option<String>,

    /// Extra `key: value` lines
    pub extra: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Create metadata for a run over `case` under `policy`
    pub fn from_run(case: &str, policy: &RenderPolicy) -> Self {
        let dimensionality = match policy.dimensionality {
            Dimensionality::Two => "2d",
            Dimensionality::Three => "3d",
        };
        let regime = match policy.regime {
            TimeRegime::Steady => "steady",
            TimeRegime::Transient => "transient",
        };
        let compressibility = match policy.compressibility {
            Compressibility::Compressible => "compressible",
            Compressibility::Incompressible => "incompressible",
        };

        Self {
            case: Some(case.to_string()),
            policy: Some(format!(
                "{} {} {} {}",
                dimensionality, regime, compressibility, policy.image_format
            )),
            extra: Vec::new(),
        }
    }

    /// Builder pattern: append a `key: value` line
    pub fn with_entry(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.push((key.into(), value.to_string()));
        self
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Write metadata header comments
fn write_metadata_header(
    out: &mut impl Write,
    metadata: &CsvMetadata,
    summary: &RunSummary,
) -> std::io::Result<()> {
    writeln!(out, "# Post-processing Run Summary")?;

    let now = chrono::Utc::now();
    writeln!(out, "# Generated: {}", now.to_rfc3339())?;

    if let Some(case) = &metadata.case {
        writeln!(out, "# Case: {}", case)?;
    }
    if let Some(policy) = &metadata.policy {
        writeln!(out, "# Policy: {}", policy)?;
    }
    writeln!(
        out,
        "# Artifacts: {} ({} succeeded, {} skipped, {} failed)",
        summary.total(),
        summary.succeeded,
        summary.skipped,
        summary.failed
    )?;

    for (key, value) in &metadata.extra {
        writeln!(out, "# {}: {}", key, value)?;
    }

    writeln!(out, "#")?;
    Ok(())
}

/// Quote a cell when it contains the delimiter, a quote or a line break
fn escape(cell: &str, delimiter: char) -> String {
    if cell.contains(delimiter) || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn write_rows(out: &mut impl Write, summary: &RunSummary, config: &CsvConfig) -> std::io::Result<()> {
    let sep = config.delimiter.to_string();
    writeln!(out, "{}", ["path", "kind", "outcome", "error", "reason", "images"].join(&sep))?;

    let reports = summary
        .reports
        .iter()
        .filter(|r| !config.problems_only || !matches!(r.outcome, Outcome::Succeeded));
    for report in reports {
        let error = match &report.outcome {
            Outcome::Failed { kind, .. } => *kind,
            _ => "",
        };
        let row = [
            escape(&report.artifact.path.to_string_lossy(), config.delimiter),
            report.artifact.kind.to_string(),
            report.outcome.label().to_string(),
            error.to_string(),
            escape(report.outcome.reason(), config.delimiter),
            report.images.len().to_string(),
        ];
        writeln!(out, "{}", row.join(&sep))?;
    }
    Ok(())
}

// =============================================================================
// Export Functions
// =============================================================================

/// Export a run summary to CSV
///
/// # Errors
///
/// `Io` if the file cannot be created or written.
pub fn export_summary_csv(summary: &RunSummary, output_path: &Path, configuration: Option<&CsvConfig>) -> PostResult<()> {
    let default_config = CsvConfig::default();
    let config = configuration.unwrap_or(&default_config);

    let file = File::create(output_path).map_err(|e| PostError::io(output_path, e))?;
    let mut out = BufWriter::new(file);

    write_summary(&mut out, summary, config)
        .and_then(|_| out.flush())
        .map_err(|e| PostError::io(output_path, e))
}

fn write_summary(out: &mut impl Write, summary: &RunSummary, config: &CsvConfig) -> std::io::Result<()> {
    if let Some(metadata) = &config.metadata {
        write_metadata_header(out, metadata, summary)?;
    }
    write_rows(out, summary, config)
}

/// [`Exporter`] writing CSV files
#[derive(Clone, Debug, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }
}

impl Exporter for CsvExporter {
    type Error = PostError;

    fn export_summary(&self, summary: &RunSummary, path: &Path) -> Result<(), Self::Error> {
        export_summary_csv(summary, path, Some(&self.config))
    }
}

// =============================================================================
// Tests
// =============================================================================
