//! Output of the pipeline: images and reports
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs              ← This file
//! ├── visualization/      ← Render requests and their plotters drawing
//! └── export/             ← Run summary reports
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! Visualization works on [`UnifiedSample`](crate::sample::UnifiedSample)s
//! and writes one image per frame; export works on the
//! [`RunSummary`](crate::pipeline::RunSummary) of a finished run.

pub mod export;
pub mod visualization;

pub use visualization::{
    build_request, output_path, PlotConfig, PlottersPrimitive, RenderPrimitive, RenderRequest, SeriesDomain,
};

pub use export::{export_summary_csv, CsvConfig, CsvExporter, Exporter};
