//! ofpost-rs: Headless rendering of CFD post-processing artifacts
//!
//! Turns the `postProcessing/` tree of a solver case (surface and slice
//! meshes, time-series tables, sampled lines) into images, without an
//! interactive visualization application. What each image shows (fields,
//! projection, color scale, axis labels) is governed by a few simulation
//! context flags: dimensionality, steady vs. transient, compressible vs.
//! incompressible.
//!
//! # Architecture
//!
//! Data flows in one direction only:
//!
//! ```text
//! scan ──► parsers ──► sample ──► output::visualization ──► image files
//!                        ▲                 ▲
//!                     context ─────────────┘
//!                                 pipeline (orchestration, run summary)
//! ```
//!
//! 1. **Discovery is convention-based**: the scanner classifies files by
//!    extension and directory naming, and ignores everything else.
//! 2. **One data model**: every parser produces a [`sample::UnifiedSample`],
//!    so the renderer never sees file formats.
//! 3. **Failures stay local**: a broken artifact is reported in the
//!    [`pipeline::RunSummary`] and the run goes on.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ofpost_rs::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), PostError> {
//! let flags = ContextFlags {
//!     dimensionality: Some(Dimensionality::Two),
//!     regime: Some(TimeRegime::Transient),
//!     ..Default::default()
//! };
//!
//! let primitive = PlottersPrimitive::default();
//! let pipeline = Pipeline::new(resolve(&flags), "images", &primitive);
//! let summary = pipeline.run(Path::new("cavity"))?;
//!
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`scan`]: Artifact discovery
//! - [`parsers`]: Mesh, table and sampled-line readers
//! - [`sample`]: The unified sample model
//! - [`context`]: Context flags and the resolved render policy
//! - [`output`]: Rendering and run-summary export
//! - [`pipeline`]: Orchestration
//! - [`error`]: Error type

pub mod error;

// Core modules
pub mod context;
pub mod parsers;
pub mod sample;
pub mod scan;

pub mod output;
pub mod pipeline;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use ofpost_rs::prelude::*;
    //! ```
    pub use crate::context::{
        resolve, Compressibility, ContextFlags, Dimensionality, ImageFormat, RenderPolicy, TimeRegime,
        VectorDisplay,
    };
    pub use crate::error::{PostError, PostResult};
    pub use crate::output::{PlotConfig, PlottersPrimitive, RenderPrimitive, RenderRequest};
    pub use crate::pipeline::{ArtifactReport, Outcome, Pipeline, RunSummary};
    pub use crate::sample::UnifiedSample;
    pub use crate::scan::{ArtifactKind, ArtifactRef, ScanConfig, Scanner};
}
