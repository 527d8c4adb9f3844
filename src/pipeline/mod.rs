//! Pipeline orchestration
//!
//! ```text
//! validate policy → scan → group into series → parse → series domain → render frames
//! ```
//!
//! Artifacts that form a series of their own are processed as the scan
//! yields them; only the time steps of transient mesh and line outputs are
//! collected first, since their color domain spans the whole series.
//!
//! Series are independent and run on the rayon pool when the `parallel`
//! feature is enabled. Within a series every artifact is parsed before the
//! first frame is drawn, so the color domain covers the whole series.
//!
//! Failures are contained per artifact and end up in the [`RunSummary`]:
//!
//! | Cause | Outcome |
//! |-------|---------|
//! | `MalformedArtifact`, `Io`, `RenderFailure` | failed |
//! | `UnsupportedArtifact`, no field left after filtering | skipped |
//!
//! Only an inconsistent policy or an unreadable case root abort the run.
//!
//! # Example
//!
//! ```rust,ignore
//! use ofpost_rs::prelude::*;
//!
//! let primitive = PlottersPrimitive::default();
//! let pipeline = Pipeline::new(resolve(&flags), "images", &primitive);
//! let summary = pipeline.run("cavity".as_ref())?;
//! println!("{}", summary);
//! ```

pub mod series;
pub mod summary;

pub use series::{frames, group_series, joins_series, Frame};
pub use summary::{ArtifactReport, Outcome, RunSummary};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::context::RenderPolicy;
use crate::error::PostResult;
use crate::output::visualization::{build_request, output_path, RenderPrimitive, SeriesDomain};
use crate::parsers::parse_artifact;
use crate::sample::UnifiedSample;
use crate::scan::{ArtifactRef, ScanConfig, Scanner};

/// Reason recorded when the policy filters out every field
pub const NOTHING_TO_RENDER: &str = "no renderable field after policy filtering";

/// A configured run: policy, scan conventions, output root and renderer
pub struct Pipeline<'a> {
    policy: RenderPolicy,
    scan: ScanConfig,
    output_root: PathBuf,
    primitive: &'a dyn RenderPrimitive,
}

impl<'a> Pipeline<'a> {
    pub fn new(policy: RenderPolicy, output_root: impl Into<PathBuf>, primitive: &'a dyn RenderPrimitive) -> Self {
        Self {
            policy,
            scan: ScanConfig::default(),
            output_root: output_root.into(),
            primitive,
        }
    }

    /// Builder pattern: replace the scan conventions
    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Process every artifact below `case_root`
    ///
    /// # Errors
    ///
    /// `Configuration` if the policy is inconsistent, `Io` if the case root
    /// cannot be opened. Per-artifact errors are reported in the summary.
    pub fn run(&self, case_root: &Path) -> PostResult<RunSummary> {
        self.policy.validate()?;

        let scanner = Scanner::new(case_root, &self.scan)?;
        info!("scanning {}", scanner.root().display());

        // Series of one are processed while the scan goes on; only members of
        // multi-step series are held back for grouping.
        let mut held = Vec::new();
        let singles = scanner.filter(|artifact| {
            if joins_series(artifact, &self.policy) {
                held.push(artifact.clone());
                false
            } else {
                true
            }
        });

        #[cfg(feature = "parallel")]
        let mut reports: Vec<ArtifactReport> = singles
            .par_bridge()
            .flat_map_iter(|artifact| self.process_series(std::slice::from_ref(&artifact)))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let mut reports: Vec<ArtifactReport> = singles
            .flat_map(|artifact| self.process_series(std::slice::from_ref(&artifact)))
            .collect();

        let series = group_series(held, &self.policy);
        debug!("{} multi-step series", series.len());

        #[cfg(feature = "parallel")]
        reports.par_extend(series.par_iter().flat_map_iter(|members| self.process_series(members)));
        #[cfg(not(feature = "parallel"))]
        reports.extend(series.iter().flat_map(|members| self.process_series(members)));

        let summary = RunSummary::from_reports(reports);
        info!("{}", summary);
        Ok(summary)
    }

    fn process_series(&self, members: &[ArtifactRef]) -> Vec<ArtifactReport> {
        let parsed: Vec<PostResult<UnifiedSample>> = members
            .iter()
            .map(|artifact| parse_artifact(artifact, &self.policy))
            .collect();

        let domain = SeriesDomain::from_samples(parsed.iter().filter_map(|r| r.as_ref().ok()), &self.policy);

        members
            .iter()
            .zip(parsed)
            .map(|(artifact, result)| {
                let (outcome, images) = match result {
                    Ok(sample) => self.render_sample(&sample, &domain),
                    Err(e) => (Outcome::from_error(&e), Vec::new()),
                };
                log_outcome(artifact, &outcome, images.len());
                ArtifactReport {
                    artifact: artifact.clone(),
                    outcome,
                    images,
                }
            })
            .collect()
    }

    /// Render every frame of a sample; stops at the first failing frame
    fn render_sample(&self, sample: &UnifiedSample, domain: &SeriesDomain) -> (Outcome, Vec<PathBuf>) {
        let mut images = Vec::new();

        for frame in frames(sample, &self.policy) {
            let view;
            let shown = if frame.records == sample.len() {
                sample
            } else {
                view = sample.prefix(frame.records);
                &view
            };

            let path = output_path(&self.output_root, sample.source(), frame.value, self.policy.image_format);
            let Some(request) = build_request(shown, &self.policy, domain, frame.value, path) else {
                return (
                    Outcome::Skipped {
                        reason: NOTHING_TO_RENDER.to_string(),
                    },
                    images,
                );
            };

            if let Err(e) = self.primitive.render(&request) {
                return (Outcome::from_error(&e), images);
            }
            images.push(request.output_path);
        }

        (Outcome::Succeeded, images)
    }
}

fn log_outcome(artifact: &ArtifactRef, outcome: &Outcome, images: usize) {
    match outcome {
        Outcome::Succeeded => info!("{} {}: {} image(s)", artifact.kind, artifact.path.display(), images),
        Outcome::Skipped { reason } => warn!("skipped {}: {}", artifact.path.display(), reason),
        Outcome::Failed { reason, .. } => warn!("failed {}: {}", artifact.path.display(), reason),
    }
}

/// Run the pipeline with the `plotters` renderer and default scan conventions
pub fn run(case_root: &Path, output_root: &Path, policy: RenderPolicy) -> PostResult<RunSummary> {
    let primitive = crate::output::visualization::PlottersPrimitive::default();
    Pipeline::new(policy, output_root, &primitive).run(case_root)
}

// =================================================================================================
// Tests
// =================================================================================================
