//! Run outcome reporting

use std::fmt;
use std::path::PathBuf;

use crate::error::PostError;
use crate::scan::ArtifactRef;

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every frame was rendered
    Succeeded,
    /// Nothing to do: unsupported sub-format or no field left to draw
    Skipped { reason: String },
    /// The artifact could not be processed
    Failed { kind: &'static str, reason: String },
}

impl Outcome {
    /// Map a per-artifact error to its outcome
    pub fn from_error(error: &PostError) -> Self {
        if error.is_skip() {
            Outcome::Skipped {
                reason: error.to_string(),
            }
        } else {
            Outcome::Failed {
                kind: error.kind(),
                reason: error.to_string(),
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Failed { .. } => "failed",
        }
    }

    /// Reason of a skip or failure, empty on success
    pub fn reason(&self) -> &str {
        match self {
            Outcome::Succeeded => "",
            Outcome::Skipped { reason } | Outcome::Failed { reason, .. } => reason,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => f.write_str("succeeded"),
            Outcome::Skipped { reason } => write!(f, "skipped ({})", reason),
            Outcome::Failed { kind, reason } => write!(f, "failed [{}] ({})", kind, reason),
        }
    }
}

/// Outcome and images of one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub artifact: ArtifactRef,
    pub outcome: Outcome,
    /// Images written for this artifact, in frame order
    pub images: Vec<PathBuf>,
}

/// Result of a whole run
///
/// Reports are sorted by artifact path so that two runs over the same tree
/// produce identical summaries, whatever the processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Every image written, sorted
    pub images: Vec<PathBuf>,
    pub reports: Vec<ArtifactReport>,
}

impl RunSummary {
    pub fn from_reports(mut reports: Vec<ArtifactReport>) -> Self {
        reports.sort_by(|a, b| a.artifact.path.cmp(&b.artifact.path));

        let mut summary = Self::default();
        for report in &reports {
            match report.outcome {
                Outcome::Succeeded => summary.succeeded += 1,
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
            summary.images.extend(report.images.iter().cloned());
        }
        summary.images.sort();
        summary.reports = reports;
        summary
    }

    /// Fold another run (another case root) into this one
    pub fn merge(self, other: RunSummary) -> Self {
        let mut reports = self.reports;
        reports.extend(other.reports);
        Self::from_reports(reports)
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Reports of failed artifacts
    pub fn failures(&self) -> impl Iterator<Item = &ArtifactReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} artifacts: {} succeeded, {} skipped, {} failed, {} images",
            self.total(),
            self.succeeded,
            self.skipped,
            self.failed,
            self.images.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ArtifactKind;
    use std::path::Path;

    fn report(name: &str, outcome: Outcome, images: &[&str]) -> ArtifactReport {
        ArtifactReport {
            artifact: ArtifactRef::from_path(Path::new("/case"), &Path::new("/case").join(name), ArtifactKind::Table),
            outcome,
            images: images.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn test_counts_and_ordering() {
        let summary = RunSummary::from_reports(vec![
            report("b.dat", Outcome::Succeeded, &["/out/b.png"]),
            report(
                "a.dat",
                Outcome::Failed {
                    kind: "MalformedArtifact",
                    reason: "bad".into(),
                },
                &[],
            ),
            report("c.dat", Outcome::Skipped { reason: "empty".into() }, &[]),
        ]);

        assert_eq!((summary.succeeded, summary.skipped, summary.failed), (1, 1, 1));
        assert_eq!(summary.reports[0].artifact.stem, "a");
        assert_eq!(summary.images, vec![PathBuf::from("/out/b.png")]);
        assert!(summary.has_failures());
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(
            summary.to_string(),
            "3 artifacts: 1 succeeded, 1 skipped, 1 failed, 1 images"
        );
    }

    #[test]
    fn test_outcome_from_error() {
        let path = Path::new("/case/x.vtk");
        assert_eq!(Outcome::from_error(&PostError::unsupported(path, "STRUCTURED_GRID")).label(), "skipped");

        let failed = Outcome::from_error(&PostError::malformed(path, "short"));
        assert!(matches!(failed, Outcome::Failed { kind: "MalformedArtifact", .. }));
        assert!(failed.reason().contains("short"));
    }

    #[test]
    fn test_merge_keeps_sorted() {
        let first = RunSummary::from_reports(vec![report("z.dat", Outcome::Succeeded, &["/out/z.png"])]);
        let second = RunSummary::from_reports(vec![report("m.dat", Outcome::Succeeded, &["/out/m.png"])]);
        let merged = first.merge(second);
        assert_eq!(merged.succeeded, 2);
        assert_eq!(merged.reports[0].artifact.stem, "m");
        assert_eq!(merged.images[0], PathBuf::from("/out/m.png"));
    }
}
