//! Error types for the post-processing pipeline
//!
//! Every failure the pipeline can meet is one variant of [`PostError`].
//! Per-artifact variants (`MalformedArtifact`, `UnsupportedArtifact`,
//! `RenderFailure`, `Io`) are collected into the run summary by the
//! orchestrator; `Configuration` aborts the run before any artifact is touched.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate
pub type PostResult<T> = Result<T, PostError>;

/// Pipeline error enumeration
#[derive(Error, Debug)]
pub enum PostError {
    /// The file structure cannot be made sense of (bad counts, bad numbers)
    #[error("malformed artifact {}: {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },

    /// The file matched a scan heuristic but is not a known sub-format
    #[error("unsupported artifact {}: {reason}", path.display())]
    UnsupportedArtifact { path: PathBuf, reason: String },

    /// The rendering primitive could not produce an image
    #[error("render failure for {}: {reason}", path.display())]
    RenderFailure { path: PathBuf, reason: String },

    /// Inconsistent rendering configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PostError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnsupportedArtifact {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn render(path: &Path, reason: impl Into<String>) -> Self {
        Self::RenderFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short machine-friendly name of the variant, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            PostError::MalformedArtifact { .. } => "MalformedArtifact",
            PostError::UnsupportedArtifact { .. } => "UnsupportedArtifact",
            PostError::RenderFailure { .. } => "RenderFailure",
            PostError::Configuration(_) => "ConfigurationError",
            PostError::Io { .. } => "Io",
        }
    }

    /// Errors that end an artifact as "skipped" rather than "failed"
    pub fn is_skip(&self) -> bool {
        matches!(self, PostError::UnsupportedArtifact { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_path_and_reason() {
        let err = PostError::malformed(Path::new("/case/a.vtk"), "3 values for 4 points");
        let text = err.to_string();
        assert!(text.contains("/case/a.vtk"));
        assert!(text.contains("3 values for 4 points"));
        assert_eq!(err.kind(), "MalformedArtifact");
    }

    #[test]
    fn test_only_unsupported_is_skip() {
        assert!(PostError::unsupported(Path::new("x"), "zlib").is_skip());
        assert!(!PostError::malformed(Path::new("x"), "bad").is_skip());
        assert!(!PostError::render(Path::new("x"), "backend").is_skip());
        assert!(!PostError::Configuration("size".into()).is_skip());
    }
}
