//! Artifact parsers
//!
//! One parser per [`ArtifactKind`], each turning a file into a
//! [`UnifiedSample`]:
//!
//! | Kind | Module |
//! |------|--------|
//! | [`ArtifactKind::Mesh`] | [`mesh`] (legacy and XML polydata) |
//! | [`ArtifactKind::Table`] | [`table`] |
//! | [`ArtifactKind::SampledLine`] | [`sampled_line`] |
//!
//! Parsers never render and never look at other artifacts; errors are
//! reported as `MalformedArtifact` (the content is broken) or
//! `UnsupportedArtifact` (a valid file this crate does not read).

pub mod mesh;
pub mod sampled_line;
pub mod table;
pub mod text;

use tracing::debug;

use crate::context::RenderPolicy;
use crate::error::PostResult;
use crate::sample::UnifiedSample;
use crate::scan::{ArtifactKind, ArtifactRef};

/// Parse one artifact with the parser of its kind
pub fn parse_artifact(artifact: &ArtifactRef, policy: &RenderPolicy) -> PostResult<UnifiedSample> {
    debug!("parsing {} {}", artifact.kind, artifact.path.display());
    match artifact.kind {
        ArtifactKind::Mesh => mesh::parse(artifact),
        ArtifactKind::Table => table::parse(artifact),
        ArtifactKind::SampledLine => sampled_line::parse(artifact, policy),
    }
}
