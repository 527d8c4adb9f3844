//! Output file naming
//!
//! ```text
//! <out_root>/<group dir>/<stem>[_<time dir>][_<frame>].<ext>
//! ```
//!
//! The group directory mirrors the case tree. The time directory is appended
//! when the artifact lives in a numeric time directory other than `0`, so
//! the steps of a transient series do not overwrite each other; transient
//! table frames add the index value of the frame. When two artifacts of one
//! directory share a stem (`p.vtk` next to `p.vtp`), the source extension
//! follows the stem.

use std::path::{Path, PathBuf};

use crate::context::ImageFormat;
use crate::scan::ArtifactRef;

/// Destination of one frame of `artifact`
pub fn output_path(out_root: &Path, artifact: &ArtifactRef, frame: Option<f64>, format: ImageFormat) -> PathBuf {
    let mut name = artifact.stem.clone();
    if artifact.stem_shared {
        name.push('_');
        name.push_str(&artifact.extension());
    }

    if let Some(time_dir) = &artifact.time_dir {
        if artifact.time_value() != Some(0.0) {
            name.push('_');
            name.push_str(time_dir);
        }
    }
    if let Some(value) = frame {
        name.push_str(&format!("_{}", value));
    }
    name.push('.');
    name.push_str(format.extension());

    out_root.join(&artifact.group_dir).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ArtifactKind;

    fn artifact(relative: &str) -> ArtifactRef {
        ArtifactRef::from_path(Path::new("/case"), &Path::new("/case").join(relative), ArtifactKind::Table)
    }

    #[test]
    fn test_zero_time_dir_is_omitted() {
        let path = output_path(
            Path::new("/out"),
            &artifact("postProcessing/residuals/0/residuals.dat"),
            None,
            ImageFormat::Png,
        );
        assert_eq!(path, PathBuf::from("/out/postProcessing/residuals/residuals.png"));
    }

    #[test]
    fn test_time_dir_and_frame() {
        let path = output_path(
            Path::new("/out"),
            &artifact("postProcessing/forces/0.5/forces.dat"),
            Some(2.25),
            ImageFormat::Svg,
        );
        assert_eq!(path, PathBuf::from("/out/postProcessing/forces/forces_0.5_2.25.svg"));
    }

    #[test]
    fn test_shared_stem_keeps_source_extension() {
        let root = Path::new("/case");
        let mut legacy = ArtifactRef::from_path(root, &root.join("pp/surfaces/1/p.vtk"), ArtifactKind::Mesh);
        let mut xml = ArtifactRef::from_path(root, &root.join("pp/surfaces/1/p.vtp"), ArtifactKind::Mesh);
        legacy.stem_shared = true;
        xml.stem_shared = true;

        let a = output_path(Path::new("/out"), &legacy, None, ImageFormat::Png);
        let b = output_path(Path::new("/out"), &xml, None, ImageFormat::Png);
        assert_eq!(a, PathBuf::from("/out/pp/surfaces/p_vtk_1.png"));
        assert_eq!(b, PathBuf::from("/out/pp/surfaces/p_vtp_1.png"));
    }

    #[test]
    fn test_artifact_at_case_root() {
        let path = output_path(Path::new("/out"), &artifact("monitor.dat"), Some(3.0), ImageFormat::Jpeg);
        assert_eq!(path, PathBuf::from("/out/monitor_3.jpg"));
    }
}
