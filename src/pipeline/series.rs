//! Series and frames
//!
//! A *series* is the set of artifacts that share one color domain: the time
//! steps of a transient mesh or line output (same group directory and stem
//! across time directories). Everything else is a series of one.
//!
//! A *frame* is one image of a sample. Transient tables get one frame per
//! distinct index value, each showing the history up to that value.

use std::collections::{BTreeMap, HashSet};

use crate::context::RenderPolicy;
use crate::sample::{Coordinates, UnifiedSample};
use crate::scan::{ArtifactKind, ArtifactRef};

/// Whether `artifact` belongs to a multi-step series under the policy
///
/// Everything else is a series of one and can be processed as soon as it
/// is found.
pub fn joins_series(artifact: &ArtifactRef, policy: &RenderPolicy) -> bool {
    policy.is_transient() && artifact.kind != ArtifactKind::Table
}

/// Group artifacts into series, each ordered by time
///
/// The result is ordered by the path of the first member.
pub fn group_series(artifacts: Vec<ArtifactRef>, policy: &RenderPolicy) -> Vec<Vec<ArtifactRef>> {
    let mut series: Vec<Vec<ArtifactRef>> = Vec::new();
    let mut grouped = BTreeMap::new();

    for artifact in artifacts {
        if joins_series(&artifact, policy) {
            grouped
                .entry(artifact.series_key())
                .or_insert_with(Vec::new)
                .push(artifact);
        } else {
            series.push(vec![artifact]);
        }
    }

    for mut members in grouped.into_values() {
        members.sort_by(|a, b| {
            a.time_value()
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&b.time_value().unwrap_or(f64::NEG_INFINITY))
                .then_with(|| a.path.cmp(&b.path))
        });
        series.push(members);
    }

    series.sort_by(|a, b| a[0].path.cmp(&b[0].path));
    series
}

/// One image to produce from a sample
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Index value shown in the file name, for transient table frames
    pub value: Option<f64>,
    /// Number of leading records drawn
    pub records: usize,
}

/// Frames of a sample under the policy
pub fn frames(sample: &UnifiedSample, policy: &RenderPolicy) -> Vec<Frame> {
    let whole = Frame {
        value: None,
        records: sample.len(),
    };

    let values = match sample.coordinates() {
        Coordinates::Index { values, .. } if policy.is_transient() => values,
        _ => return vec![whole],
    };

    let mut seen = HashSet::new();
    let mut frames = Vec::new();
    for (i, &value) in values.iter().enumerate() {
        let run_continues = values.get(i + 1).is_some_and(|&next| next == value);
        if !run_continues && seen.insert(value.to_bits()) {
            frames.push(Frame {
                value: Some(value),
                records: i + 1,
            });
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{resolve, ContextFlags, TimeRegime};
    use crate::sample::{Field, FieldData, SampleMeta};
    use nalgebra::DVector;
    use std::path::Path;

    fn artifact(relative: &str, kind: ArtifactKind) -> ArtifactRef {
        ArtifactRef::from_path(Path::new("/case"), &Path::new("/case").join(relative), kind)
    }

    fn transient() -> RenderPolicy {
        resolve(&ContextFlags {
            regime: Some(TimeRegime::Transient),
            ..Default::default()
        })
    }

    fn table(index: Vec<f64>) -> UnifiedSample {
        let n = index.len();
        UnifiedSample::new(
            SampleMeta {
                source: artifact("postProcessing/monitors/0/p.dat", ArtifactKind::Table),
                time: None,
            },
            Coordinates::Index {
                label: "Time".into(),
                values: DVector::from_vec(index),
            },
            vec![Field::new("p", FieldData::from_scalars(vec![1.0; n]), "p.dat")],
        )
        .unwrap()
    }

    #[test]
    fn test_transient_groups_time_steps() {
        let artifacts = vec![
            artifact("postProcessing/surfaces/0.2/slice.vtk", ArtifactKind::Mesh),
            artifact("postProcessing/surfaces/0.1/slice.vtk", ArtifactKind::Mesh),
            artifact("postProcessing/forces/0/forces.dat", ArtifactKind::Table),
            artifact("postProcessing/forces/5/forces.dat", ArtifactKind::Table),
        ];

        let series = group_series(artifacts.clone(), &transient());
        assert_eq!(series.len(), 3);
        let slice = series.iter().find(|s| s[0].kind == ArtifactKind::Mesh).unwrap();
        let times: Vec<_> = slice.iter().map(|a| a.time_value().unwrap()).collect();
        assert_eq!(times, vec![0.1, 0.2]);

        assert_eq!(group_series(artifacts, &RenderPolicy::default()).len(), 4);
    }

    #[test]
    fn test_only_transient_non_tables_join_series() {
        let slice = artifact("postProcessing/surfaces/1/slice.vtk", ArtifactKind::Mesh);
        let forces = artifact("postProcessing/forces/0/forces.dat", ArtifactKind::Table);

        assert!(joins_series(&slice, &transient()));
        assert!(!joins_series(&forces, &transient()));
        assert!(!joins_series(&slice, &RenderPolicy::default()));
    }

    #[test]
    fn test_series_order_is_by_path() {
        let artifacts = vec![
            artifact("b/line_T.xy", ArtifactKind::SampledLine),
            artifact("a/line_T.xy", ArtifactKind::SampledLine),
        ];
        let series = group_series(artifacts, &transient());
        assert_eq!(series[0][0].group_dir, Path::new("a"));
    }

    #[test]
    fn test_steady_table_is_one_frame() {
        let frames = frames(&table(vec![1.0, 2.0, 3.0]), &RenderPolicy::default());
        assert_eq!(frames, vec![Frame { value: None, records: 3 }]);
    }

    #[test]
    fn test_transient_table_frame_per_distinct_index() {
        let frames = frames(&table(vec![0.1, 0.2, 0.2, 0.3]), &transient());
        let summary: Vec<_> = frames.iter().map(|f| (f.value.unwrap(), f.records)).collect();
        assert_eq!(summary, vec![(0.1, 1), (0.2, 3), (0.3, 4)]);
    }
}
