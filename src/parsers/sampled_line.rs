//! Sampled-line parser (`.xy`)
//!
//! Line sets are written as bare numeric rows: N coordinate columns followed
//! by the sampled values. Field names only appear in the file stem,
//! `<setName>_<field1>_<field2>`:
//!
//! ```text
//! lineX_p_U.xy
//! 0.00   101.3   1.0 0.0 0.0
//! 0.05   101.1   1.1 0.0 0.0
//! ```
//!
//! N is not written anywhere. Candidates are tried in a fixed order (1, 2, 3
//! for 2-D cases; 1, 3, 2 for 3-D) and the first one whose remaining columns
//! fit the named fields wins. Known vector names (`U`, ...) take three
//! columns and the others one; when that typed layout fits no N, the fields
//! are tried as all scalars and then as all vectors.

use nalgebra::{DVector, Point3};
use std::path::Path;

use tracing::debug;

use super::text::parse_number;
use crate::context::{units, RenderPolicy};
use crate::error::{PostError, PostResult};
use crate::sample::{Coordinates, Field, FieldData, SampleMeta, UnifiedSample};
use crate::scan::ArtifactRef;

/// Field names that contain the stem separator
const COMPOUND_NAMES: [(&str, &str); 1] = [("p", "rgh")];

/// Field names encoded in the file stem (set name removed)
pub fn field_names(stem: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for part in stem.split('_').skip(1).filter(|p| !p.is_empty()) {
        if let Some(last) = names.last_mut() {
            if COMPOUND_NAMES.iter().any(|(head, tail)| last == head && part == *tail) {
                last.push('_');
                last.push_str(part);
                continue;
            }
        }
        names.push(part.to_string());
    }
    names
}

/// Chosen column layout: coordinate count and per-field arity
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    coordinates: usize,
    arities: Vec<usize>,
}

fn candidate_counts(policy: &RenderPolicy) -> [usize; 3] {
    if policy.is_two_dimensional() {
        [1, 2, 3]
    } else {
        [1, 3, 2]
    }
}

fn choose_layout(names: &[String], columns: usize, order: [usize; 3]) -> Option<Layout> {
    if names.is_empty() {
        return (columns > 1).then(|| Layout {
            coordinates: 1,
            arities: vec![1; columns - 1],
        });
    }

    let typed: Vec<usize> = names
        .iter()
        .map(|n| if units::is_vector_name(n) { 3 } else { 1 })
        .collect();
    let fallbacks = [vec![1; names.len()], vec![3; names.len()]];

    std::iter::once(&typed)
        .chain(fallbacks.iter())
        .find_map(|arities| {
            let width: usize = arities.iter().sum();
            order
                .iter()
                .find(|&&n| columns == n + width)
                .map(|&n| Layout {
                    coordinates: n,
                    arities: arities.clone(),
                })
        })
}

/// Parse a sampled-line artifact from disk
pub fn parse(artifact: &ArtifactRef, policy: &RenderPolicy) -> PostResult<UnifiedSample> {
    let content = std::fs::read_to_string(&artifact.path).map_err(|e| PostError::io(&artifact.path, e))?;
    parse_str(artifact, policy, &content)
}

/// Parse sampled-line content already in memory
pub fn parse_str(artifact: &ArtifactRef, policy: &RenderPolicy, content: &str) -> PostResult<UnifiedSample> {
    let path = artifact.path.as_path();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split_whitespace()
            .map(parse_number)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| PostError::malformed(path, format!("line {}: not a number", number + 1)))?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(PostError::malformed(
                    path,
                    format!("line {}: {} columns, expected {}", number + 1, row.len(), first.len()),
                ));
            }
        }
        rows.push(row);
    }

    let columns = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| PostError::malformed(path, "no data rows"))?;

    let names = field_names(&artifact.stem);
    let layout = choose_layout(&names, columns, candidate_counts(policy)).ok_or_else(|| {
        PostError::unsupported(
            path,
            format!("{} columns do not fit fields {:?}", columns, names),
        )
    })?;
    debug!("{}: {} coordinate columns, arities {:?}", path.display(), layout.coordinates, layout.arities);

    let coordinates = build_coordinates(&rows, layout.coordinates);
    let fields = build_fields(path, &rows, &names, &layout);

    UnifiedSample::new(
        SampleMeta {
            source: artifact.clone(),
            time: artifact.time_value(),
        },
        coordinates,
        fields,
    )
}

fn build_coordinates(rows: &[Vec<f64>], n: usize) -> Coordinates {
    if n == 1 {
        return Coordinates::Distance(DVector::from_iterator(rows.len(), rows.iter().map(|r| r[0])));
    }

    let values = rows
        .iter()
        .map(|r| {
            let mut p = Point3::origin();
            for (i, v) in r.iter().take(n).enumerate() {
                p[i] = *v;
            }
            p
        })
        .collect();
    Coordinates::Points { components: n, values }
}

fn build_fields(path: &Path, rows: &[Vec<f64>], names: &[String], layout: &Layout) -> Vec<Field> {
    let mut offset = layout.coordinates;
    let mut fields = Vec::with_capacity(layout.arities.len());

    for (i, &arity) in layout.arities.iter().enumerate() {
        let name = names
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("value_{}", i + 1));
        let data = if arity == 3 {
            FieldData::from_triples(rows.iter().map(|r| [r[offset], r[offset + 1], r[offset + 2]]).collect())
        } else {
            FieldData::from_scalars(rows.iter().map(|r| r[offset]).collect())
        };
        fields.push(Field::new(name, data, path));
        offset += arity;
    }

    fields
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{resolve, ContextFlags, Dimensionality};
    use crate::scan::ArtifactKind;

    fn artifact(name: &str) -> ArtifactRef {
        ArtifactRef::from_path(
            Path::new("/case"),
            &Path::new("/case/postProcessing/sets/100").join(name),
            ArtifactKind::SampledLine,
        )
    }

    fn policy(dim: Dimensionality) -> RenderPolicy {
        resolve(&ContextFlags {
            dimensionality: Some(dim),
            ..Default::default()
        })
    }

    #[test]
    fn test_field_names_from_stem() {
        assert_eq!(field_names("lineX_p_U"), vec!["p", "U"]);
        assert_eq!(field_names("centreline_p_rgh_T"), vec!["p_rgh", "T"]);
        assert!(field_names("centreline").is_empty());
    }

    #[test]
    fn test_distance_scalar_and_vector() {
        let content = "0.0 101.3 1.0 0.0 0.0\n0.5 101.1 1.1 0.0 0.0\n";
        let sample = parse_str(&artifact("lineX_p_U.xy"), &policy(Dimensionality::Three), content).unwrap();

        assert_eq!(sample.len(), 2);
        assert_eq!(sample.dimensionality(), 1);
        assert!(!sample.field("p").unwrap().is_vector());
        assert!(sample.field("U").unwrap().is_vector());
        assert_eq!(sample.time(), Some(100.0));
    }

    #[test]
    fn test_xyz_coordinates_in_3d() {
        let content = "0 0 0 5\n1 0 0 6\n";
        let sample = parse_str(&artifact("line_p.xy"), &policy(Dimensionality::Three), content).unwrap();
        assert_eq!(sample.dimensionality(), 3);
        assert_eq!(sample.fields().len(), 1);
    }

    #[test]
    fn test_xy_coordinates_in_2d() {
        let content = "0 0 1 0 0\n1 0 2 0 0\n";
        let sample = parse_str(&artifact("line_U.xy"), &policy(Dimensionality::Two), content).unwrap();
        assert_eq!(sample.dimensionality(), 2);
        assert!(sample.field("U").unwrap().is_vector());
    }

    #[test]
    fn test_unknown_name_is_scalar_first() {
        let content = "0 1 2 3\n1 4 5 6\n";
        let sample = parse_str(&artifact("line_grad.xy"), &policy(Dimensionality::Three), content).unwrap();
        assert_eq!(sample.dimensionality(), 3);
        assert!(!sample.field("grad").unwrap().is_vector());
    }

    #[test]
    fn test_unknown_vector_falls_back_to_all_vectors() {
        let content = "0 0 0 1 2 3\n1 0 0 4 5 6\n";
        let sample = parse_str(&artifact("line_grad.xy"), &policy(Dimensionality::Three), content).unwrap();
        assert_eq!(sample.dimensionality(), 3);
        assert!(sample.field("grad").unwrap().is_vector());
    }

    #[test]
    fn test_stem_without_fields() {
        let content = "0 1 2\n1 3 4\n";
        let sample = parse_str(&artifact("samples.xy"), &policy(Dimensionality::Three), content).unwrap();
        let names: Vec<&str> = sample.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["value_1", "value_2"]);
    }

    #[test]
    fn test_inconsistent_rows_are_malformed() {
        let content = "0 1\n1 2 3\n";
        let err = parse_str(&artifact("line_p.xy"), &policy(Dimensionality::Three), content).unwrap_err();
        assert!(matches!(err, PostError::MalformedArtifact { .. }));
    }

    #[test]
    fn test_no_fitting_layout_is_unsupported() {
        let content = "0 1 2 3 4 5 6 7 8 9\n";
        let err = parse_str(&artifact("line_p.xy"), &policy(Dimensionality::Three), content).unwrap_err();
        assert!(err.is_skip());
    }
}
