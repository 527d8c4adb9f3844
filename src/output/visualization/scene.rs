//! From samples to render requests
//!
//! This is where the policy meets the data: fields are filtered and vectors
//! reduced to the quantities that get displayed, mesh samples become surface
//! panels, and tables and sampled lines become curve plots.

use std::path::PathBuf;

use crate::context::{units, Axis, RenderPolicy, VectorDisplay};
use crate::sample::{
    Association, Coordinates, FieldData, MeshGeometry, UnifiedSample, COMPONENT_SUFFIXES, MAGNITUDE_SUFFIX,
};

use super::domain::{SeriesDomain, ValueRange};
use super::request::{Curve, CurveScene, RenderContent, RenderRequest, SurfacePanel, SurfaceScene};

// =================================================================================================
// Displayed quantities
// =================================================================================================

/// One scalar quantity as it is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayField {
    /// Name of the displayed quantity (`U_mag`, `U_x`, `p`)
    pub name: String,
    /// Legend text with unit
    pub label: String,
    /// One value per record
    pub values: Vec<f64>,
}

/// Quantities of `sample` the policy lets through, in field order
///
/// Vectors are shown as magnitude (`<name>_mag`), a single component
/// (`<name>_x`...) or both, following `policy.vector_display`.
pub fn display_fields(sample: &UnifiedSample, policy: &RenderPolicy) -> Vec<DisplayField> {
    let mut shown = Vec::new();

    let mut push = |field_name: &str, name: String, values: Vec<f64>| {
        if !policy.selects(&name) {
            return;
        }
        let unit = sample
            .declared_unit(&name)
            .or_else(|| sample.declared_unit(field_name))
            .or_else(|| policy.unit_for(&name));
        shown.push(DisplayField {
            label: units::with_unit(&name, unit),
            name,
            values,
        });
    };

    for field in sample.fields() {
        match &field.data {
            FieldData::Scalar(values) => push(&field.name, field.name.clone(), values.iter().copied().collect()),
            FieldData::Vector(_) => {
                let display = policy.vector_display;
                if matches!(display, VectorDisplay::Magnitude | VectorDisplay::All) {
                    push(
                        &field.name,
                        format!("{}{}", field.name, MAGNITUDE_SUFFIX),
                        field.data.magnitude(),
                    );
                }
                for (axis, suffix) in COMPONENT_SUFFIXES.iter().enumerate() {
                    let wanted = match display {
                        VectorDisplay::All => true,
                        VectorDisplay::X => axis == 0,
                        VectorDisplay::Y => axis == 1,
                        VectorDisplay::Z => axis == 2,
                        VectorDisplay::Magnitude => false,
                    };
                    if let Some(values) = field.data.component(axis).filter(|_| wanted) {
                        push(&field.name, format!("{}{}", field.name, suffix), values);
                    }
                }
            }
        }
    }

    shown
}

/// Residual tables are plotted on a logarithmic scale
pub fn is_logarithmic(sample: &UnifiedSample) -> bool {
    let source = sample.source();
    matches!(sample.coordinates(), Coordinates::Index { .. })
        && (source.stem.starts_with("residual") || source.logical_name.starts_with("residual"))
}

/// `log10` for positive values, NaN otherwise
pub fn log_scale(value: f64) -> f64 {
    if value > 0.0 {
        value.log10()
    } else {
        f64::NAN
    }
}

/// Horizontal axis of a curve plot
#[derive(Debug, Clone, PartialEq)]
pub struct Abscissa {
    pub label: String,
    pub values: Vec<f64>,
}

/// Abscissa of a table or sampled line; `None` for mesh samples
///
/// Point coordinates are reduced to the axis along which they spread most.
pub fn abscissa(sample: &UnifiedSample, policy: &RenderPolicy) -> Option<Abscissa> {
    match sample.coordinates() {
        Coordinates::Index { label, values } => {
            let shown = policy.index_label(label);
            let unit = if &shown == label { policy.unit_for(label) } else { None };
            Some(Abscissa {
                label: units::with_unit(&shown, unit),
                values: values.iter().copied().collect(),
            })
        }
        Coordinates::Distance(values) => Some(Abscissa {
            label: units::with_unit("distance", policy.unit_for("distance")),
            values: values.iter().copied().collect(),
        }),
        Coordinates::Points { components, values } if sample.geometry().is_none() => {
            let spread = |axis: &Axis| {
                ValueRange::of(values.iter().map(|p| p[axis.index()])).map_or(0.0, |r| r.span())
            };
            let axis = Axis::ALL
                .iter()
                .take(*components)
                .copied()
                .fold(Axis::X, |best, a| if spread(&a) > spread(&best) { a } else { best });
            Some(Abscissa {
                label: units::with_unit(axis.label(), policy.unit_for(axis.label())),
                values: values.iter().map(|p| p[axis.index()]).collect(),
            })
        }
        Coordinates::Points { .. } => None,
    }
}

// =================================================================================================
// Requests
// =================================================================================================

fn title(sample: &UnifiedSample, frame: Option<f64>) -> String {
    let source = sample.source();
    let mut title = if source.logical_name == source.stem {
        source.stem.clone()
    } else {
        format!("{}: {}", source.logical_name, source.stem)
    };

    if let Some(time) = sample.time().filter(|&t| t != 0.0) {
        title.push_str(&format!(" (t = {})", time));
    }
    if let (Some(value), Coordinates::Index { label, .. }) = (frame, sample.coordinates()) {
        title.push_str(&format!(" ({} = {})", label, value));
    }
    title
}

/// Build the request for one frame
///
/// Returns `None` when nothing is left to draw: no records, or no field
/// surviving the policy.
pub fn build_request(
    sample: &UnifiedSample,
    policy: &RenderPolicy,
    domain: &SeriesDomain,
    frame: Option<f64>,
    output_path: PathBuf,
) -> Option<RenderRequest> {
    if sample.is_empty() {
        return None;
    }
    let fields = display_fields(sample, policy);
    if fields.is_empty() {
        return None;
    }

    let content = match sample.geometry() {
        Some(geometry) => RenderContent::Surface(surface_scene(geometry, &fields, policy, domain)),
        None => RenderContent::Curves(curve_scene(sample, &fields, policy, domain)?),
    };

    Some(RenderRequest {
        output_path,
        format: policy.image_format,
        size: (policy.width, policy.height),
        title: title(sample, frame),
        content,
    })
}

fn surface_scene(
    geometry: &MeshGeometry,
    fields: &[DisplayField],
    policy: &RenderPolicy,
    domain: &SeriesDomain,
) -> SurfaceScene {
    let cells: Vec<Vec<usize>> = if geometry.cells.is_empty() {
        (0..geometry.points.len()).map(|i| vec![i]).collect()
    } else {
        geometry.cells.clone()
    };

    let panels = fields
        .iter()
        .map(|field| {
            let values = match geometry.association {
                Association::Cell => field.values.clone(),
                Association::Point => cells
                    .iter()
                    .map(|cell| cell.iter().map(|&i| field.values[i]).sum::<f64>() / cell.len().max(1) as f64)
                    .collect(),
            };
            SurfacePanel {
                field: field.name.clone(),
                label: field.label.clone(),
                values,
                range: domain.field(&field.name),
            }
        })
        .collect();

    let bounds = domain.bounds().unwrap_or_else(|| {
        [0, 1, 2].map(|i| ValueRange::of(geometry.points.iter().map(|p| p[i])).unwrap_or_default())
    });
    let axis_labels = Axis::ALL.map(|a| units::with_unit(a.label(), policy.unit_for(a.label())));

    SurfaceScene {
        points: geometry.points.clone(),
        cells,
        projection: policy.projection(&geometry.points),
        bounds,
        axis_labels,
        panels,
    }
}

fn curve_scene(
    sample: &UnifiedSample,
    fields: &[DisplayField],
    policy: &RenderPolicy,
    domain: &SeriesDomain,
) -> Option<CurveScene> {
    let abscissa = abscissa(sample, policy)?;
    let log_y = is_logarithmic(sample);

    let curves = fields
        .iter()
        .map(|field| Curve {
            label: field.label.clone(),
            points: abscissa
                .values
                .iter()
                .zip(&field.values)
                .map(|(&x, &y)| (x, if log_y { log_scale(y) } else { y }))
                .collect(),
        })
        .collect();

    let y_label = match fields {
        _ if log_y => "Residual".to_string(),
        [single] => single.label.clone(),
        _ => "Value".to_string(),
    };

    Some(CurveScene {
        x_label: abscissa.label,
        y_label,
        x_range: domain.abscissa(),
        y_range: domain.union_of(fields.iter().map(|f| f.name.as_str())),
        log_y,
        curves,
    })
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{resolve, Compressibility, ContextFlags, Dimensionality, Projection, TimeRegime};
    use crate::sample::{Field, SampleMeta};
    use crate::scan::{ArtifactKind, ArtifactRef};
    use nalgebra::{DVector, Point3};
    use std::collections::BTreeMap;
    use std::path::Path;

    fn artifact(relative: &str, kind: ArtifactKind) -> ArtifactRef {
        ArtifactRef::from_path(Path::new("/case"), &Path::new("/case").join(relative), kind)
    }

    fn residuals() -> UnifiedSample {
        let source = artifact("postProcessing/residuals/0/residuals.dat", ArtifactKind::Table);
        UnifiedSample::new(
            SampleMeta { source, time: Some(0.0) },
            Coordinates::Index {
                label: "Time".into(),
                values: DVector::from_vec(vec![1.0, 2.0]),
            },
            vec![
                Field::new("p", FieldData::from_scalars(vec![1.0, 0.1]), "r"),
                Field::new("Ux", FieldData::from_scalars(vec![0.01, 0.001]), "r"),
            ],
        )
        .unwrap()
    }

    fn mesh() -> UnifiedSample {
        let source = artifact("postProcessing/surfaces/100/slice.vtk", ArtifactKind::Mesh);
        let points = vec![
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(1.0, 0.0, 0.5),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, 0.5),
        ];
        UnifiedSample::new(
            SampleMeta { source, time: Some(100.0) },
            Coordinates::Points {
                components: 3,
                values: points.clone(),
            },
            vec![
                Field::new("p", FieldData::from_scalars(vec![1.0, 2.0, 3.0, 4.0]), "m"),
                Field::new("rho", FieldData::from_scalars(vec![1.2; 4]), "m"),
                Field::new("U", FieldData::from_triples(vec![[3.0, 4.0, 0.0]; 4]), "m"),
            ],
        )
        .unwrap()
        .with_geometry(MeshGeometry {
            points,
            cells: vec![vec![0, 1, 2], vec![0, 2, 3]],
            association: Association::Point,
        })
    }

    fn policy(flags: ContextFlags) -> RenderPolicy {
        resolve(&flags)
    }

    fn names(fields: &[DisplayField]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_incompressible_hides_density() {
        let fields = display_fields(&mesh(), &RenderPolicy::default());
        assert_eq!(names(&fields), vec!["p", "U_mag"]);
        assert_eq!(fields[1].values, vec![5.0; 4]);
        assert_eq!(fields[0].label, "p [m2/s2]");

        let compressible = policy(ContextFlags {
            compressibility: Some(Compressibility::Compressible),
            ..Default::default()
        });
        let fields = display_fields(&mesh(), &compressible);
        assert_eq!(names(&fields), vec!["p", "rho", "U_mag"]);
        assert_eq!(fields[0].label, "p [Pa]");
    }

    #[test]
    fn test_vector_display_modes() {
        let all = policy(ContextFlags {
            vector_display: Some(VectorDisplay::All),
            ..Default::default()
        });
        assert_eq!(names(&display_fields(&mesh(), &all)), vec!["p", "U_mag", "U_x", "U_y", "U_z"]);

        let y = policy(ContextFlags {
            vector_display: Some(VectorDisplay::Y),
            fields: Some(vec!["U".into()]),
            ..Default::default()
        });
        let fields = display_fields(&mesh(), &y);
        assert_eq!(names(&fields), vec!["U_y"]);
        assert_eq!(fields[0].values, vec![4.0; 4]);
    }

    #[test]
    fn test_declared_units_win() {
        let sample = residuals().with_units(BTreeMap::from([("p".to_string(), "-".to_string())]));
        let fields = display_fields(&sample, &RenderPolicy::default());
        assert_eq!(fields[0].label, "p [-]");
    }

    #[test]
    fn test_residuals_are_logarithmic() {
        let sample = residuals();
        assert!(is_logarithmic(&sample));

        let policy = RenderPolicy::default();
        let domain = SeriesDomain::from_samples([&sample], &policy);
        let request = build_request(&sample, &policy, &domain, None, PathBuf::from("/out/r.png")).unwrap();

        let RenderContent::Curves(scene) = request.content else {
            panic!("expected curves");
        };
        assert!(scene.log_y);
        assert_eq!(scene.x_label, "Iterations");
        assert_eq!(scene.curves.len(), 2);
        assert!((scene.curves[0].points[1].1 - (-1.0)).abs() < 1e-12);
        assert!((scene.y_range.min - (-3.0)).abs() < 1e-12);
        assert!(scene.y_range.max.abs() < 1e-12);
    }

    #[test]
    fn test_transient_keeps_time_label() {
        let transient = policy(ContextFlags {
            regime: Some(TimeRegime::Transient),
            ..Default::default()
        });
        let label = abscissa(&residuals(), &transient).unwrap().label;
        assert_eq!(label, "Time [s]");
    }

    #[test]
    fn test_point_data_averaged_per_cell() {
        let sample = mesh();
        let policy = RenderPolicy::default();
        let domain = SeriesDomain::from_samples([&sample], &policy);
        let request = build_request(&sample, &policy, &domain, None, PathBuf::from("/out/s.png")).unwrap();

        let RenderContent::Surface(scene) = request.content else {
            panic!("expected surface");
        };
        let fields: Vec<&str> = scene.panels.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["p", "U_mag"]);
        assert_eq!(scene.panels[0].values, vec![2.0, 8.0 / 3.0]);
        assert_eq!(scene.panels[0].range, ValueRange { min: 1.0, max: 4.0 });
        assert_eq!(scene.projection, Projection::Spatial);
        assert_eq!(request.title, "surfaces: slice (t = 100)");
    }

    #[test]
    fn test_two_dimensional_projection_drops_flat_axis() {
        let sample = mesh();
        let policy = policy(ContextFlags {
            dimensionality: Some(Dimensionality::Two),
            ..Default::default()
        });
        let domain = SeriesDomain::from_samples([&sample], &policy);
        let request = build_request(&sample, &policy, &domain, None, PathBuf::from("/out/s.png")).unwrap();

        let RenderContent::Surface(scene) = request.content else {
            panic!("expected surface");
        };
        assert_eq!(scene.projection, Projection::Planar { dropped: Axis::Z });
        assert_eq!(scene.points.len(), sample.len());
    }

    #[test]
    fn test_nothing_left_to_draw() {
        let only_t = policy(ContextFlags {
            fields: Some(vec!["T".into()]),
            ..Default::default()
        });
        let sample = mesh();
        let domain = SeriesDomain::from_samples([&sample], &only_t);
        assert!(build_request(&sample, &only_t, &domain, None, PathBuf::from("/out/s.png")).is_none());
    }
}
