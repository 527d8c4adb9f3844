//! Simulation context → rendering policy
//!
//! The caller supplies a few simulation-context flags ([`ContextFlags`]);
//! [`resolve`] turns them into an immutable [`RenderPolicy`] once per run.
//! Every decision is table-driven from the flags; the only data-dependent
//! step is locating the slice plane of a 2-D sample
//! ([`RenderPolicy::projection`]).
//!
//! # Defaults
//!
//! | Flag | Default |
//! |------|---------|
//! | dimensionality | 3-D |
//! | regime | steady |
//! | compressibility | incompressible |
//! | image format | PNG |
//! | vector display | magnitude |
//! | image size | 1024 × 768 |
//!
//! # Example
//!
//! ```rust
//! use ofpost_rs::context::{resolve, ContextFlags, Dimensionality};
//!
//! let flags = ContextFlags {
//!     dimensionality: Some(Dimensionality::Two),
//!     ..Default::default()
//! };
//! let policy = resolve(&flags);
//! assert!(policy.is_two_dimensional());
//! assert!(!policy.is_transient());
//! ```

pub mod units;

use nalgebra::Point3;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{PostError, PostResult};

// =================================================================================================
// Flags
// =================================================================================================

/// Spatial dimensionality of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Dimensionality {
    #[serde(rename = "2d", alias = "2D")]
    Two,
    #[default]
    #[serde(rename = "3d", alias = "3D")]
    Three,
}

/// Steady (single converged state) or transient (time-indexed) results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRegime {
    #[default]
    Steady,
    Transient,
}

/// Compressibility regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compressibility {
    Compressible,
    #[default]
    Incompressible,
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Bmp,
    Jpeg,
    Svg,
}

impl ImageFormat {
    /// File extension, which also selects the bitmap encoder
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Svg => "svg",
        }
    }

    /// Parse a user-supplied format name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().trim_start_matches('.') {
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How vector fields are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDisplay {
    #[default]
    Magnitude,
    X,
    Y,
    Z,
    /// Magnitude followed by the three components
    All,
}

/// Caller-supplied simulation context; absent flags take the documented defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextFlags {
    pub dimensionality: Option<Dimensionality>,
    pub regime: Option<TimeRegime>,
    pub compressibility: Option<Compressibility>,
    pub image_format: Option<ImageFormat>,
    pub vector_display: Option<VectorDisplay>,
    /// Restrict rendering to these fields (base names or displayed names)
    pub fields: Option<Vec<String>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ContextFlags {
    /// Load flags from a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Configuration` if it does not parse.
    pub fn from_toml_file(path: &Path) -> PostResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PostError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PostResult<Self> {
        toml::from_str(content).map_err(|e| PostError::Configuration(e.to_string()))
    }

    /// Flags set in `other` take precedence over the ones in `self`
    pub fn merge(self, other: ContextFlags) -> Self {
        Self {
            dimensionality: other.dimensionality.or(self.dimensionality),
            regime: other.regime.or(self.regime),
            compressibility: other.compressibility.or(self.compressibility),
            image_format: other.image_format.or(self.image_format),
            vector_display: other.vector_display.or(self.vector_display),
            fields: other.fields.or(self.fields),
            width: other.width.or(self.width),
            height: other.height.or(self.height),
        }
    }
}

// =================================================================================================
// Projection
// =================================================================================================

/// Cartesian axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// How 3-D mesh points are mapped onto the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// 2-D: the `dropped` axis is removed
    Planar { dropped: Axis },
    /// 3-D: all axes retained
    Spatial,
}

impl Projection {
    /// The two axes kept by a planar projection, in x, y, z order
    pub fn kept_axes(&self) -> Option<(Axis, Axis)> {
        match self {
            Projection::Planar { dropped } => {
                let mut kept = Axis::ALL.iter().copied().filter(|a| a != dropped);
                Some((kept.next()?, kept.next()?))
            }
            Projection::Spatial => None,
        }
    }

    /// Project a point onto the kept axes (identity order for `Spatial`, z dropped)
    pub fn project(&self, p: &Point3<f64>) -> (f64, f64) {
        match self.kept_axes() {
            Some((a, b)) => (p[a.index()], p[b.index()]),
            None => (p.x, p.y),
        }
    }
}

/// Relative extent under which an axis counts as flat
const FLAT_TOLERANCE: f64 = 1e-9;

/// Axis orthogonal to the slice plane of `points`
///
/// An axis is flat when its extent is at most `FLAT_TOLERANCE` times the
/// bounding-box diagonal. Among flat axes Z is preferred, then Y, then X;
/// with no flat axis the smallest extent wins under the same preference.
pub fn slice_normal(points: &[Point3<f64>]) -> Axis {
    if points.is_empty() {
        return Axis::Z;
    }

    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    let extent = max - min;
    let tolerance = FLAT_TOLERANCE * extent.norm();

    let flat: Vec<Axis> = Axis::ALL
        .iter()
        .copied()
        .filter(|a| extent[a.index()] <= tolerance)
        .collect();
    if let Some(axis) = flat.last() {
        return *axis;
    }

    Axis::ALL
        .iter()
        .copied()
        .fold(Axis::X, |best, a| {
            if extent[a.index()] <= extent[best.index()] {
                a
            } else {
                best
            }
        })
}

// =================================================================================================
// Policy
// =================================================================================================

/// Resolved, immutable rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPolicy {
    pub dimensionality: Dimensionality,
    pub regime: TimeRegime,
    pub compressibility: Compressibility,
    pub image_format: ImageFormat,
    pub vector_display: VectorDisplay,
    pub fields: Option<Vec<String>>,
    pub width: u32,
    pub height: u32,
}

/// Default image width in pixels
pub const DEFAULT_WIDTH: u32 = 1024;

/// Default image height in pixels
pub const DEFAULT_HEIGHT: u32 = 768;

/// Resolve flags into a policy; absent flags take the documented defaults
pub fn resolve(flags: &ContextFlags) -> RenderPolicy {
    RenderPolicy {
        dimensionality: flags.dimensionality.unwrap_or_default(),
        regime: flags.regime.unwrap_or_default(),
        compressibility: flags.compressibility.unwrap_or_default(),
        image_format: flags.image_format.unwrap_or_default(),
        vector_display: flags.vector_display.unwrap_or_default(),
        fields: flags.fields.clone(),
        width: flags.width.unwrap_or(DEFAULT_WIDTH),
        height: flags.height.unwrap_or(DEFAULT_HEIGHT),
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        resolve(&ContextFlags::default())
    }
}

impl RenderPolicy {
    pub fn is_two_dimensional(&self) -> bool {
        self.dimensionality == Dimensionality::Two
    }

    pub fn is_transient(&self) -> bool {
        self.regime == TimeRegime::Transient
    }

    /// Check that the requested combination is coherent
    ///
    /// # Errors
    ///
    /// `Configuration` for a zero image size or when an explicitly requested
    /// field is compressible-only while the regime is incompressible.
    pub fn validate(&self) -> PostResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PostError::Configuration(format!(
                "image size {}x{} is empty",
                self.width, self.height
            )));
        }

        if self.compressibility == Compressibility::Incompressible {
            if let Some(fields) = &self.fields {
                if let Some(name) = fields.iter().find(|f| units::is_compressible_only(f)) {
                    return Err(PostError::Configuration(format!(
                        "field '{}' was requested but only exists in compressible simulations",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether the regime rules a field out regardless of the data
    pub fn excludes(&self, name: &str) -> bool {
        self.compressibility == Compressibility::Incompressible && units::is_compressible_only(name)
    }

    /// Whether a field is a rendering candidate
    pub fn selects(&self, name: &str) -> bool {
        if self.excludes(name) {
            return false;
        }
        match &self.fields {
            Some(wanted) => wanted
                .iter()
                .any(|w| w == name || w == units::base_name(name)),
            None => true,
        }
    }

    /// Projection for a mesh sample with the given points
    pub fn projection(&self, points: &[Point3<f64>]) -> Projection {
        match self.dimensionality {
            Dimensionality::Two => Projection::Planar {
                dropped: slice_normal(points),
            },
            Dimensionality::Three => Projection::Spatial,
        }
    }

    /// Display label of a table index column
    pub fn index_label(&self, label: &str) -> String {
        if self.regime == TimeRegime::Steady && label == "Time" {
            "Iterations".to_string()
        } else {
            label.to_string()
        }
    }

    /// Unit for a field or column name under this policy's regime
    pub fn unit_for(&self, name: &str) -> Option<&'static str> {
        units::unit_for(name, self.compressibility)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let policy = resolve(&ContextFlags::default());
        assert_eq!(policy.dimensionality, Dimensionality::Three);
        assert_eq!(policy.regime, TimeRegime::Steady);
        assert_eq!(policy.compressibility, Compressibility::Incompressible);
        assert_eq!(policy.image_format, ImageFormat::Png);
        assert_eq!(policy.vector_display, VectorDisplay::Magnitude);
        assert_eq!((policy.width, policy.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_incompressible_excludes_density() {
        let policy = RenderPolicy::default();
        assert!(policy.excludes("rho"));
        assert!(!policy.selects("rho"));
        assert!(policy.selects("U"));

        let compressible = resolve(&ContextFlags {
            compressibility: Some(Compressibility::Compressible),
            ..Default::default()
        });
        assert!(compressible.selects("rho"));
    }

    #[test]
    fn test_field_list_selection() {
        let policy = resolve(&ContextFlags {
            fields: Some(vec!["U".into()]),
            ..Default::default()
        });
        assert!(policy.selects("U"));
        assert!(policy.selects("U_x"));
        assert!(!policy.selects("p"));
    }

    #[test]
    fn test_conflicting_flags_are_configuration_errors() {
        let policy = resolve(&ContextFlags {
            fields: Some(vec!["rho".into()]),
            ..Default::default()
        });
        assert!(matches!(policy.validate(), Err(PostError::Configuration(_))));

        let policy = resolve(&ContextFlags {
            width: Some(0),
            ..Default::default()
        });
        assert!(matches!(policy.validate(), Err(PostError::Configuration(_))));
    }

    #[test]
    fn test_slice_normal_detection() {
        let xy: Vec<Point3<f64>> = vec![
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(1.0, 0.0, 0.5),
            Point3::new(0.0, 2.0, 0.5),
        ];
        assert_eq!(slice_normal(&xy), Axis::Z);

        let xz: Vec<Point3<f64>> = vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 3.0),
        ];
        assert_eq!(slice_normal(&xz), Axis::Y);
    }

    #[test]
    fn test_slice_normal_ties_prefer_z() {
        // a line along x is flat in both y and z
        let line: Vec<Point3<f64>> = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(slice_normal(&line), Axis::Z);

        // no flat axis, equal extents
        let cube: Vec<Point3<f64>> = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        assert_eq!(slice_normal(&cube), Axis::Z);
    }

    #[test]
    fn test_projection_drops_one_axis() {
        let policy = resolve(&ContextFlags {
            dimensionality: Some(Dimensionality::Two),
            ..Default::default()
        });
        let points = vec![Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 1.0, 3.0)];
        let projection = policy.projection(&points);

        assert_eq!(projection, Projection::Planar { dropped: Axis::Y });
        assert_eq!(projection.kept_axes(), Some((Axis::X, Axis::Z)));
        assert_eq!(projection.project(&points[1]), (1.0, 3.0));

        assert_eq!(RenderPolicy::default().projection(&points), Projection::Spatial);
    }

    #[test]
    fn test_index_label_follows_regime() {
        assert_eq!(RenderPolicy::default().index_label("Time"), "Iterations");
        let transient = resolve(&ContextFlags {
            regime: Some(TimeRegime::Transient),
            ..Default::default()
        });
        assert_eq!(transient.index_label("Time"), "Time");
    }

    #[test]
    fn test_flags_from_toml_and_merge() {
        let file = ContextFlags::from_toml_str(
            r#"
            dimensionality = "2d"
            regime = "transient"
            image_format = "svg"
            "#,
        )
        .unwrap();
        assert_eq!(file.dimensionality, Some(Dimensionality::Two));
        assert_eq!(file.image_format, Some(ImageFormat::Svg));

        let cli = ContextFlags {
            image_format: Some(ImageFormat::Bmp),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.image_format, Some(ImageFormat::Bmp));
        assert_eq!(merged.regime, Some(TimeRegime::Transient));
    }

    #[test]
    fn test_unknown_toml_key_is_configuration_error() {
        let err = ContextFlags::from_toml_str("colour = \"red\"");
        assert!(matches!(err, Err(PostError::Configuration(_))));
    }

    #[test]
    fn test_image_format_names() {
        assert_eq!(ImageFormat::from_name("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_name(".png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_name("gif"), None);
    }
}
