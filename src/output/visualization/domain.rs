//! Value ranges shared by every frame of a series
//!
//! A transient series is rendered frame by frame, but all frames must use the
//! same color scale and axes to be comparable. [`SeriesDomain`] is computed
//! once over every sample of the series and then handed, read-only, to the
//! request builder of each frame.

use std::collections::BTreeMap;
use std::ops::Range;

use super::scene::{abscissa, display_fields, is_logarithmic, log_scale};
use crate::context::RenderPolicy;
use crate::sample::UnifiedSample;

// =================================================================================================
// Value range
// =================================================================================================

/// Closed interval `[min, max]` with `min < max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl ValueRange {
    /// Range of the finite values, `None` if there are none
    ///
    /// A degenerate range (all values equal) is widened symmetrically around
    /// the value: by 10 % of its magnitude, or by 1 around zero.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if min > max {
            return None;
        }
        Some(Self { min, max }.widened())
    }

    fn widened(self) -> Self {
        if self.max > self.min {
            return self;
        }
        let half = if self.min == 0.0 { 1.0 } else { self.min.abs() * 0.1 };
        Self {
            min: self.min - half,
            max: self.max + half,
        }
    }

    /// Smallest range containing both
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow both ends by `fraction` of the span
    pub fn padded(self, fraction: f64) -> Self {
        let pad = (self.max - self.min) * fraction;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `value` in the range, 0 at `min` and 1 at `max`
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    pub fn as_range(&self) -> Range<f64> {
        self.min..self.max
    }
}

// =================================================================================================
// Series domain
// =================================================================================================

/// Immutable ranges for one series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesDomain {
    /// Range per displayed field name
    fields: BTreeMap<String, ValueRange>,
    /// Range of the curve abscissa
    abscissa: Option<ValueRange>,
    /// Bounding box of mesh points
    bounds: Option<[ValueRange; 3]>,
}

impl SeriesDomain {
    /// Compute the domain over all samples of a series
    ///
    /// Values are taken after the transformation they are drawn with
    /// (`log10` for residual plots).
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a UnifiedSample>, policy: &RenderPolicy) -> Self {
        let mut domain = Self::default();

        for sample in samples {
            let log = is_logarithmic(sample);

            for field in display_fields(sample, policy) {
                let values = field.values.iter().map(|&v| if log { log_scale(v) } else { v });
                if let Some(range) = ValueRange::of(values) {
                    domain
                        .fields
                        .entry(field.name)
                        .and_modify(|r| *r = r.union(range))
                        .or_insert(range);
                }
            }

            if let Some(geometry) = sample.geometry() {
                let axes = [0, 1, 2].map(|i| ValueRange::of(geometry.points.iter().map(|p| p[i])));
                if let [Some(x), Some(y), Some(z)] = axes {
                    let bounds = [x, y, z];
                    domain.bounds = Some(match domain.bounds {
                        Some(old) => [0, 1, 2].map(|i| old[i].union(bounds[i])),
                        None => bounds,
                    });
                }
            } else if let Some(x) = abscissa(sample, policy).and_then(|a| ValueRange::of(a.values)) {
                domain.abscissa = Some(domain.abscissa.map_or(x, |old| old.union(x)));
            }
        }

        domain
    }

    /// Range of a displayed field; the unit range when the field never had a
    /// finite value
    pub fn field(&self, name: &str) -> ValueRange {
        self.fields.get(name).copied().unwrap_or_default()
    }

    /// Union of the ranges of several fields
    pub fn union_of<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ValueRange {
        names
            .into_iter()
            .filter_map(|n| self.fields.get(n).copied())
            .reduce(ValueRange::union)
            .unwrap_or_default()
    }

    pub fn abscissa(&self) -> ValueRange {
        self.abscissa.unwrap_or_default()
    }

    pub fn bounds(&self) -> Option<[ValueRange; 3]> {
        self.bounds
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Coordinates, Field, FieldData, SampleMeta};
    use crate::scan::{ArtifactKind, ArtifactRef};
    use nalgebra::DVector;
    use std::path::Path;

    fn line_sample(time: &str, values: Vec<f64>) -> UnifiedSample {
        let path = Path::new("/case/postProcessing/sets").join(time).join("line_T.xy");
        let artifact = ArtifactRef::from_path(Path::new("/case"), &path, ArtifactKind::SampledLine);
        let n = values.len();
        UnifiedSample::new(
            SampleMeta {
                time: artifact.time_value(),
                source: artifact,
            },
            Coordinates::Distance(DVector::from_iterator(n, (0..n).map(|i| i as f64))),
            vec![Field::new("T", FieldData::from_scalars(values), &path)],
        )
        .unwrap()
    }

    #[test]
    fn test_range_ignores_non_finite() {
        let range = ValueRange::of(vec![1.0, f64::NAN, -2.0, f64::INFINITY]).unwrap();
        assert_eq!(range, ValueRange { min: -2.0, max: 1.0 });
        assert!(ValueRange::of(vec![f64::NAN]).is_none());
    }

    #[test]
    fn test_degenerate_range_is_widened_symmetrically() {
        let range = ValueRange::of(vec![300.0, 300.0]).unwrap();
        assert_eq!(range, ValueRange { min: 270.0, max: 330.0 });

        let zero = ValueRange::of(vec![0.0]).unwrap();
        assert_eq!(zero, ValueRange { min: -1.0, max: 1.0 });
    }

    #[test]
    fn test_normalize() {
        let range = ValueRange { min: 10.0, max: 20.0 };
        assert_eq!(range.normalize(15.0), 0.5);
        assert_eq!(range.padded(0.1), ValueRange { min: 9.0, max: 21.0 });
    }

    #[test]
    fn test_domain_spans_every_frame() {
        let frames = vec![
            line_sample("1", vec![300.0, 310.0]),
            line_sample("2", vec![290.0, 305.0, 350.0]),
        ];
        let domain = SeriesDomain::from_samples(&frames, &RenderPolicy::default());

        assert_eq!(domain.field("T"), ValueRange { min: 290.0, max: 350.0 });
        assert_eq!(domain.abscissa(), ValueRange { min: 0.0, max: 2.0 });
        assert_eq!(domain.field("missing"), ValueRange::default());
        assert!(domain.bounds().is_none());
    }
}
