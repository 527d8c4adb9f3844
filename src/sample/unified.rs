//! The unified sample container
//!
//! All three parsers produce a [`UnifiedSample`]: an ordered sequence of
//! records, each a coordinate plus one value per field. Storage is columnar
//! (one [`FieldData`] per field) and a record view is assembled on demand.

use nalgebra::{DVector, Point3};
use std::collections::{BTreeMap, HashSet};

use super::field::{Field, FieldValue};
use crate::error::{PostError, PostResult};
use crate::scan::ArtifactRef;

// =================================================================================================
// Coordinates
// =================================================================================================

/// Record coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinates {
    /// Table index column (time or iteration)
    Index { label: String, values: DVector<f64> },

    /// Abscissa along a sampled line
    Distance(DVector<f64>),

    /// Spatial points; `components` is how many coordinates the source carried
    /// (missing ones are stored as 0)
    Points {
        components: usize,
        values: Vec<Point3<f64>>,
    },
}

impl Coordinates {
    pub fn len(&self) -> usize {
        match self {
            Coordinates::Index { values, .. } => values.len(),
            Coordinates::Distance(values) => values.len(),
            Coordinates::Points { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of coordinate components per record
    pub fn dimensionality(&self) -> usize {
        match self {
            Coordinates::Index { .. } | Coordinates::Distance(_) => 1,
            Coordinates::Points { components, .. } => *components,
        }
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        match self {
            Coordinates::Index { values, .. } => values.get(index).copied().map(Coordinate::Index),
            Coordinates::Distance(values) => values.get(index).copied().map(Coordinate::Distance),
            Coordinates::Points { values, .. } => values.get(index).copied().map(Coordinate::Point),
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        let pick = |v: &DVector<f64>| DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i]));
        match self {
            Coordinates::Index { label, values } => Coordinates::Index {
                label: label.clone(),
                values: pick(values),
            },
            Coordinates::Distance(values) => Coordinates::Distance(pick(values)),
            Coordinates::Points { components, values } => Coordinates::Points {
                components: *components,
                values: indices.iter().map(|&i| values[i]).collect(),
            },
        }
    }
}

/// Coordinate of a single record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Index(f64),
    Distance(f64),
    Point(Point3<f64>),
}

// =================================================================================================
// Mesh geometry
// =================================================================================================

/// Which mesh entity the records of a mesh sample are attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Point,
    Cell,
}

/// Geometry carried by mesh samples, kept for drawing
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub points: Vec<Point3<f64>>,
    /// Point indices of every cell (vertex, line or polygon)
    pub cells: Vec<Vec<usize>>,
    pub association: Association,
}

impl MeshGeometry {
    /// Centroid of every cell
    pub fn cell_centroids(&self) -> Vec<Point3<f64>> {
        self.cells
            .iter()
            .map(|cell| {
                let sum = cell
                    .iter()
                    .fold(nalgebra::Vector3::<f64>::zeros(), |acc, &i| acc + self.points[i].coords);
                Point3::from(sum / cell.len().max(1) as f64)
            })
            .collect()
    }
}

// =================================================================================================
// Unified sample
// =================================================================================================

/// Metadata attached to a sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMeta {
    pub source: ArtifactRef,
    /// Time of the sample when it is one instant of a transient series
    pub time: Option<f64>,
}

/// One record: a coordinate and a value for every field
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub coordinate: Coordinate,
    pub values: Vec<(&'a str, FieldValue)>,
}

/// Parsed artifact, ready for rendering
///
/// # Invariant
///
/// Every field holds exactly `coordinates.len()` values and field names are
/// unique, so all records share the same field set. The type offers no
/// mutation once built.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedSample {
    meta: SampleMeta,
    coordinates: Coordinates,
    fields: Vec<Field>,
    geometry: Option<MeshGeometry>,
    units: BTreeMap<String, String>,
}

impl UnifiedSample {
    /// Build a sample, checking the record invariant
    ///
    /// # Errors
    ///
    /// `MalformedArtifact` if a field length differs from the record count or
    /// two fields share a name.
    pub fn new(meta: SampleMeta, coordinates: Coordinates, fields: Vec<Field>) -> PostResult<Self> {
        let n = coordinates.len();
        let mut names = HashSet::new();

        for field in &fields {
            if field.len() != n {
                return Err(PostError::malformed(
                    &meta.source.path,
                    format!("field '{}' has {} values for {} records", field.name, field.len(), n),
                ));
            }
            if !names.insert(field.name.as_str()) {
                return Err(PostError::malformed(
                    &meta.source.path,
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }

        Ok(Self {
            meta,
            coordinates,
            fields,
            geometry: None,
            units: BTreeMap::new(),
        })
    }

    /// Attach mesh geometry
    pub fn with_geometry(mut self, geometry: MeshGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Attach units declared by the source (column name → unit)
    pub fn with_units(mut self, units: BTreeMap<String, String>) -> Self {
        self.units = units;
        self
    }

    pub fn meta(&self) -> &SampleMeta {
        &self.meta
    }

    pub fn source(&self) -> &ArtifactRef {
        &self.meta.source
    }

    pub fn time(&self) -> Option<f64> {
        self.meta.time
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn geometry(&self) -> Option<&MeshGeometry> {
        self.geometry.as_ref()
    }

    /// Unit declared by the source for `name`, if any
    pub fn declared_unit(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }

    /// Number of coordinate components
    pub fn dimensionality(&self) -> usize {
        self.coordinates.dimensionality()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Record view at `index`
    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        let coordinate = self.coordinates.get(index)?;
        let values = self
            .fields
            .iter()
            .filter_map(|f| f.data.value(index).map(|v| (f.name.as_str(), v)))
            .collect();
        Some(Record { coordinate, values })
    }

    /// Iterate over all records in order
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    /// The first `n` records as a new sample (transient table frames)
    pub fn prefix(&self, n: usize) -> Self {
        let indices: Vec<usize> = (0..n.min(self.len())).collect();
        Self {
            meta: self.meta.clone(),
            coordinates: self.coordinates.select(&indices),
            fields: self
                .fields
                .iter()
                .map(|f| Field::new(f.name.clone(), f.data.select(&indices), f.origin.clone()))
                .collect(),
            geometry: self.geometry.clone(),
            units: self.units.clone(),
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
