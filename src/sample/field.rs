//! Field data types
//!
//! A field is one named quantity sampled on every record of a
//! [`UnifiedSample`](super::UnifiedSample). It is either a scalar or a
//! 3-component vector; no other arity exists in the model.

use nalgebra::{DVector, Vector3};
use std::fmt;
use std::path::PathBuf;

/// Component suffixes used when a vector is split for display
pub const COMPONENT_SUFFIXES: [&str; 3] = ["_x", "_y", "_z"];

/// Suffix used for the magnitude of a vector
pub const MAGNITUDE_SUFFIX: &str = "_mag";

/// Per-record values of one field
///
/// # Storage Types
///
/// - **Scalar**: one `f64` per record
/// - **Vector**: one `Vector3<f64>` per record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Scalar(DVector<f64>),
    Vector(Vec<Vector3<f64>>),
}

impl FieldData {
    /// Create scalar data from a plain vec
    pub fn from_scalars(values: Vec<f64>) -> Self {
        Self::Scalar(DVector::from_vec(values))
    }

    /// Create vector data from `[x, y, z]` triples
    pub fn from_triples(values: Vec<[f64; 3]>) -> Self {
        Self::Vector(values.into_iter().map(Vector3::from).collect())
    }

    /// 1 for scalars, 3 for vectors
    pub fn arity(&self) -> usize {
        match self {
            FieldData::Scalar(_) => 1,
            FieldData::Vector(_) => 3,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            FieldData::Scalar(v) => v.len(),
            FieldData::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of record `index`
    pub fn value(&self, index: usize) -> Option<FieldValue> {
        match self {
            FieldData::Scalar(v) => v.get(index).copied().map(FieldValue::Scalar),
            FieldData::Vector(v) => v.get(index).copied().map(FieldValue::Vector),
        }
    }

    /// Euclidean magnitude per record (identity for scalars)
    pub fn magnitude(&self) -> Vec<f64> {
        match self {
            FieldData::Scalar(v) => v.iter().copied().collect(),
            FieldData::Vector(v) => v.iter().map(|u| u.norm()).collect(),
        }
    }

    /// One component per record; `None` for scalars
    pub fn component(&self, axis: usize) -> Option<Vec<f64>> {
        match self {
            FieldData::Scalar(_) => None,
            FieldData::Vector(v) => Some(v.iter().map(|u| u[axis]).collect()),
        }
    }

    /// Keep only the records whose index is listed
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            FieldData::Scalar(v) => {
                FieldData::Scalar(DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i])))
            }
            FieldData::Vector(v) => FieldData::Vector(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Value of one field at one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Scalar(f64),
    Vector(Vector3<f64>),
}

impl FieldValue {
    pub fn magnitude(&self) -> f64 {
        match self {
            FieldValue::Scalar(s) => *s,
            FieldValue::Vector(v) => v.norm(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(s) => write!(f, "{}", s),
            FieldValue::Vector(v) => write!(f, "({} {} {})", v.x, v.y, v.z),
        }
    }
}

/// A named quantity attached to the records of a sample
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data: FieldData,
    /// Artifact the values were read from
    pub origin: PathBuf,
}

impl Field {
    pub fn new(name: impl Into<String>, data: FieldData, origin: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data,
            origin: origin.into(),
        }
    }

    pub fn arity(&self) -> usize {
        self.data.arity()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.data, FieldData::Vector(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_and_len() {
        let s = FieldData::from_scalars(vec![1.0, 2.0]);
        let v = FieldData::from_triples(vec![[1.0, 0.0, 0.0]; 4]);
        assert_eq!((s.arity(), s.len()), (1, 2));
        assert_eq!((v.arity(), v.len()), (3, 4));
    }

    #[test]
    fn test_magnitude_and_component() {
        let v = FieldData::from_triples(vec![[3.0, 4.0, 0.0], [0.0, 0.0, 2.0]]);
        assert_eq!(v.magnitude(), vec![5.0, 2.0]);
        assert_eq!(v.component(2), Some(vec![0.0, 2.0]));
        assert_eq!(FieldData::from_scalars(vec![1.0]).component(0), None);
    }

    #[test]
    fn test_select_keeps_order() {
        let s = FieldData::from_scalars(vec![10.0, 20.0, 30.0]);
        assert_eq!(s.select(&[2, 0]), FieldData::from_scalars(vec![30.0, 10.0]));
    }

    #[test]
    fn test_value_out_of_range() {
        let s = FieldData::from_scalars(vec![1.0]);
        assert_eq!(s.value(0), Some(FieldValue::Scalar(1.0)));
        assert_eq!(s.value(1), None);
    }
}
