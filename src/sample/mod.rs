//! Unified sample model
//!
//! The common in-memory representation produced by every parser and read by
//! the renderer.
//!
//! # Core Concepts
//!
//! - **Field**: named scalar or 3-vector quantity, one value per record
//! - **Coordinates**: table index, line abscissa, or 3-D points
//! - **UnifiedSample**: coordinates + fields + metadata (+ mesh geometry)
//!
//! # Example
//!
//! ```rust
//! use ofpost_rs::sample::{Coordinates, Field, FieldData, SampleMeta, UnifiedSample};
//! use ofpost_rs::scan::{ArtifactKind, ArtifactRef};
//! use nalgebra::DVector;
//! use std::path::Path;
//!
//! let source = ArtifactRef::from_path(Path::new("/case"), Path::new("/case/r.dat"), ArtifactKind::Table);
//! let sample = UnifiedSample::new(
//!     SampleMeta { source, time: None },
//!     Coordinates::Index { label: "Time".into(), values: DVector::from_vec(vec![1.0, 2.0]) },
//!     vec![Field::new("Ux", FieldData::from_scalars(vec![1e-2, 1e-3]), "/case/r.dat")],
//! ).unwrap();
//!
//! assert_eq!(sample.records().count(), 2);
//! ```

pub mod field;
pub mod unified;

pub use field::{Field, FieldData, FieldValue, COMPONENT_SUFFIXES, MAGNITUDE_SUFFIX};
pub use unified::{
    Association, Coordinate, Coordinates, MeshGeometry, Record, SampleMeta, UnifiedSample,
};
