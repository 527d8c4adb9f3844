//! Polygonal surface parser (`.vtk`, `.vtp`)
//!
//! Surface and slice outputs come in two encodings, told apart by their
//! first bytes ([`MeshEncoding::sniff`]):
//!
//! - [`legacy`]: `# vtk DataFile` text header, ASCII or big-endian BINARY body
//! - [`xml`]: `<VTKFile type="PolyData">` with ascii, inline base64 or
//!   appended payloads
//!
//! Both readers fill a [`RawMesh`]; [`RawMesh::into_sample`] then checks it
//! and picks the records. Cell data wins over point data when a file carries
//! both, so records are cells (coordinate = centroid) or points.

pub mod legacy;
pub mod xml;

use nalgebra::Point3;

use tracing::debug;

use crate::error::{PostError, PostResult};
use crate::sample::{
    Association, Coordinates, Field, FieldData, MeshGeometry, SampleMeta, UnifiedSample,
};
use crate::scan::ArtifactRef;

// =================================================================================================
// Encoding detection
// =================================================================================================

/// Closed set of mesh encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshEncoding {
    Legacy,
    Xml,
}

impl MeshEncoding {
    /// Detect the encoding from the leading bytes of a file
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        let head = &bytes[start..];

        if head.starts_with(b"# vtk DataFile") {
            Some(MeshEncoding::Legacy)
        } else if head.starts_with(b"<?xml") || head.starts_with(b"<VTKFile") {
            Some(MeshEncoding::Xml)
        } else {
            None
        }
    }
}

/// Parse a mesh artifact from disk
pub fn parse(artifact: &ArtifactRef) -> PostResult<UnifiedSample> {
    let bytes = std::fs::read(&artifact.path).map_err(|e| PostError::io(&artifact.path, e))?;
    parse_bytes(artifact, &bytes)
}

/// Parse mesh content already in memory
pub fn parse_bytes(artifact: &ArtifactRef, bytes: &[u8]) -> PostResult<UnifiedSample> {
    let path = artifact.path.as_path();
    let raw = match MeshEncoding::sniff(bytes) {
        Some(MeshEncoding::Legacy) => legacy::read(path, bytes)?,
        Some(MeshEncoding::Xml) => xml::read(path, bytes)?,
        None => return Err(PostError::unsupported(path, "unknown mesh signature")),
    };
    raw.into_sample(artifact)
}

// =================================================================================================
// Binary numbers
// =================================================================================================

/// Numeric element type of a binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl NumericType {
    /// Type names of the legacy format
    pub fn from_legacy(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "char" => NumericType::I8,
            "unsigned_char" => NumericType::U8,
            "short" => NumericType::I16,
            "unsigned_short" => NumericType::U16,
            "int" | "vtkidtype" | "vtktypeint32" => NumericType::I32,
            "unsigned_int" | "vtktypeuint32" => NumericType::U32,
            "long" | "vtktypeint64" => NumericType::I64,
            "unsigned_long" | "vtktypeuint64" => NumericType::U64,
            "float" => NumericType::F32,
            "double" => NumericType::F64,
            _ => return None,
        })
    }

    /// Type names of the XML format
    pub fn from_xml(name: &str) -> Option<Self> {
        Some(match name {
            "Int8" => NumericType::I8,
            "UInt8" => NumericType::U8,
            "Int16" => NumericType::I16,
            "UInt16" => NumericType::U16,
            "Int32" => NumericType::I32,
            "UInt32" => NumericType::U32,
            "Int64" => NumericType::I64,
            "UInt64" => NumericType::U64,
            "Float32" => NumericType::F32,
            "Float64" => NumericType::F64,
            _ => return None,
        })
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        match self {
            NumericType::I8 | NumericType::U8 => 1,
            NumericType::I16 | NumericType::U16 => 2,
            NumericType::I32 | NumericType::U32 | NumericType::F32 => 4,
            NumericType::I64 | NumericType::U64 | NumericType::F64 => 8,
        }
    }

    /// Decode `count` values; `None` if `bytes` is too short
    pub fn decode(&self, bytes: &[u8], count: usize, big_endian: bool) -> Option<Vec<f64>> {
        let size = self.size();
        let data = bytes.get(..count.checked_mul(size)?)?;

        macro_rules! read {
            ($t:ty, $chunk:expr) => {{
                let array = <[u8; std::mem::size_of::<$t>()]>::try_from($chunk).ok()?;
                if big_endian {
                    <$t>::from_be_bytes(array) as f64
                } else {
                    <$t>::from_le_bytes(array) as f64
                }
            }};
        }

        data.chunks_exact(size)
            .map(|chunk| {
                Some(match self {
                    NumericType::I8 => read!(i8, chunk),
                    NumericType::U8 => read!(u8, chunk),
                    NumericType::I16 => read!(i16, chunk),
                    NumericType::U16 => read!(u16, chunk),
                    NumericType::I32 => read!(i32, chunk),
                    NumericType::U32 => read!(u32, chunk),
                    NumericType::I64 => read!(i64, chunk),
                    NumericType::U64 => read!(u64, chunk),
                    NumericType::F32 => read!(f32, chunk),
                    NumericType::F64 => read!(f64, chunk),
                })
            })
            .collect()
    }
}

// =================================================================================================
// Raw mesh
// =================================================================================================

/// Data array as stored in the file: flat values, `components` per tuple
#[derive(Debug, Clone, PartialEq)]
pub struct RawArray {
    pub name: String,
    pub components: usize,
    pub values: Vec<f64>,
}

impl RawArray {
    pub fn new(name: impl Into<String>, components: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components,
            values,
        }
    }

    fn tuples(&self) -> usize {
        self.values.len() / self.components.max(1)
    }
}

/// Cells of a polydata piece, grouped the way cell ids are numbered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellBlocks {
    pub verts: Vec<Vec<usize>>,
    pub lines: Vec<Vec<usize>>,
    pub polys: Vec<Vec<usize>>,
    pub strips: Vec<Vec<usize>>,
}

impl CellBlocks {
    pub fn len(&self) -> usize {
        self.verts.len() + self.lines.len() + self.polys.len() + self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in id order: verts, lines, polys, strips
    pub fn into_cells(self) -> Vec<Vec<usize>> {
        let mut cells = self.verts;
        cells.extend(self.lines);
        cells.extend(self.polys);
        cells.extend(self.strips);
        cells
    }
}

/// Connectivity from `offsets` (end of each cell) and a flat index list
pub fn cells_from_offsets(offsets: &[usize], connectivity: &[usize]) -> Option<Vec<Vec<usize>>> {
    let mut start = 0;
    offsets
        .iter()
        .map(|&end| {
            let cell = connectivity.get(start..end)?.to_vec();
            start = end;
            Some(cell)
        })
        .collect()
}

/// Connectivity from the classic `n i0 i1 ... n j0 j1 ...` layout
pub fn cells_from_counts(count: usize, flat: &[usize]) -> Option<Vec<Vec<usize>>> {
    let mut cells = Vec::with_capacity(count);
    let mut i = 0;
    for _ in 0..count {
        let n = *flat.get(i)?;
        cells.push(flat.get(i + 1..i + 1 + n)?.to_vec());
        i += 1 + n;
    }
    (i == flat.len()).then_some(cells)
}

/// Polydata as read from either encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub points: Vec<Point3<f64>>,
    pub cells: CellBlocks,
    pub point_data: Vec<RawArray>,
    pub cell_data: Vec<RawArray>,
}

impl RawMesh {
    /// Check counts and connectivity, then build the sample
    ///
    /// # Errors
    ///
    /// `MalformedArtifact` for arrays whose length does not match the point or
    /// cell count and for connectivity referencing missing points;
    /// `UnsupportedArtifact` for arrays that are neither scalars nor 3-vectors.
    pub fn into_sample(self, artifact: &ArtifactRef) -> PostResult<UnifiedSample> {
        let path = artifact.path.as_path();
        let n_points = self.points.len();
        let n_cells = self.cells.len();

        let cells = self.cells.into_cells();
        if let Some(bad) = cells.iter().flatten().find(|&&i| i >= n_points) {
            return Err(PostError::malformed(
                path,
                format!("connectivity references point {} of {}", bad, n_points),
            ));
        }

        check_lengths(path, &self.point_data, n_points, "point")?;
        check_lengths(path, &self.cell_data, n_cells, "cell")?;

        let cell_data: Vec<RawArray> = self.cell_data.into_iter().filter(|a| !a.values.is_empty()).collect();
        let point_data: Vec<RawArray> = self.point_data.into_iter().filter(|a| !a.values.is_empty()).collect();

        let (association, arrays) = if !cell_data.is_empty() {
            (Association::Cell, cell_data)
        } else {
            (Association::Point, point_data)
        };

        let fields = arrays
            .into_iter()
            .map(|array| to_field(path, array))
            .collect::<PostResult<Vec<Field>>>()?;

        let geometry = MeshGeometry {
            points: self.points,
            cells,
            association,
        };
        let coordinates = match association {
            Association::Cell => geometry.cell_centroids(),
            Association::Point => geometry.points.clone(),
        };

        debug!(
            "{}: {} points, {} cells, {} {:?} fields",
            path.display(),
            n_points,
            n_cells,
            fields.len(),
            association
        );

        let sample = UnifiedSample::new(
            SampleMeta {
                source: artifact.clone(),
                time: artifact.time_value(),
            },
            Coordinates::Points {
                components: 3,
                values: coordinates,
            },
            fields,
        )?;
        Ok(sample.with_geometry(geometry))
    }
}

fn check_lengths(path: &std::path::Path, arrays: &[RawArray], expected: usize, what: &str) -> PostResult<()> {
    for array in arrays {
        if array.values.is_empty() {
            continue;
        }
        if array.components == 0 || array.values.len() % array.components != 0 || array.tuples() != expected {
            return Err(PostError::malformed(
                path,
                format!(
                    "{} array '{}' has {} values for {} {}s",
                    what,
                    array.name,
                    array.values.len(),
                    expected,
                    what
                ),
            ));
        }
    }
    Ok(())
}

fn to_field(path: &std::path::Path, array: RawArray) -> PostResult<Field> {
    let data = match array.components {
        1 => FieldData::from_scalars(array.values),
        3 => FieldData::from_triples(
            array
                .values
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        ),
        n => {
            return Err(PostError::unsupported(
                path,
                format!("array '{}' has {} components", array.name, n),
            ))
        }
    };
    Ok(Field::new(array.name, data, path))
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ArtifactKind;
    use std::path::Path;

    fn artifact() -> ArtifactRef {
        ArtifactRef::from_path(
            Path::new("/case"),
            Path::new("/case/postProcessing/surfaces/10/p_plane.vtk"),
            ArtifactKind::Mesh,
        )
    }

    fn square() -> RawMesh {
        RawMesh {
            points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            cells: CellBlocks {
                polys: vec![vec![0, 1, 2], vec![0, 2, 3]],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_sniff() {
        assert_eq!(MeshEncoding::sniff(b"# vtk DataFile Version 2.0\n"), Some(MeshEncoding::Legacy));
        assert_eq!(MeshEncoding::sniff(b"<?xml version=\"1.0\"?>"), Some(MeshEncoding::Xml));
        assert_eq!(MeshEncoding::sniff(b"\n<VTKFile type=\"PolyData\">"), Some(MeshEncoding::Xml));
        assert_eq!(MeshEncoding::sniff(b"solid stl"), None);
    }

    #[test]
    fn test_unknown_signature_is_unsupported() {
        let err = parse_bytes(&artifact(), b"hello").unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_cell_data_preferred() {
        let mut mesh = square();
        mesh.point_data.push(RawArray::new("T", 1, vec![1.0; 4]));
        mesh.cell_data.push(RawArray::new("p", 1, vec![1.0, 2.0]));

        let sample = mesh.into_sample(&artifact()).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.fields().len(), 1);
        assert_eq!(sample.geometry().unwrap().association, Association::Cell);
        assert_eq!(sample.time(), Some(10.0));
    }

    #[test]
    fn test_point_data_and_vectors() {
        let mut mesh = square();
        mesh.point_data.push(RawArray::new("U", 3, vec![1.0; 12]));
        mesh.cell_data.push(RawArray::new("empty", 1, vec![]));

        let sample = mesh.into_sample(&artifact()).unwrap();
        assert_eq!(sample.len(), 4);
        assert!(sample.field("U").unwrap().is_vector());
        assert!(sample.field("empty").is_none());
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let mut mesh = square();
        mesh.point_data.push(RawArray::new("p", 1, vec![1.0; 3]));
        let err = mesh.into_sample(&artifact()).unwrap_err();
        assert!(matches!(err, PostError::MalformedArtifact { .. }));
    }

    #[test]
    fn test_bad_connectivity_is_malformed() {
        let mut mesh = square();
        mesh.cells.polys.push(vec![0, 7, 2]);
        assert!(mesh.into_sample(&artifact()).is_err());
    }

    #[test]
    fn test_tensor_is_unsupported() {
        let mut mesh = square();
        mesh.point_data.push(RawArray::new("R", 6, vec![0.0; 24]));
        assert!(mesh.into_sample(&artifact()).unwrap_err().is_skip());
    }

    #[test]
    fn test_connectivity_layouts() {
        assert_eq!(
            cells_from_counts(2, &[3, 0, 1, 2, 1, 3]),
            Some(vec![vec![0, 1, 2], vec![3]])
        );
        assert_eq!(cells_from_counts(2, &[3, 0, 1]), None);
        assert_eq!(
            cells_from_offsets(&[3, 4], &[0, 1, 2, 3]),
            Some(vec![vec![0, 1, 2], vec![3]])
        );
    }

    #[test]
    fn test_decode_big_endian() {
        let bytes = [0x3f, 0x80, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00];
        assert_eq!(NumericType::F32.decode(&bytes, 2, true), Some(vec![1.0, 2.0]));
        assert_eq!(NumericType::F32.decode(&bytes, 3, true), None);
    }
}
