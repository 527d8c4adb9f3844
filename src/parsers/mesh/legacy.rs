//! Legacy `.vtk` polydata reader
//!
//! ```text
//! # vtk DataFile Version 2.0
//! sampled surface
//! ASCII
//! DATASET POLYDATA
//! POINTS 4 float
//! 0 0 0  1 0 0  1 1 0  0 1 0
//! POLYGONS 1 5
//! 4 0 1 2 3
//! CELL_DATA 1
//! SCALARS p float 1
//! LOOKUP_TABLE default
//! 101325
//! ```
//!
//! Section headers are text lines; payloads are whitespace-separated numbers
//! (ASCII) or big-endian values starting right after the header line
//! (BINARY). Both the classic `n size` connectivity and the 5.x
//! `OFFSETS`/`CONNECTIVITY` layout are read.

use nalgebra::Point3;
use std::path::Path;

use tracing::debug;

use super::{cells_from_counts, cells_from_offsets, NumericType, RawArray, RawMesh};
use crate::error::{PostError, PostResult};

/// Legacy sections of the non-polydata datasets
const OTHER_DATASET_SECTIONS: [&str; 8] = [
    "DIMENSIONS",
    "ORIGIN",
    "SPACING",
    "X_COORDINATES",
    "Y_COORDINATES",
    "Z_COORDINATES",
    "CELLS",
    "CELL_TYPES",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Point,
    Cell,
}

/// Line-oriented reader over a legacy file
struct Reader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
    binary: bool,
}

impl<'a> Reader<'a> {
    fn malformed(&self, reason: impl Into<String>) -> PostError {
        PostError::malformed(self.path, reason)
    }

    /// Next raw line, without its terminator
    fn line(&mut self) -> Option<PostResult<&'a str>> {
        let bytes: &'a [u8] = self.bytes;
        if self.pos >= bytes.len() {
            return None;
        }
        let rest = &bytes[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        Some(
            std::str::from_utf8(&rest[..end])
                .map(|s| s.trim())
                .map_err(|_| self.malformed("non-text section header")),
        )
    }

    /// Tokens of the next non-blank line
    fn header(&mut self) -> Option<PostResult<Vec<&'a str>>> {
        loop {
            match self.line()? {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => return Some(Ok(line.split_whitespace().collect())),
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Consume the next header line only if it starts with `keyword`
    fn optional_header(&mut self, keyword: &str) -> PostResult<Option<Vec<&'a str>>> {
        let saved = self.pos;
        match self.header() {
            Some(Ok(tokens)) if tokens.first() == Some(&keyword) => Ok(Some(tokens)),
            // binary payloads may follow; leave them untouched
            _ => {
                self.pos = saved;
                Ok(None)
            }
        }
    }

    fn required_header(&mut self, what: &str) -> PostResult<Vec<&'a str>> {
        self.header()
            .transpose()?
            .ok_or_else(|| self.malformed(format!("missing {}", what)))
    }

    /// Skip lines up to and including the next blank one
    fn skip_block(&mut self) -> PostResult<()> {
        while let Some(line) = self.line() {
            if line?.is_empty() {
                break;
            }
        }
        Ok(())
    }

    fn token(&mut self) -> Option<&'a str> {
        let bytes: &'a [u8] = self.bytes;
        let rest = &bytes[self.pos..];
        let start = rest.iter().position(|b| !b.is_ascii_whitespace())?;
        let len = rest[start..]
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(rest.len() - start);
        self.pos += start + len;
        std::str::from_utf8(&rest[start..start + len]).ok()
    }

    /// Payload of `count` values
    fn numbers(&mut self, count: usize, ty: NumericType, what: &str) -> PostResult<Vec<f64>> {
        if self.binary {
            let values = ty
                .decode(&self.bytes[self.pos..], count, true)
                .ok_or_else(|| self.malformed(format!("{}: data ends before {} values", what, count)))?;
            self.pos += count * ty.size();
            return Ok(values);
        }

        (0..count)
            .map(|i| {
                let token = self
                    .token()
                    .ok_or_else(|| self.malformed(format!("{}: data ends after {} of {} values", what, i, count)))?;
                token
                    .parse::<f64>()
                    .map_err(|_| self.malformed(format!("{}: bad number '{}'", what, token)))
            })
            .collect()
    }

    fn indices(&mut self, count: usize, ty: NumericType, what: &str) -> PostResult<Vec<usize>> {
        self.numbers(count, ty, what)?
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(self.malformed(format!("{}: bad index {}", what, v)))
                }
            })
            .collect()
    }
}

fn number<T: std::str::FromStr>(reader: &Reader<'_>, tokens: &[&str], i: usize) -> PostResult<T> {
    tokens
        .get(i)
        .and_then(|t| t.parse::<T>().ok())
        .ok_or_else(|| reader.malformed(format!("bad section header '{}'", tokens.join(" "))))
}

fn numeric_type(reader: &Reader<'_>, tokens: &[&str], i: usize) -> PostResult<NumericType> {
    let name = tokens.get(i).copied().unwrap_or("");
    NumericType::from_legacy(name)
        .ok_or_else(|| PostError::unsupported(reader.path, format!("data type '{}'", name)))
}

fn text<'t>(reader: &Reader<'_>, tokens: &[&'t str], i: usize) -> PostResult<&'t str> {
    tokens
        .get(i)
        .copied()
        .ok_or_else(|| reader.malformed(format!("bad section header '{}'", tokens.join(" "))))
}

/// Read a legacy polydata file
pub fn read(path: &Path, bytes: &[u8]) -> PostResult<RawMesh> {
    let mut reader = Reader {
        path,
        bytes,
        pos: 0,
        binary: false,
    };

    reader.required_header("version line")?;
    reader.line().transpose()?;
    let format = reader.required_header("ASCII/BINARY line")?;
    reader.binary = match format.first().map(|s| s.to_uppercase()).as_deref() {
        Some("ASCII") => false,
        Some("BINARY") => true,
        _ => return Err(reader.malformed(format!("unknown file format '{}'", format.join(" ")))),
    };

    let dataset = reader.required_header("DATASET line")?;
    match (dataset.first(), dataset.get(1)) {
        (Some(&"DATASET"), Some(kind)) if kind.eq_ignore_ascii_case("POLYDATA") => {}
        (Some(&"DATASET"), Some(kind)) => {
            return Err(PostError::unsupported(path, format!("dataset {}", kind)))
        }
        _ => return Err(reader.malformed("missing DATASET line")),
    }

    let mut mesh = RawMesh::default();
    let mut target: Option<(Target, usize)> = None;
    let mut previous = String::from("DATASET");

    while let Some(tokens) = reader.header() {
        let tokens = tokens?;
        let keyword = tokens[0].to_uppercase();

        match keyword.as_str() {
            "POINTS" => {
                let n: usize = number(&reader, &tokens, 1)?;
                let ty = numeric_type(&reader, &tokens, 2)?;
                let flat = reader.numbers(3 * n, ty, "POINTS")?;
                mesh.points = flat.chunks_exact(3).map(|c| Point3::new(c[0], c[1], c[2])).collect();
            }
            "VERTICES" | "LINES" | "POLYGONS" | "TRIANGLE_STRIPS" => {
                let a: usize = number(&reader, &tokens, 1)?;
                let b: usize = number(&reader, &tokens, 2)?;
                let cells = read_cells(&mut reader, &keyword, a, b)?;
                let block = match keyword.as_str() {
                    "VERTICES" => &mut mesh.cells.verts,
                    "LINES" => &mut mesh.cells.lines,
                    "POLYGONS" => &mut mesh.cells.polys,
                    _ => &mut mesh.cells.strips,
                };
                *block = cells;
            }
            "POINT_DATA" | "CELL_DATA" => {
                let n: usize = number(&reader, &tokens, 1)?;
                let (kind, expected) = if keyword == "POINT_DATA" {
                    (Target::Point, mesh.points.len())
                } else {
                    (Target::Cell, mesh.cells.len())
                };
                if n != expected {
                    return Err(reader.malformed(format!("{} {} for {} entities", keyword, n, expected)));
                }
                target = Some((kind, n));
            }
            "SCALARS" => {
                let name = text(&reader, &tokens, 1)?;
                let ty = numeric_type(&reader, &tokens, 2)?;
                let components = if tokens.len() > 3 { number(&reader, &tokens, 3)? } else { 1 };
                reader.optional_header("LOOKUP_TABLE")?;
                let (kind, n) = attribute_target(&reader, target, &keyword)?;
                let values = reader.numbers(n * components, ty, name)?;
                push(&mut mesh, kind, RawArray::new(name, components, values));
            }
            "VECTORS" | "NORMALS" | "TENSORS" => {
                let name = text(&reader, &tokens, 1)?;
                let ty = numeric_type(&reader, &tokens, 2)?;
                let components = if keyword == "TENSORS" { 9 } else { 3 };
                let (kind, n) = attribute_target(&reader, target, &keyword)?;
                let values = reader.numbers(n * components, ty, name)?;
                push(&mut mesh, kind, RawArray::new(name, components, values));
            }
            "TEXTURE_COORDINATES" => {
                let name = text(&reader, &tokens, 1)?;
                let components: usize = number(&reader, &tokens, 2)?;
                let ty = numeric_type(&reader, &tokens, 3)?;
                let (kind, n) = attribute_target(&reader, target, &keyword)?;
                let values = reader.numbers(n * components, ty, name)?;
                push(&mut mesh, kind, RawArray::new(name, components, values));
            }
            "COLOR_SCALARS" => {
                let name = text(&reader, &tokens, 1)?;
                let components: usize = number(&reader, &tokens, 2)?;
                let (kind, n) = attribute_target(&reader, target, &keyword)?;
                let values = if reader.binary {
                    reader
                        .numbers(n * components, NumericType::U8, name)?
                        .into_iter()
                        .map(|v| v / 255.0)
                        .collect()
                } else {
                    reader.numbers(n * components, NumericType::F32, name)?
                };
                push(&mut mesh, kind, RawArray::new(name, components, values));
            }
            "LOOKUP_TABLE" => {
                let size: usize = number(&reader, &tokens, 2)?;
                let ty = if reader.binary { NumericType::U8 } else { NumericType::F32 };
                reader.numbers(4 * size, ty, "LOOKUP_TABLE")?;
            }
            "FIELD" => {
                let count: usize = number(&reader, &tokens, 2)?;
                for _ in 0..count {
                    let array = reader.required_header("FIELD array")?;
                    if array.first() == Some(&"NULL_ARRAY") {
                        continue;
                    }
                    let name = text(&reader, &array, 0)?;
                    let components: usize = number(&reader, &array, 1)?;
                    let tuples: usize = number(&reader, &array, 2)?;
                    let ty = numeric_type(&reader, &array, 3)?;
                    let values = reader.numbers(components * tuples, ty, name)?;
                    if reader.optional_header("METADATA")?.is_some() {
                        reader.skip_block()?;
                    }
                    match target {
                        Some((kind, _)) => push(&mut mesh, kind, RawArray::new(name, components, values)),
                        None => debug!("{}: skipping dataset field '{}'", path.display(), name),
                    }
                }
            }
            "METADATA" => reader.skip_block()?,
            other if OTHER_DATASET_SECTIONS.contains(&other) => {
                return Err(PostError::unsupported(path, format!("section {}", other)));
            }
            _ if tokens[0].parse::<f64>().is_ok() => {
                return Err(reader.malformed(format!("{}: more values than declared", previous)));
            }
            _ => {
                return Err(reader.malformed(format!("unknown section '{}' after {}", tokens[0], previous)));
            }
        }
        previous = tokens.join(" ");
    }

    Ok(mesh)
}

fn attribute_target(reader: &Reader<'_>, target: Option<(Target, usize)>, keyword: &str) -> PostResult<(Target, usize)> {
    target.ok_or_else(|| reader.malformed(format!("{} before POINT_DATA/CELL_DATA", keyword)))
}

fn push(mesh: &mut RawMesh, target: Target, array: RawArray) {
    match target {
        Target::Point => mesh.point_data.push(array),
        Target::Cell => mesh.cell_data.push(array),
    }
}

fn read_cells(reader: &mut Reader<'_>, keyword: &str, a: usize, b: usize) -> PostResult<Vec<Vec<usize>>> {
    match reader.optional_header("OFFSETS")? {
        Some(tokens) => {
            let ty = numeric_type(reader, &tokens, 1)?;
            let offsets = reader.indices(a, ty, "OFFSETS")?;
            let tokens = reader.required_header("CONNECTIVITY")?;
            if tokens.first() != Some(&"CONNECTIVITY") {
                return Err(reader.malformed(format!("{}: OFFSETS without CONNECTIVITY", keyword)));
            }
            let ty = numeric_type(reader, &tokens, 1)?;
            let connectivity = reader.indices(b, ty, "CONNECTIVITY")?;
            if offsets.first().copied().unwrap_or(0) != 0 {
                return Err(reader.malformed(format!("{}: offsets do not start at 0", keyword)));
            }
            cells_from_offsets(offsets.get(1..).unwrap_or(&[]), &connectivity)
                .ok_or_else(|| reader.malformed(format!("{}: offsets exceed connectivity", keyword)))
        }
        None => {
            let flat = reader.indices(b, NumericType::I32, keyword)?;
            cells_from_counts(a, &flat)
                .ok_or_else(|| reader.malformed(format!("{}: {} cells do not fill {} indices", keyword, a, b)))
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "\
# vtk DataFile Version 2.0
sampled surface
ASCII
DATASET POLYDATA
POINTS 4 float
0 0 0  1 0 0  1 1 0  0 1 0
POLYGONS 2 8
3 0 1 2
3 0 2 3
CELL_DATA 2
SCALARS p float 1
LOOKUP_TABLE default
1.0 2.0
VECTORS U float
1 0 0  0 1 0
POINT_DATA 4
FIELD attributes 1
T 1 4 float
300 301 302 303
";

    #[test]
    fn test_ascii_polydata() {
        let mesh = read(Path::new("s.vtk"), SQUARE.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.cells.polys, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(mesh.cell_data.len(), 2);
        assert_eq!(mesh.cell_data[1].components, 3);
        assert_eq!(mesh.point_data[0].name, "T");
        assert_eq!(mesh.point_data[0].values.len(), 4);
    }

    #[test]
    fn test_offsets_layout_and_metadata() {
        let content = "\
# vtk DataFile Version 5.1
vtk output
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0 0 1 0
METADATA
INFORMATION 0

POLYGONS 2 3
OFFSETS vtktypeint64
0 3
CONNECTIVITY vtktypeint64
0 1 2
";
        let mesh = read(Path::new("s.vtk"), content.as_bytes()).unwrap();
        assert_eq!(mesh.cells.polys, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_binary_points() {
        let mut bytes = b"# vtk DataFile Version 3.0\nt\nBINARY\nDATASET POLYDATA\nPOINTS 2 float\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 1.0, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nVERTICES 2 4\n");
        for v in [1i32, 0, 1, 1] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nPOINT_DATA 2\nSCALARS p double\nLOOKUP_TABLE default\n");
        for v in [5.0f64, 6.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.push(b'\n');

        let mesh = read(Path::new("b.vtk"), &bytes).unwrap();
        assert_eq!(mesh.points[1], Point3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.cells.verts, vec![vec![0], vec![1]]);
        assert_eq!(mesh.point_data[0].values, vec![5.0, 6.0]);
    }

    #[test]
    fn test_short_data_is_malformed() {
        let content = SQUARE.replace("1.0 2.0\nVECTORS", "1.0\nVECTORS");
        let err = read(Path::new("s.vtk"), content.as_bytes()).unwrap_err();
        assert!(matches!(err, PostError::MalformedArtifact { .. }));
    }

    #[test]
    fn test_surplus_values_are_malformed() {
        let content = SQUARE.replace("1.0 2.0\nVECTORS", "1.0 2.0 3.0\nVECTORS");
        let err = read(Path::new("s.vtk"), content.as_bytes()).unwrap_err();
        assert!(matches!(err, PostError::MalformedArtifact { .. }), "{}", err);
        assert!(err.to_string().contains("SCALARS p float 1"));
    }

    #[test]
    fn test_surplus_values_at_end_of_file_are_malformed() {
        let content = format!("{}304\n", SQUARE);
        let err = read(Path::new("s.vtk"), content.as_bytes()).unwrap_err();
        assert!(!err.is_skip());
        assert!(matches!(err, PostError::MalformedArtifact { .. }));
    }

    #[test]
    fn test_unknown_section_is_malformed() {
        let content = format!("{}BOGUS 1 2\n", SQUARE);
        assert!(matches!(
            read(Path::new("s.vtk"), content.as_bytes()),
            Err(PostError::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_cells_section_is_unsupported() {
        let content = SQUARE.replace("POLYGONS 2 8", "CELLS 2 8");
        assert!(read(Path::new("s.vtk"), content.as_bytes()).unwrap_err().is_skip());
    }

    #[test]
    fn test_point_data_count_mismatch_is_malformed() {
        let content = SQUARE.replace("POINT_DATA 4", "POINT_DATA 5");
        assert!(matches!(
            read(Path::new("s.vtk"), content.as_bytes()),
            Err(PostError::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_other_dataset_is_unsupported() {
        let content = "# vtk DataFile Version 2.0\nt\nASCII\nDATASET UNSTRUCTURED_GRID\n";
        assert!(read(Path::new("u.vtk"), content.as_bytes()).unwrap_err().is_skip());
    }
}
