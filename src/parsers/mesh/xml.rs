//! XML `.vtp` polydata reader
//!
//! Reads a single-piece `VTKFile type="PolyData"`:
//!
//! ```text
//! <VTKFile type="PolyData" byte_order="LittleEndian" header_type="UInt32">
//!   <PolyData>
//!     <Piece NumberOfPoints="4" NumberOfPolys="1">
//!       <CellData><DataArray type="Float32" Name="p" format="ascii">1</DataArray></CellData>
//!       <Points><DataArray type="Float32" NumberOfComponents="3" format="binary">...</DataArray></Points>
//!       <Polys>
//!         <DataArray type="Int32" Name="connectivity" format="appended" offset="0"/>
//!         <DataArray type="Int32" Name="offsets" format="appended" offset="24"/>
//!       </Polys>
//!     </Piece>
//!   </PolyData>
//!   <AppendedData encoding="raw">_...</AppendedData>
//! </VTKFile>
//! ```
//!
//! Binary blocks are a byte-count header (`header_type`) followed by the
//! values. Compressed files are not read.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use nalgebra::Point3;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use super::{cells_from_offsets, CellBlocks, NumericType, RawArray, RawMesh};
use crate::error::{PostError, PostResult};

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z_][\w:.-]*)([^>]*?)(/?)>").expect("static regex")
});

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w:.-]+)\s*=\s*"([^"]*)""#).expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    PointData,
    CellData,
    Points,
    Verts,
    Lines,
    Polys,
    Strips,
    Other,
}

impl Section {
    fn from_tag(name: &str) -> Option<Self> {
        Some(match name {
            "PointData" => Section::PointData,
            "CellData" => Section::CellData,
            "Points" => Section::Points,
            "Verts" => Section::Verts,
            "Lines" => Section::Lines,
            "Polys" => Section::Polys,
            "Strips" => Section::Strips,
            "FieldData" => Section::Other,
            _ => return None,
        })
    }
}

/// `<DataArray>` as declared: attributes and inline text
#[derive(Debug)]
struct ArrayDecl<'a> {
    section: Section,
    attributes: HashMap<String, String>,
    text: &'a str,
}

impl ArrayDecl<'_> {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn name(&self) -> &str {
        self.attribute("Name").unwrap_or("")
    }
}

fn attributes(text: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// Appended payload after the `_` marker
enum Appended<'a> {
    Raw(&'a [u8]),
    Base64(&'a str),
}

/// File-wide decoding settings
struct Decoder<'a> {
    path: &'a Path,
    big_endian: bool,
    header: NumericType,
    appended: Option<Appended<'a>>,
}

impl Decoder<'_> {
    fn malformed(&self, reason: impl Into<String>) -> PostError {
        PostError::malformed(self.path, reason)
    }

    fn block_length(&self, bytes: &[u8]) -> Option<usize> {
        self.header
            .decode(bytes, 1, self.big_endian)
            .and_then(|v| v.first().copied())
            .map(|n| n as usize)
    }

    /// Payload bytes of a base64 block (header and data encoded together or apart)
    fn base64_block(&self, text: &str) -> Option<Vec<u8>> {
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let hs = self.header.size();
        let header_chars = hs.div_ceil(3) * 4;

        let head = BASE64.decode(clean.get(..header_chars)?).ok()?;
        let n = self.block_length(&head)?;

        let joint_chars = (hs + n).div_ceil(3) * 4;
        if let Some(all) = clean.get(..joint_chars).and_then(|t| BASE64.decode(t).ok()) {
            if all.len() >= hs + n {
                return Some(all[hs..hs + n].to_vec());
            }
        }

        let data_chars = n.div_ceil(3) * 4;
        let data = BASE64
            .decode(clean.get(header_chars..header_chars + data_chars)?)
            .ok()?;
        data.get(..n).map(<[u8]>::to_vec)
    }

    fn values(&self, decl: &ArrayDecl<'_>) -> PostResult<Vec<f64>> {
        let ty_name = decl.attribute("type").unwrap_or("");
        let ty = NumericType::from_xml(ty_name)
            .ok_or_else(|| PostError::unsupported(self.path, format!("data type '{}'", ty_name)))?;
        let format = decl.attribute("format").unwrap_or("ascii");

        let bytes = match format {
            "ascii" => {
                return decl
                    .text
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<f64>()
                            .map_err(|_| self.malformed(format!("array '{}': bad number '{}'", decl.name(), t)))
                    })
                    .collect();
            }
            "binary" => self.base64_block(decl.text),
            "appended" => {
                let offset: usize = decl
                    .attribute("offset")
                    .and_then(|o| o.trim().parse().ok())
                    .ok_or_else(|| self.malformed(format!("array '{}': missing offset", decl.name())))?;
                match &self.appended {
                    Some(Appended::Raw(raw)) => raw.get(offset..).and_then(|block| {
                        let n = self.block_length(block)?;
                        let hs = self.header.size();
                        block.get(hs..hs + n).map(<[u8]>::to_vec)
                    }),
                    Some(Appended::Base64(text)) => text.get(offset..).and_then(|t| self.base64_block(t)),
                    None => return Err(self.malformed("appended array without AppendedData")),
                }
            }
            other => {
                return Err(PostError::unsupported(self.path, format!("array format '{}'", other)));
            }
        }
        .ok_or_else(|| self.malformed(format!("array '{}': truncated binary block", decl.name())))?;

        if bytes.len() % ty.size() != 0 {
            return Err(self.malformed(format!(
                "array '{}': {} bytes is not a whole number of {:?}",
                decl.name(),
                bytes.len(),
                ty
            )));
        }
        ty.decode(&bytes, bytes.len() / ty.size(), self.big_endian)
            .ok_or_else(|| self.malformed(format!("array '{}': truncated data", decl.name())))
    }

    fn indices(&self, decl: &ArrayDecl<'_>) -> PostResult<Vec<usize>> {
        self.values(decl)?
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Ok(v as usize)
                } else {
                    Err(self.malformed(format!("array '{}': bad index {}", decl.name(), v)))
                }
            })
            .collect()
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Split off the appended section, which may hold raw bytes
fn split_appended<'a>(path: &Path, bytes: &'a [u8]) -> PostResult<(&'a [u8], Option<Appended<'a>>)> {
    let Some(start) = find(bytes, b"<AppendedData", 0) else {
        return Ok((bytes, None));
    };
    let malformed = || PostError::malformed(path, "truncated AppendedData");

    let tag_end = find(bytes, b">", start).ok_or_else(malformed)?;
    let tag = String::from_utf8_lossy(&bytes[start..tag_end]).into_owned();
    let marker = find(bytes, b"_", tag_end).ok_or_else(malformed)?;
    let payload = &bytes[marker + 1..];

    let appended = match attributes(&tag).get("encoding").map(String::as_str) {
        Some("raw") => Appended::Raw(payload),
        Some("base64") | None => {
            let end = find(payload, b"</AppendedData", 0).unwrap_or(payload.len());
            let text = std::str::from_utf8(&payload[..end]).map_err(|_| malformed())?;
            Appended::Base64(text)
        }
        Some(other) => {
            return Err(PostError::unsupported(path, format!("appended encoding '{}'", other)));
        }
    };

    Ok((&bytes[..start], Some(appended)))
}

fn count(piece: &HashMap<String, String>, key: &str) -> usize {
    piece.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Read an XML polydata file
pub fn read(path: &Path, bytes: &[u8]) -> PostResult<RawMesh> {
    let (markup, appended) = split_appended(path, bytes)?;
    let markup = std::str::from_utf8(markup).map_err(|_| PostError::malformed(path, "markup is not UTF-8"))?;

    let mut decoder = Decoder {
        path,
        big_endian: false,
        header: NumericType::U32,
        appended,
    };

    let mut section: Option<Section> = None;
    let mut pieces: Vec<HashMap<String, String>> = Vec::new();
    let mut arrays: Vec<ArrayDecl> = Vec::new();
    let mut seen_file = false;

    for captures in TAG.captures_iter(markup) {
        let closing = !captures[1].is_empty();
        let name = &captures[2];
        let self_closing = !captures[4].is_empty();
        let whole = captures.get(0).map_or(0..0, |m| m.range());

        if closing {
            if Section::from_tag(name).is_some() {
                section = None;
            }
            continue;
        }

        match name {
            "VTKFile" => {
                seen_file = true;
                let attrs = attributes(&captures[3]);
                match attrs.get("type").map(String::as_str) {
                    Some("PolyData") => {}
                    other => {
                        return Err(PostError::unsupported(
                            path,
                            format!("VTKFile type {}", other.unwrap_or("(none)")),
                        ))
                    }
                }
                if let Some(compressor) = attrs.get("compressor").filter(|c| !c.is_empty()) {
                    return Err(PostError::unsupported(path, format!("compressed with {}", compressor)));
                }
                decoder.big_endian = attrs.get("byte_order").map(String::as_str) == Some("BigEndian");
                decoder.header = match attrs.get("header_type").map(String::as_str) {
                    Some("UInt64") => NumericType::U64,
                    _ => NumericType::U32,
                };
            }
            "Piece" => pieces.push(attributes(&captures[3])),
            "DataArray" => {
                let text = if self_closing {
                    ""
                } else {
                    let rest = &markup[whole.end..];
                    &rest[..rest.find('<').unwrap_or(rest.len())]
                };
                arrays.push(ArrayDecl {
                    section: section.unwrap_or(Section::Other),
                    attributes: attributes(&captures[3]),
                    text,
                });
            }
            other => {
                if let Some(s) = Section::from_tag(other) {
                    section = (!self_closing).then_some(s);
                }
            }
        }
    }

    if !seen_file {
        return Err(PostError::malformed(path, "no VTKFile element"));
    }
    let piece = match pieces.as_slice() {
        [piece] => piece,
        [] => return Err(PostError::malformed(path, "no Piece element")),
        _ => return Err(PostError::unsupported(path, format!("{} pieces", pieces.len()))),
    };

    let mut mesh = RawMesh::default();
    let mut connectivity: HashMap<Section, (Option<Vec<usize>>, Option<Vec<usize>>)> = HashMap::new();

    for decl in &arrays {
        match decl.section {
            Section::Points => {
                let flat = decoder.values(decl)?;
                if flat.len() % 3 != 0 {
                    return Err(decoder.malformed("point coordinates are not triples"));
                }
                mesh.points = flat.chunks_exact(3).map(|c| Point3::new(c[0], c[1], c[2])).collect();
            }
            Section::PointData | Section::CellData => {
                let components = decl
                    .attribute("NumberOfComponents")
                    .and_then(|c| c.trim().parse().ok())
                    .unwrap_or(1);
                let array = RawArray::new(decl.name(), components, decoder.values(decl)?);
                if decl.section == Section::PointData {
                    mesh.point_data.push(array);
                } else {
                    mesh.cell_data.push(array);
                }
            }
            Section::Verts | Section::Lines | Section::Polys | Section::Strips => {
                let entry = connectivity.entry(decl.section).or_default();
                match decl.name() {
                    "connectivity" => entry.0 = Some(decoder.indices(decl)?),
                    "offsets" => entry.1 = Some(decoder.indices(decl)?),
                    _ => {}
                }
            }
            Section::Other => {}
        }
    }

    let n_points = count(piece, "NumberOfPoints");
    if mesh.points.len() != n_points {
        return Err(decoder.malformed(format!(
            "{} points read, {} declared",
            mesh.points.len(),
            n_points
        )));
    }

    let mut blocks = CellBlocks::default();
    for (section, key) in [
        (Section::Verts, "NumberOfVerts"),
        (Section::Lines, "NumberOfLines"),
        (Section::Polys, "NumberOfPolys"),
        (Section::Strips, "NumberOfStrips"),
    ] {
        let declared = count(piece, key);
        let cells = match connectivity.remove(&section) {
            Some((Some(conn), Some(offsets))) => cells_from_offsets(&offsets, &conn)
                .ok_or_else(|| decoder.malformed(format!("{}: offsets exceed connectivity", key)))?,
            Some(_) if declared > 0 => {
                return Err(decoder.malformed(format!("{}: connectivity or offsets missing", key)))
            }
            _ => Vec::new(),
        };
        if cells.len() != declared {
            return Err(decoder.malformed(format!("{}: {} cells read, {} declared", key, cells.len(), declared)));
        }
        match section {
            Section::Verts => blocks.verts = cells,
            Section::Lines => blocks.lines = cells,
            Section::Polys => blocks.polys = cells,
            _ => blocks.strips = cells,
        }
    }
    mesh.cells = blocks;

    Ok(mesh)
}

// =================================================================================================
// Tests
// =================================================================================================
