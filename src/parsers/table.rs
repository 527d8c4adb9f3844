//! Tabular time-series parser (`.dat`)
//!
//! Function objects write whitespace-separated tables whose first column is
//! the time (or iteration) and whose header is the last `#` comment line
//! before the data:
//!
//! ```text
//! # Residuals
//! # Time    p    Ux   Uy
//! 1         N/A  1e-2 1e-3
//! 2         1e-1 1e-3 1e-4
//! ```
//!
//! # Composite columns
//!
//! A header token `name(a b c)` declares one column per member, named
//! `name_a`, `name_b`, `name_c`. In data rows a parenthesized group
//! `(x y z)` is a single vector value, while outer parentheses wrapping
//! several groups are transparent. A row must hold exactly as many values as
//! the expanded header declares. When every member of a composite is a
//! vector, a `name_total` vector with the sum of the members is added.
//!
//! # Patch tables
//!
//! Tables with a textual `patch` column (`yPlus.dat`) hold several rows per
//! index value. They are pivoted to one record per index value with fields
//! named `<patch> <column>`; missing combinations are NaN.

use nalgebra::DVector;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::debug;

use super::text::{parse_number, split_row, RowValue};
use crate::error::{PostError, PostResult};
use crate::sample::{Coordinates, Field, FieldData, SampleMeta, UnifiedSample};
use crate::scan::ArtifactRef;

/// Name of the column that pivots a table
const PATCH_COLUMN: &str = "patch";

/// Suffix of the derived sum of a vector composite
const TOTAL_SUFFIX: &str = "_total";

// =================================================================================================
// Header
// =================================================================================================

#[derive(Debug, Default)]
struct Header {
    columns: Vec<String>,
    composites: Vec<(String, Vec<usize>)>,
    units: BTreeMap<String, String>,
}

impl Header {
    fn push_column(&mut self, name: String, last: &mut Vec<usize>) {
        last.clear();
        last.push(self.columns.len());
        self.columns.push(name);
    }
}

fn flush_word(header: &mut Header, word: &mut String, last: &mut Vec<usize>) {
    if !word.is_empty() {
        header.push_column(std::mem::take(word), last);
    }
}

/// Expand a header comment line into column names
fn parse_header(line: &str) -> Header {
    let body = line.trim_start().trim_start_matches('#');
    let mut header = Header::default();
    let mut last: Vec<usize> = Vec::new();
    let mut word = String::new();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                let name = std::mem::take(&mut word);
                let mut members = Vec::new();
                let mut member = String::new();
                for c in chars.by_ref() {
                    match c {
                        ')' => break,
                        '(' => {}
                        c if c.is_whitespace() => {
                            if !member.is_empty() {
                                members.push(std::mem::take(&mut member));
                            }
                        }
                        c => member.push(c),
                    }
                }
                if !member.is_empty() {
                    members.push(member);
                }

                let start = header.columns.len();
                for m in &members {
                    let column = if name.is_empty() {
                        m.clone()
                    } else {
                        format!("{}_{}", name, m)
                    };
                    header.columns.push(column);
                }
                last = (start..header.columns.len()).collect();
                if !name.is_empty() && !members.is_empty() {
                    header.composites.push((name, last.clone()));
                }
            }
            '[' => {
                flush_word(&mut header, &mut word, &mut last);
                let unit: String = chars.by_ref().take_while(|&c| c != ']').collect();
                for &i in &last {
                    header.units.insert(header.columns[i].clone(), unit.trim().to_string());
                }
            }
            c if c.is_whitespace() => flush_word(&mut header, &mut word, &mut last),
            c => word.push(c),
        }
    }
    flush_word(&mut header, &mut word, &mut last);

    header
}

// =================================================================================================
// Columns
// =================================================================================================

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Scalar(Vec<f64>),
    Vector(Vec<[f64; 3]>),
    Text(Vec<String>),
}

impl Column {
    fn kind(&self) -> &'static str {
        match self {
            Column::Scalar(_) => "scalar",
            Column::Vector(_) => "vector",
            Column::Text(_) => "text",
        }
    }
}

fn parse_triple(tokens: &[&str]) -> Option<[f64; 3]> {
    match tokens {
        [x, y, z] => Some([parse_number(x)?, parse_number(y)?, parse_number(z)?]),
        _ => None,
    }
}

/// Column type from the first data row
fn start_column(value: &RowValue<'_>) -> Option<Column> {
    match value {
        RowValue::Bare(token) => Some(match parse_number(token) {
            Some(v) => Column::Scalar(vec![v]),
            None => Column::Text(vec![token.to_string()]),
        }),
        RowValue::Group(tokens) if tokens.len() == 1 => {
            parse_number(tokens[0]).map(|v| Column::Scalar(vec![v]))
        }
        RowValue::Group(tokens) => parse_triple(tokens).map(|v| Column::Vector(vec![v])),
    }
}

/// Append a value of a later row; `false` if it does not fit the column
fn extend_column(column: &mut Column, value: &RowValue<'_>) -> bool {
    match (column, value) {
        (Column::Scalar(values), RowValue::Bare(token)) => parse_number(token).map(|v| values.push(v)).is_some(),
        (Column::Scalar(values), RowValue::Group(tokens)) if tokens.len() == 1 => {
            parse_number(tokens[0]).map(|v| values.push(v)).is_some()
        }
        (Column::Vector(values), RowValue::Group(tokens)) => parse_triple(tokens).map(|v| values.push(v)).is_some(),
        (Column::Text(values), RowValue::Bare(token)) => {
            values.push(token.to_string());
            true
        }
        _ => false,
    }
}

// =================================================================================================
// Parser
// =================================================================================================

/// Parse a table artifact from disk
pub fn parse(artifact: &ArtifactRef) -> PostResult<UnifiedSample> {
    let content = std::fs::read_to_string(&artifact.path).map_err(|e| PostError::io(&artifact.path, e))?;
    parse_str(artifact, &content)
}

/// Parse table content already in memory
pub fn parse_str(artifact: &ArtifactRef, content: &str) -> PostResult<UnifiedSample> {
    let path = artifact.path.as_path();

    let mut header_line: Option<&str> = None;
    let mut rows: Vec<(usize, Vec<RowValue>)> = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            if rows.is_empty() {
                header_line = Some(trimmed);
            }
            continue;
        }
        let values = split_row(trimmed)
            .map_err(|reason| PostError::malformed(path, format!("line {}: {}", number + 1, reason)))?;
        rows.push((number + 1, values));
    }

    let (_, first) = rows
        .first()
        .ok_or_else(|| PostError::malformed(path, "table has no data rows"))?;

    let header = header_line.map(parse_header).filter(|h| !h.columns.is_empty());
    let width = header.as_ref().map_or(first.len(), |h| h.columns.len());
    let Header {
        columns: names,
        composites,
        units,
    } = header.unwrap_or_else(|| Header {
        columns: (1..=width).map(|i| format!("column_{}", i)).collect(),
        ..Default::default()
    });

    let mut columns: Vec<Column> = Vec::with_capacity(width);
    for (i, (number, values)) in rows.iter().enumerate() {
        if values.len() != width {
            return Err(PostError::malformed(
                path,
                format!("line {}: {} values for {} columns", number, values.len(), width),
            ));
        }

        for (c, value) in values.iter().enumerate() {
            if i == 0 {
                let column = start_column(value).ok_or_else(|| {
                    PostError::malformed(path, format!("line {}: bad value in column '{}'", number, names[c]))
                })?;
                columns.push(column);
            } else if !extend_column(&mut columns[c], value) {
                return Err(PostError::malformed(
                    path,
                    format!(
                        "line {}: value does not fit {} column '{}'",
                        number,
                        columns[c].kind(),
                        names[c]
                    ),
                ));
            }
        }
    }

    let mut named: Vec<(String, Column)> = names.into_iter().zip(columns).collect();
    append_totals(&mut named, &composites);

    let (index_label, index) = match named.first() {
        Some((label, Column::Scalar(values))) => (label.clone(), values.clone()),
        Some((label, column)) => {
            return Err(PostError::malformed(
                path,
                format!("index column '{}' is {}, not scalar", label, column.kind()),
            ))
        }
        None => return Err(PostError::malformed(path, "table has no columns")),
    };
    let named = named.split_off(1);

    let patches = named.iter().find_map(|(name, column)| match column {
        Column::Text(values) if name == PATCH_COLUMN => Some(values.clone()),
        _ => None,
    });

    let (index, fields, units) = match patches {
        Some(patches) => pivot(path, index, &patches, named, &units),
        None => (index, into_fields(path, named), units),
    };

    debug!(
        "{}: {} records, {} fields",
        path.display(),
        index.len(),
        fields.len()
    );

    UnifiedSample::new(
        SampleMeta {
            source: artifact.clone(),
            time: artifact.time_value(),
        },
        Coordinates::Index {
            label: index_label,
            values: DVector::from_vec(index),
        },
        fields,
    )
    .map(|sample| sample.with_units(units))
}

/// Add `<name>_total` for composites made only of vectors
fn append_totals(named: &mut Vec<(String, Column)>, composites: &[(String, Vec<usize>)]) {
    for (name, members) in composites {
        if members.len() < 2 {
            continue;
        }
        let vectors: Option<Vec<&Vec<[f64; 3]>>> = members
            .iter()
            .map(|&i| match named.get(i) {
                Some((_, Column::Vector(v))) => Some(v),
                _ => None,
            })
            .collect();

        if let Some(vectors) = vectors {
            let n = vectors[0].len();
            let total = (0..n)
                .map(|r| {
                    vectors.iter().fold([0.0; 3], |acc, v| {
                        [acc[0] + v[r][0], acc[1] + v[r][1], acc[2] + v[r][2]]
                    })
                })
                .collect();
            named.push((format!("{}{}", name, TOTAL_SUFFIX), Column::Vector(total)));
        }
    }
}

fn into_fields(path: &Path, named: Vec<(String, Column)>) -> Vec<Field> {
    named
        .into_iter()
        .filter_map(|(name, column)| match column {
            Column::Scalar(v) => Some(Field::new(name, FieldData::from_scalars(v), path)),
            Column::Vector(v) => Some(Field::new(name, FieldData::from_triples(v), path)),
            Column::Text(_) => {
                debug!("{}: dropping text column '{}'", path.display(), name);
                None
            }
        })
        .collect()
}

/// One record per distinct index value, one field per (patch, column)
fn pivot(
    path: &Path,
    index: Vec<f64>,
    patches: &[String],
    named: Vec<(String, Column)>,
    units: &BTreeMap<String, String>,
) -> (Vec<f64>, Vec<Field>, BTreeMap<String, String>) {
    let mut times: Vec<f64> = Vec::new();
    let mut slot: HashMap<u64, usize> = HashMap::new();
    let rows: Vec<usize> = index
        .iter()
        .map(|t| {
            *slot.entry(t.to_bits()).or_insert_with(|| {
                times.push(*t);
                times.len() - 1
            })
        })
        .collect();

    let mut names: Vec<&str> = Vec::new();
    for p in patches {
        if !names.contains(&p.as_str()) {
            names.push(p);
        }
    }

    let mut fields = Vec::new();
    let mut pivot_units = units.clone();
    for (column_name, column) in &named {
        for patch in &names {
            let name = format!("{} {}", patch, column_name);
            let rows_of_patch = rows.iter().zip(patches).enumerate().filter(|(_, (_, p))| p == patch);
            let data = match column {
                Column::Scalar(values) => {
                    let mut out = vec![f64::NAN; times.len()];
                    for (i, (&r, _)) in rows_of_patch {
                        out[r] = values[i];
                    }
                    FieldData::from_scalars(out)
                }
                Column::Vector(values) => {
                    let mut out = vec![[f64::NAN; 3]; times.len()];
                    for (i, (&r, _)) in rows_of_patch {
                        out[r] = values[i];
                    }
                    FieldData::from_triples(out)
                }
                Column::Text(_) => continue,
            };
            if let Some(unit) = units.get(column_name) {
                pivot_units.insert(name.clone(), unit.clone());
            }
            fields.push(Field::new(name, data, path));
        }
    }

    (times, fields, pivot_units)
}

// =================================================================================================
// Tests
// =================================================================================================
