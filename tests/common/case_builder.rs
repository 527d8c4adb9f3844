//! Scratch case trees for integration tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Two iterations of two residual columns
pub const RESIDUALS: &str = "\
# Solver information
# Time          p               Ux
1               1.000000e-01    1.000000e-02
2               1.000000e-02    1.000000e-03
";

/// A case directory that lives as long as the builder
pub struct CaseBuilder {
    dir: TempDir,
}

impl CaseBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp case dir"),
        }
    }

    /// Builder pattern: write `content` at `relative`, creating directories
    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create case dirs");
        fs::write(&path, content).expect("write case file");
        self
    }

    /// Builder pattern: the usual solver residuals table
    pub fn with_residuals(self) -> Self {
        self.file("postProcessing/residuals/0/residuals.dat", RESIDUALS)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Output directory inside the case
    pub fn output(&self) -> PathBuf {
        self.dir.path().join("images")
    }
}

/// Legacy polydata square in the z = 0 plane, two triangles
///
/// `cell_data` is appended after a `CELL_DATA 2` header; each entry is
/// `(name, values)` written as a scalar array.
pub fn square_vtk(cell_data: &[(&str, [f64; 2])]) -> String {
    let mut content = String::from(
        "# vtk DataFile Version 2.0\n\
         sampled surface\n\
         ASCII\n\
         DATASET POLYDATA\n\
         POINTS 4 float\n\
         0 0 0  1 0 0  1 1 0  0 1 0\n\
         POLYGONS 2 8\n\
         3 0 1 2\n\
         3 0 2 3\n\
         CELL_DATA 2\n",
    );
    for (name, values) in cell_data {
        content.push_str(&format!(
            "SCALARS {} float 1\nLOOKUP_TABLE default\n{} {}\n",
            name, values[0], values[1]
        ));
    }
    content
}

/// XML polydata square with one scalar cell array `p`
pub fn square_vtp(value: f64) -> String {
    format!(
        r#"<?xml version="1.0"?>
<VTKFile type="PolyData" version="0.1" byte_order="LittleEndian">
  <PolyData>
    <Piece NumberOfPoints="4" NumberOfVerts="0" NumberOfLines="0" NumberOfStrips="0" NumberOfPolys="1">
      <CellData>
        <DataArray type="Float64" Name="p" format="ascii">{}</DataArray>
      </CellData>
      <Points>
        <DataArray type="Float32" NumberOfComponents="3" format="ascii">0 0 0 1 0 0 1 1 0 0 1 0</DataArray>
      </Points>
      <Polys>
        <DataArray type="Int32" Name="connectivity" format="ascii">0 1 2 3</DataArray>
        <DataArray type="Int32" Name="offsets" format="ascii">4</DataArray>
      </Polys>
    </Piece>
  </PolyData>
</VTKFile>
"#,
        value
    )
}

/// Sampled line rows: distance followed by one scalar
pub fn sampled_line(values: &[f64]) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {}\n", i as f64 * 0.5, v))
        .collect()
}
