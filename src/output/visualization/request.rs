//! Self-contained drawing instructions
//!
//! A [`RenderRequest`] carries everything a [`RenderPrimitive`] needs to
//! produce one image; it holds no reference to samples or policies.
//!
//! [`RenderPrimitive`]: super::RenderPrimitive

use nalgebra::Point3;
use std::path::PathBuf;

use super::domain::ValueRange;
use crate::context::{ImageFormat, Projection};

/// One image to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub output_path: PathBuf,
    pub format: ImageFormat,
    /// Width and height in pixels
    pub size: (u32, u32),
    pub title: String,
    pub content: RenderContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderContent {
    Surface(SurfaceScene),
    Curves(CurveScene),
}

/// Colored mesh, one panel per displayed field
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceScene {
    pub points: Vec<Point3<f64>>,
    /// Point indices per drawn element: 1 = vertex, 2 = segment, more = polygon
    pub cells: Vec<Vec<usize>>,
    pub projection: Projection,
    /// Axis ranges in x, y, z order
    pub bounds: [ValueRange; 3],
    /// Axis labels in x, y, z order
    pub axis_labels: [String; 3],
    pub panels: Vec<SurfacePanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePanel {
    /// Displayed quantity (`p`, `U_mag`)
    pub field: String,
    /// Legend label, with unit
    pub label: String,
    /// One value per cell
    pub values: Vec<f64>,
    /// Color domain
    pub range: ValueRange,
}

/// Line plot
#[derive(Debug, Clone, PartialEq)]
pub struct CurveScene {
    pub x_label: String,
    pub y_label: String,
    pub x_range: ValueRange,
    /// In plotted units (`log10` of the values when `log_y`)
    pub y_range: ValueRange,
    pub log_y: bool,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    /// Points in plotted units; non-finite ordinates break the line
    pub points: Vec<(f64, f64)>,
}

impl Curve {
    /// Runs of consecutive finite points
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(x, y) in &self.points {
            if x.is_finite() && y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}
