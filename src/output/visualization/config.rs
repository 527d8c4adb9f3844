//! Drawing style shared by the surface and curve renderers
//!
//! Image size, title and data come with each [`RenderRequest`]; this module
//! only holds what stays the same across a whole run.
//!
//! [`RenderRequest`]: super::RenderRequest

use plotters::prelude::*;
use std::collections::BTreeMap;

use super::colormap::Colormap;
use crate::context::units;

/// Style used for every image of a run
///
/// # Example: custom curve colors
///
/// ```rust,ignore
/// use ofpost_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let mut config = PlotConfig::with_series_colors(vec![BLACK, RED, BLUE]);
/// config.line_width = 3;
/// config.show_grid = false;
/// ```
#[derive(Clone, Debug)]
pub struct PlotConfig {
    /// Optional colors for curve plots (one per curve)
    ///
    /// If None, uses default palette: [RED, BLUE, GREEN, MAGENTA, CYAN, ...]
    pub series_colors: Option<Vec<RGBColor>>,

    /// Colormap of surface panels without an entry in `field_colormaps`
    /// (default: cool to warm)
    pub colormap: Colormap,

    /// Colormap per base quantity name (`p`, `U`, `T`)
    ///
    /// Components and magnitudes of a vector use the entry of the vector.
    pub field_colormaps: BTreeMap<String, Colormap>,

    /// Background color (default: WHITE)
    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    /// Radius of vertex markers in pixels (default: 3)
    pub marker_size: u32,

    /// Caption font size (default: 40, panels use half of it)
    pub caption_size: u32,

    /// Show grid lines (default: true)
    pub show_grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            series_colors: None,
            colormap: Colormap::default(),
            field_colormaps: BTreeMap::new(),
            background: WHITE,
            line_width: 2,
            marker_size: 3,
            caption_size: 40,
            show_grid: true,
        }
    }
}

impl PlotConfig {
    /// Create config with custom curve colors
    pub fn with_series_colors(colors: Vec<RGBColor>) -> Self {
        Self {
            series_colors: Some(colors),
            ..Self::default()
        }
    }

    /// Create config with another surface colormap
    pub fn with_colormap(colormap: Colormap) -> Self {
        Self {
            colormap,
            ..Self::default()
        }
    }

    /// Builder pattern: use `colormap` for panels showing `field`
    pub fn with_field_colormap(mut self, field: impl Into<String>, colormap: Colormap) -> Self {
        self.field_colormaps.insert(field.into(), colormap);
        self
    }

    /// Colormap for a displayed quantity (`p`, `U_x`, `mag(U)`)
    pub fn colormap_for(&self, field: &str) -> Colormap {
        self.field_colormaps
            .get(field)
            .or_else(|| self.field_colormaps.get(units::base_name(field)))
            .copied()
            .unwrap_or(self.colormap)
    }

    /// Get color for curve at index i
    ///
    /// Uses custom colors if provided, otherwise falls back to default palette
    pub(crate) fn get_series_color(&self, series_index: usize) -> RGBColor {
        if let Some(colors) = &self.series_colors {
            if let Some(color) = colors.get(series_index) {
                return *color;
            }
        }

        const DEFAULT_COLORS: [RGBColor; 10] = [
            RED,
            BLUE,
            GREEN,
            MAGENTA,
            CYAN,
            BLACK,
            RGBColor(255, 165, 0),   // Orange
            RGBColor(128, 0, 128),   // Purple
            RGBColor(255, 192, 203), // Pink
            RGBColor(165, 42, 42),   // Brown
        ];

        DEFAULT_COLORS[series_index % DEFAULT_COLORS.len()]
    }
}

// =================================================================================================
// Tests
// =================================================================================================
