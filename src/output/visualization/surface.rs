//! Surface plots for mesh samples
//!
//! Every displayed field gets its own panel: the mesh colored by value and a
//! color bar with the domain bounds underneath. Planar projections are drawn
//! on a 2-D chart over the two kept axes; spatial ones on a 3-D chart.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;

use super::colormap::Colormap;
use super::config::PlotConfig;
use super::request::{SurfacePanel, SurfaceScene};
use crate::context::{Axis, Projection};

/// Draw a surface scene on any backend
pub(crate) fn draw_surface<DB: DrawingBackend>(
    backend: DB,
    title: &str,
    scene: &SurfaceScene,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;
    let root = root.titled(title, ("sans-serif", config.caption_size as f64).into_font())?;

    let n = scene.panels.len().max(1);
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    for (panel, area) in scene.panels.iter().zip(root.split_evenly((rows, cols)).iter()) {
        let (_, height) = area.dim_in_pixel();
        let bar_height = (height / 8).clamp(30, 60);
        let (plot, bar) = area.split_vertically(height.saturating_sub(bar_height));

        match scene.projection {
            Projection::Planar { .. } => draw_planar(&plot, scene, panel, config)?,
            Projection::Spatial => draw_spatial(&plot, scene, panel, config)?,
        }
        draw_colorbar(&bar, panel, config)?;
    }

    root.present()?;
    Ok(())
}

/// Cells with a finite value and their color
fn colored_cells<'a>(
    scene: &'a SurfaceScene,
    panel: &'a SurfacePanel,
    colormap: Colormap,
) -> impl Iterator<Item = (&'a [usize], RGBColor)> + 'a {
    scene
        .cells
        .iter()
        .zip(&panel.values)
        .filter(|(_, v)| v.is_finite())
        .map(move |(cell, v)| (cell.as_slice(), colormap.color(panel.range.normalize(*v))))
}

fn draw_planar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &SurfaceScene,
    panel: &SurfacePanel,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let (a, b) = scene.projection.kept_axes().unwrap_or((Axis::X, Axis::Y));

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.label, ("sans-serif", config.caption_size as f64 / 2.0).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(scene.bounds[a.index()].as_range(), scene.bounds[b.index()].as_range())?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(scene.axis_labels[a.index()].as_str())
        .y_desc(scene.axis_labels[b.index()].as_str());
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let project = |i: usize| scene.projection.project(&scene.points[i]);
    let cells = || colored_cells(scene, panel, config.colormap_for(&panel.field));

    chart.draw_series(
        cells()
            .filter(|(cell, _)| cell.len() >= 3)
            .map(|(cell, color)| Polygon::new(cell.iter().map(|&i| project(i)).collect::<Vec<_>>(), color.filled())),
    )?;
    chart.draw_series(cells().filter(|(cell, _)| cell.len() == 2).map(|(cell, color)| {
        PathElement::new(
            cell.iter().map(|&i| project(i)).collect::<Vec<_>>(),
            color.stroke_width(config.line_width),
        )
    }))?;
    chart.draw_series(
        cells()
            .filter(|(cell, _)| cell.len() == 1)
            .map(|(cell, color)| Circle::new(project(cell[0]), config.marker_size, color.filled())),
    )?;

    Ok(())
}

fn draw_spatial<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &SurfaceScene,
    panel: &SurfacePanel,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let [x, y, z] = scene.bounds;

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.label, ("sans-serif", config.caption_size as f64 / 2.0).into_font())
        .margin(15)
        .build_cartesian_3d(x.as_range(), y.as_range(), z.as_range())?;
    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.4;
        pb.scale = 0.8;
        pb.into_matrix()
    });
    chart.configure_axes().draw()?;

    let point = |i: usize| {
        let p = scene.points[i];
        (p.x, p.y, p.z)
    };
    let cells = || colored_cells(scene, panel, config.colormap_for(&panel.field));

    chart.draw_series(
        cells()
            .filter(|(cell, _)| cell.len() >= 3)
            .map(|(cell, color)| Polygon::new(cell.iter().map(|&i| point(i)).collect::<Vec<_>>(), color.filled())),
    )?;
    chart.draw_series(cells().filter(|(cell, _)| cell.len() == 2).map(|(cell, color)| {
        PathElement::new(
            cell.iter().map(|&i| point(i)).collect::<Vec<_>>(),
            color.stroke_width(config.line_width),
        )
    }))?;
    chart.draw_series(
        cells()
            .filter(|(cell, _)| cell.len() == 1)
            .map(|(cell, color)| Circle::new(point(cell[0]), config.marker_size, color.filled())),
    )?;

    Ok(())
}

fn format_bound(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && !(1e-2..1e4).contains(&magnitude) {
        format!("{:.3e}", value)
    } else {
        format!("{:.3}", value)
    }
}

/// Horizontal color bar with the min and max of the panel domain
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &SurfacePanel,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    const STEPS: i32 = 64;
    let colormap = config.colormap_for(&panel.field);

    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let margin = w / 10;
    let width = (w - 2 * margin).max(STEPS);
    let (top, bottom) = (2, (h / 2).max(3));

    for k in 0..STEPS {
        let x0 = margin + width * k / STEPS;
        let x1 = margin + width * (k + 1) / STEPS;
        let color = colormap.color((k as f64 + 0.5) / STEPS as f64);
        area.draw(&Rectangle::new([(x0, top), (x1, bottom)], color.filled()))?;
    }
    area.draw(&Rectangle::new([(margin, top), (margin + width, bottom)], BLACK.stroke_width(1)))?;

    let style = TextStyle::from(("sans-serif", 14.0).into_font());
    let low = format_bound(panel.range.min);
    let high = format_bound(panel.range.max);
    let (high_width, _) = area.estimate_text_size(&high, &style)?;

    area.draw(&Text::new(low, (margin, bottom + 4), style.clone()))?;
    area.draw(&Text::new(high, (margin + width - high_width as i32, bottom + 4), style))?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
