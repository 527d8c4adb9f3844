//! Curve plots for tables and sampled lines
//!
//! One line per displayed field against the abscissa, with fixed axis ranges
//! taken from the series domain. Residual plots draw `log10` values and label
//! the y axis in powers of ten.

use plotters::prelude::*;
use std::error::Error;

use super::config::PlotConfig;
use super::request::CurveScene;

/// Draw a curve scene on any backend
pub(crate) fn draw_curves<DB: DrawingBackend>(
    backend: DB,
    title: &str,
    scene: &CurveScene,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let power_of_ten = |v: &f64| format!("{:.0e}", 10f64.powf(*v));

    let root = backend.into_drawing_area();
    root.fill(&config.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", config.caption_size as f64).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(scene.x_range.as_range(), scene.y_range.padded(0.05).as_range())?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(scene.x_label.as_str()).y_desc(scene.y_label.as_str());
    if scene.log_y {
        mesh.y_label_formatter(&power_of_ten);
    }
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    for (k, curve) in scene.curves.iter().enumerate() {
        let color = config.get_series_color(k);
        let style = ShapeStyle::from(&color).stroke_width(config.line_width);

        for (s, segment) in curve.segments().into_iter().enumerate() {
            if segment.len() == 1 {
                chart.draw_series(
                    segment
                        .iter()
                        .map(|&p| Circle::new(p, config.marker_size, color.filled())),
                )?;
            }

            let series = chart.draw_series(LineSeries::new(segment, style))?;
            if s == 0 {
                series
                    .label(curve.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
        }
    }

    if !scene.curves.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&config.background.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
