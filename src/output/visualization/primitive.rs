//! The drawing seam
//!
//! The pipeline only builds [`RenderRequest`]s; turning one into an image file
//! is delegated to a [`RenderPrimitive`]. [`PlottersPrimitive`] is the
//! production implementation, tests substitute a recorder.

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use tracing::debug;

use super::config::PlotConfig;
use super::curves::draw_curves;
use super::request::{RenderContent, RenderRequest};
use super::surface::draw_surface;
use crate::context::ImageFormat;
use crate::error::{PostError, PostResult};

/// Something that can turn a request into an image file
///
/// Implementations are shared across worker threads.
pub trait RenderPrimitive: Sync {
    /// Produce `request.output_path`
    ///
    /// # Errors
    ///
    /// `RenderFailure` when drawing fails, `Io` when the file cannot be
    /// written. On error no file may be left at the destination.
    fn render(&self, request: &RenderRequest) -> PostResult<()>;
}

/// Renders with `plotters`, writing atomically through a temporary file
#[derive(Debug, Clone, Default)]
pub struct PlottersPrimitive {
    config: PlotConfig,
}

impl PlottersPrimitive {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }
}

impl RenderPrimitive for PlottersPrimitive {
    fn render(&self, request: &RenderRequest) -> PostResult<()> {
        let destination = request.output_path.as_path();
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| PostError::io(dir, e))?;

        // The extension of the temporary file selects the bitmap encoder
        let temp = tempfile::Builder::new()
            .prefix(".ofpost-")
            .suffix(&format!(".{}", request.format.extension()))
            .tempfile_in(dir)
            .map_err(|e| PostError::io(dir, e))?;

        draw(temp.path(), request, &self.config).map_err(|e| PostError::render(destination, e.to_string()))?;

        temp.persist(destination)
            .map_err(|e| PostError::io(destination, e.error))?;
        debug!("wrote {}", destination.display());
        Ok(())
    }
}

fn draw(path: &Path, request: &RenderRequest, config: &PlotConfig) -> Result<(), Box<dyn Error>> {
    match request.format {
        ImageFormat::Svg => draw_content(SVGBackend::new(path, request.size), request, config),
        ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Jpeg => {
            draw_content(BitMapBackend::new(path, request.size), request, config)
        }
    }
}

fn draw_content<DB: DrawingBackend>(
    backend: DB,
    request: &RenderRequest,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    match &request.content {
        RenderContent::Surface(scene) => draw_surface(backend, &request.title, scene, config),
        RenderContent::Curves(scene) => draw_curves(backend, &request.title, scene, config),
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::visualization::domain::ValueRange;
    use crate::output::visualization::request::{Curve, CurveScene};
    use std::path::PathBuf;

    fn request(output_path: PathBuf, format: ImageFormat) -> RenderRequest {
        RenderRequest {
            output_path,
            format,
            size: (320, 240),
            title: "points".into(),
            content: RenderContent::Curves(CurveScene {
                x_label: "distance [m]".into(),
                y_label: "T [K]".into(),
                x_range: ValueRange { min: 0.0, max: 1.0 },
                y_range: ValueRange { min: 290.0, max: 310.0 },
                log_y: false,
                curves: vec![Curve {
                    label: "T [K]".into(),
                    points: vec![(0.0, 290.0), (1.0, 310.0)],
                }],
            }),
        }
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".ofpost-"))
            .collect()
    }

    #[test]
    fn test_renders_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postProcessing/sets/line_T.png");

        PlottersPrimitive::default().render(&request(path.clone(), ImageFormat::Png)).unwrap();
        assert!(path.exists());
        assert!(leftovers(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_overwrites_existing_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_T.svg");
        std::fs::write(&path, "stale").unwrap();

        PlottersPrimitive::default().render(&request(path.clone(), ImageFormat::Svg)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_unwritable_destination_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let err = PlottersPrimitive::default()
            .render(&request(blocker.join("line_T.png"), ImageFormat::Png))
            .unwrap_err();
        assert!(matches!(err, PostError::Io { .. }));
        assert_eq!(leftovers(dir.path()).len(), 0);
    }
}
