//! Rendering of unified samples into images
//!
//! # Organization
//!
//! - **scene**: policy-driven field selection and request building
//! - **domain**: per-series value ranges (`SeriesDomain`)
//! - **request**: self-contained drawing instructions (`RenderRequest`)
//! - **naming**: output file paths
//! - **primitive**: the `RenderPrimitive` seam and its `plotters` implementation
//! - **surface**, **curves**: the actual drawing
//! - **config**, **colormap**: shared style
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ofpost_rs::output::visualization::*;
//!
//! let domain = SeriesDomain::from_samples(&frames, &policy);
//! for sample in &frames {
//!     let path = output_path(out_root, sample.source(), None, policy.image_format);
//!     if let Some(request) = build_request(sample, &policy, &domain, None, path) {
//!         PlottersPrimitive::default().render(&request)?;
//!     }
//! }
//! ```
//!
//! | Sample | Content | Drawing |
//! |--------|---------|---------|
//! | mesh | one panel per field, colored cells | `surface` |
//! | table, sampled line | one curve per field | `curves` |

pub mod colormap;
pub mod config;
pub mod curves;
pub mod domain;
pub mod naming;
pub mod primitive;
pub mod request;
pub mod scene;
pub mod surface;

pub use colormap::Colormap;
pub use config::PlotConfig;
pub use domain::{SeriesDomain, ValueRange};
pub use naming::output_path;
pub use primitive::{PlottersPrimitive, RenderPrimitive};
pub use request::{Curve, CurveScene, RenderContent, RenderRequest, SurfacePanel, SurfaceScene};
pub use scene::{build_request, display_fields, DisplayField};
