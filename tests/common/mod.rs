//! Common utilities for integration tests

#![allow(dead_code)]

pub mod case_builder;
pub mod recording;

// Re-export commonly used items
pub use case_builder::{sampled_line, square_vtk, square_vtp, CaseBuilder, RESIDUALS};
pub use recording::RecordingPrimitive;
