//! A render primitive that only remembers what it was asked to draw

use std::sync::Mutex;

use ofpost_rs::error::{PostError, PostResult};
use ofpost_rs::output::{RenderPrimitive, RenderRequest};

#[derive(Default)]
pub struct RecordingPrimitive {
    requests: Mutex<Vec<RenderRequest>>,
    /// Fail every request whose output file name contains this fragment
    fail_on: Option<String>,
}

impl RecordingPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(fragment: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_on: Some(fragment.to_string()),
        }
    }

    /// Recorded requests, sorted by output path
    pub fn requests(&self) -> Vec<RenderRequest> {
        let mut requests = self.requests.lock().expect("recorder lock").clone();
        requests.sort_by(|a, b| a.output_path.cmp(&b.output_path));
        requests
    }
}

impl RenderPrimitive for RecordingPrimitive {
    fn render(&self, request: &RenderRequest) -> PostResult<()> {
        if let Some(fragment) = &self.fail_on {
            if request.output_path.to_string_lossy().contains(fragment.as_str()) {
                return Err(PostError::render(&request.output_path, "refused by test"));
            }
        }
        self.requests.lock().expect("recorder lock").push(request.clone());
        Ok(())
    }
}
