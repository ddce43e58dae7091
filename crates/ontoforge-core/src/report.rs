//! Per-stage diagnostics.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Sample names carried per report.
pub const REPORT_SAMPLE_SIZE: usize = 10;

/// What one pipeline stage kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub kept: usize,
    pub ignored: usize,
    pub sample: Vec<String>,
}

impl StageReport {
    pub fn new(stage: &str, kept: usize, ignored: &[String]) -> Self {
        Self {
            stage: stage.to_string(),
            kept,
            ignored: ignored.len(),
            sample: ignored.iter().take(REPORT_SAMPLE_SIZE).cloned().collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.kept + self.ignored
    }

    /// Share of items ignored, 0-100.
    pub fn percent_ignored(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.ignored as f64 * 100.0 / total as f64,
        }
    }

    pub fn log(&self) {
        if self.ignored == 0 {
            info!("[{}] kept {}", self.stage, self.kept);
        } else {
            info!(
                "[{}] kept {}, ignored {} ({:.1}%); e.g. {}",
                self.stage,
                self.kept,
                self.ignored,
                self.percent_ignored(),
                self.sample.join(", ")
            );
        }
    }
}
