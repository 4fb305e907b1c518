//! Build pipelines

pub mod script;
pub mod style;

use crate::error::Result;
use crate::models::{Mode, TaskPipelineConfig, TaskRunReport, MAX_CAPTURED_STDERR};
use async_trait::async_trait;
use std::path::Path;

/// Pipeline trait implemented by each build task kind
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Run the pipeline with the given configuration and build mode,
    /// resolving relative paths against `project_root`
    async fn run(
        &self,
        config: &TaskPipelineConfig,
        mode: Mode,
        project_root: &Path,
    ) -> Result<TaskRunReport>;
}

/// Truncate captured diagnostic output to MAX_CAPTURED_STDERR
///
/// Returns (truncated_string, was_truncated)
pub(crate) fn truncate_output_bytes(data: &[u8]) -> (String, bool) {
    let truncated = data.len() > MAX_CAPTURED_STDERR;
    let bytes = if truncated {
        &data[..MAX_CAPTURED_STDERR]
    } else {
        data
    };

    let output = String::from_utf8_lossy(bytes).to_string();
    (output, truncated)
}

/// Format a byte count for the artifact size report
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

    if bytes < 1000 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(999), "999 B");
        assert_eq!(human_bytes(1000), "1.00 kB");
        assert_eq!(human_bytes(1536), "1.54 kB");
        assert_eq!(human_bytes(1_000_000), "1.00 MB");
        assert_eq!(human_bytes(2_500_000), "2.50 MB");
        assert_eq!(human_bytes(1_000_000_000), "1.00 GB");
    }

    #[test]
    fn test_truncate_output() {
        let small_data = b"hello";
        let (output, truncated) = truncate_output_bytes(small_data);
        assert_eq!(output, "hello");
        assert!(!truncated);

        // Create large data
        let large_data = vec![b'x'; MAX_CAPTURED_STDERR + 1000];
        let (output, truncated) = truncate_output_bytes(&large_data);
        assert_eq!(output.len(), MAX_CAPTURED_STDERR);
        assert!(truncated);
    }
}
