//! JSON report adapter.

use crate::domain::error::ContrarianError;
use crate::domain::market::AnalysisResult;
use crate::ports::report_port::ReportPort;

/// Renders analysis results as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter {
    pub pretty: bool,
}

impl JsonReportAdapter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ReportPort for JsonReportAdapter {
    fn render(&self, results: &[AnalysisResult]) -> Result<String, ContrarianError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(results)
        } else {
            serde_json::to_string(results)
        };
        rendered.map_err(|e| ContrarianError::Report {
            reason: format!("failed to serialize results: {}", e),
        })
    }
}
