//! Report generation port trait.

use crate::domain::error::ContrarianError;
use crate::domain::market::AnalysisResult;
use std::fs;
use std::path::Path;

/// Port for writing analysis reports.
pub trait ReportPort {
    fn render(&self, results: &[AnalysisResult]) -> Result<String, ContrarianError>;

    /// Default implementation: renders and writes the whole report to `output_path`.
    fn write(&self, results: &[AnalysisResult], output_path: &Path) -> Result<(), ContrarianError> {
        let report = self.render(results)?;
        fs::write(output_path, report).map_err(|e| ContrarianError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
