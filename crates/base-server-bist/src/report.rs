//! The self-test report and its persistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BistError;

/// File name of the persisted report inside the results directory.
pub const REPORT_FILE_NAME: &str = "bist_results.json";

/// Result of probing one API route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointResult {
    /// Route path.
    pub route: String,
    /// HTTP verb used.
    pub method: String,
    /// Response status, or 0 when no response arrived.
    pub status: u16,
    /// Whether the status was 2xx.
    pub success: bool,
    /// Transport error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of fetching one dashboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Page name.
    pub page: String,
    /// Full URL fetched.
    pub url: String,
    /// Response status, or 0 when no response arrived.
    pub status: u16,
    /// 2xx, valid HTML, and no missing elements.
    pub success: bool,
    /// Whether the body contains `<html`.
    #[serde(default)]
    pub html_valid: bool,
    /// Required elements not found.
    #[serde(default)]
    pub missing_elements: Vec<String>,
    /// Transport error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of probing one external dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyResult {
    /// Dependency name from the configuration.
    pub dependency: String,
    /// URL requested, if one was configured.
    #[serde(default)]
    pub url: Option<String>,
    /// Response status, or 0 when no response arrived.
    pub status: u16,
    /// Whether the status was 2xx.
    pub success: bool,
    /// Transport or configuration error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pass/fail counts across every section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BistSummary {
    /// Number of checks run.
    pub total: usize,
    /// Checks that passed.
    pub passed: usize,
    /// Checks that failed.
    pub failed: usize,
}

/// A complete self-test run.
///
/// `success` records that the run completed, not that every check
/// passed; see [`BistSummary::failed`] for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BistReport {
    /// The run completed.
    pub success: bool,
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// Aggregate counts.
    pub summary: BistSummary,
    /// API route results.
    pub endpoints: Vec<EndpointResult>,
    /// Dashboard page checks.
    pub dashboard_pages: Vec<PageResult>,
    /// External dependency results.
    pub external_dependencies: Vec<DependencyResult>,
}

impl BistReport {
    /// Assemble a report and compute its summary.
    pub fn new(
        timestamp: DateTime<Utc>,
        endpoints: Vec<EndpointResult>,
        dashboard_pages: Vec<PageResult>,
        external_dependencies: Vec<DependencyResult>,
    ) -> Self {
        let outcomes: Vec<bool> = endpoints
            .iter()
            .map(|r| r.success)
            .chain(dashboard_pages.iter().map(|r| r.success))
            .chain(external_dependencies.iter().map(|r| r.success))
            .collect();
        let passed = outcomes.iter().filter(|ok| **ok).count();
        let summary = BistSummary {
            total: outcomes.len(),
            passed,
            failed: outcomes.len().saturating_sub(passed),
        };
        Self {
            success: true,
            timestamp,
            summary,
            endpoints,
            dashboard_pages,
            external_dependencies,
        }
    }

    /// Whether every check passed.
    pub const fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }
}

/// Write `report` to `<results_dir>/bist_results.json`, creating the
/// directory if needed. Returns the file path.
///
/// # Errors
///
/// Returns [`BistError::Io`] if the directory or file cannot be written.
pub fn save_report(report: &BistReport, results_dir: &Path) -> Result<PathBuf, BistError> {
    std::fs::create_dir_all(results_dir).map_err(|source| BistError::Io {
        path: results_dir.to_path_buf(),
        source,
    })?;
    let path = results_dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(&path, json).map_err(|source| BistError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Read the last saved report, or `None` when there is none.
///
/// # Errors
///
/// Returns [`BistError::Io`] if the file exists but cannot be read, or
/// [`BistError::Serde`] if it is not a valid report.
pub fn load_report(results_dir: &Path) -> Result<Option<BistReport>, BistError> {
    let path = results_dir.join(REPORT_FILE_NAME);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(BistError::Io { path, source }),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(route: &str, status: u16) -> EndpointResult {
        EndpointResult {
            route: route.to_owned(),
            method: "GET".to_owned(),
            status,
            success: (200..300).contains(&status),
            error: None,
        }
    }

    #[test]
    fn summary_counts_every_section() {
        let page = PageResult {
            page: "Events".to_owned(),
            url: "http://127.0.0.1:8000/ui/events".to_owned(),
            status: 200,
            success: false,
            html_valid: true,
            missing_elements: vec!["events-container".to_owned()],
            error: None,
        };
        let report = BistReport::new(
            Utc::now(),
            vec![endpoint("/health", 200), endpoint("/missing", 404)],
            vec![page],
            Vec::new(),
        );
        assert!(report.success);
        assert_eq!(report.summary, BistSummary { total: 3, passed: 1, failed: 2 });
        assert!(!report.all_passed());
    }

    #[test]
    fn error_field_is_omitted_when_absent() {
        let value = serde_json::to_value(endpoint("/health", 200)).unwrap_or_default();
        assert!(value.get("error").is_none());
        assert_eq!(value.get("status"), Some(&serde_json::Value::from(200)));
    }

    #[test]
    fn save_then_load() {
        let Some(dir) = tempfile::tempdir().ok() else { return };
        let results = dir.path().join("results");
        assert!(matches!(load_report(&results), Ok(None)));

        let report = BistReport::new(Utc::now(), vec![endpoint("/health", 200)], Vec::new(), Vec::new());
        let path = save_report(&report, &results).ok();
        assert_eq!(path, Some(results.join(REPORT_FILE_NAME)));

        let loaded = load_report(&results).ok().flatten();
        assert_eq!(loaded, Some(report));
    }

    #[test]
    fn corrupt_report_is_an_error() {
        let Some(dir) = tempfile::tempdir().ok() else { return };
        assert!(std::fs::write(dir.path().join(REPORT_FILE_NAME), "not json").is_ok());
        assert!(matches!(load_report(dir.path()), Err(BistError::Serde(_))));
    }
}
