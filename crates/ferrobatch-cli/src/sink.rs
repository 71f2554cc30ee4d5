//! Log sink writing run reports to the log directory

use crate::json_output::ReportJson;
use anyhow::{Context, Result};
use ferrobatch_config::{LoggingSettings, ReportFormat};
use ferrobatch_engine::FailureReport;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use tracing::{debug, info};

/// Persists a [`FailureReport`] as `<prefix>_<YYYYMMDD_HHMMSS>_<run>.<ext>`
///
/// `<run>` is the first eight hex digits of the run id. An existing file is
/// never replaced.
#[derive(Debug, Clone)]
pub struct LogSink {
    directory: PathBuf,
    prefix: String,
    format: ReportFormat,
    failures_only: bool,
}

impl LogSink {
    /// Sink for the configured log directory, `None` when no directory is set
    pub fn from_settings(settings: &LoggingSettings) -> Option<Self> {
        settings.directory.as_ref().map(|directory| Self {
            directory: directory.clone(),
            prefix: settings.file_prefix.clone(),
            format: settings.report_format,
            failures_only: settings.failures_only,
        })
    }

    /// File name the report will be written under
    pub fn file_name(&self, report: &FailureReport) -> String {
        let run_id = report.run_id.simple().to_string();
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            report.started_at.format("%Y%m%d_%H%M%S"),
            &run_id[..8],
            self.format.extension()
        )
    }

    /// Write the report, returning where it went
    ///
    /// Nothing is written when only failures are wanted and the run had none.
    pub fn write(&self, report: &FailureReport) -> Result<Option<PathBuf>> {
        if self.failures_only && !report.has_failures() {
            debug!("No failures to report, skipping report file");
            return Ok(None);
        }

        fs::create_dir_all(&self.directory).with_context(|| {
            format!("Failed to create log directory {}", self.directory.display())
        })?;

        let content = match self.format {
            ReportFormat::Text => render_text(report, self.failures_only),
            ReportFormat::Json => {
                serde_json::to_string_pretty(&ReportJson::from_report(report, self.failures_only))
                    .context("Failed to serialize report")?
            }
        };

        let path = self.directory.join(self.file_name(report));
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| file.write_all(content.as_bytes()))
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        info!("Report written to {}", path.display());
        Ok(Some(path))
    }
}

/// Render the report as plain text
pub fn render_text(report: &FailureReport, failures_only: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ferrobatch run {}", report.run_id);
    let _ = writeln!(
        out,
        "started:  {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(finished_at) = report.finished_at {
        let _ = writeln!(out, "finished: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    }
    let _ = writeln!(out, "summary:  {}", report.summary());

    for result in &report.results {
        if failures_only && !result.has_failures() {
            continue;
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "[{}] {} found={} selected={} transferred={} failed={}",
            result.task,
            format!("{:?}", result.state).to_lowercase(),
            result.files_found,
            result.files_selected,
            result.succeeded_count(),
            result.failed_count()
        );

        if let Some(error) = &result.task_level_error {
            let _ = writeln!(out, "  TASK FAILED {}", error);
        }

        for outcome in &result.outcomes {
            match &outcome.error {
                Some(error) => {
                    let _ = writeln!(out, "  FAILED {}", error);
                }
                None if !failures_only => {
                    let _ = writeln!(
                        out,
                        "  OK {} -> {} ({} bytes)",
                        outcome.candidate.path.display(),
                        outcome.destination.display(),
                        outcome.bytes_transferred
                    );
                }
                None => {}
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clean_report, sample_report};
    use tempfile::TempDir;

    fn sink(dir: &TempDir, format: ReportFormat, failures_only: bool) -> LogSink {
        LogSink::from_settings(&LoggingSettings {
            directory: Some(dir.path().join("logs")),
            report_format: format,
            failures_only,
            file_prefix: "nightly".to_string(),
            ..LoggingSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_directory_means_no_sink() {
        assert!(LogSink::from_settings(&LoggingSettings::default()).is_none());
    }

    #[test]
    fn test_file_name_uses_run_start() {
        let dir = TempDir::new().unwrap();
        let report = sample_report();
        assert_eq!(
            sink(&dir, ReportFormat::Text, true).file_name(&report),
            "nightly_20250326_070509_67e55044.log"
        );
        assert_eq!(
            sink(&dir, ReportFormat::Json, true).file_name(&report),
            "nightly_20250326_070509_67e55044.json"
        );
    }

    #[test]
    fn test_text_report_lists_failures_only() {
        let dir = TempDir::new().unwrap();
        let path = sink(&dir, ReportFormat::Text, true)
            .write(&sample_report())
            .unwrap()
            .unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("summary:  tasks=3 failed_tasks=1"));
        assert!(content.contains("FAILED [destination_exists]"));
        assert!(content.contains("TASK FAILED [scan]"));
        assert!(!content.contains("OK "));
        assert!(!content.contains("clean ("));
    }

    #[test]
    fn test_text_report_all_entries() {
        let text = render_text(&sample_report(), false);
        assert!(text.contains("OK /data/reports/in/Analyse_1.xlsx"));
        assert!(text.contains("clean (copy"));
    }

    #[test]
    fn test_json_report_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let path = sink(&dir, ReportFormat::Json, false)
            .write(&sample_report())
            .unwrap()
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["tasks"].as_array().unwrap().len(), 3);
        assert_eq!(value["metadata"]["failures_only"], false);
    }

    #[test]
    fn test_clean_run_writes_nothing_when_failures_only() {
        let dir = TempDir::new().unwrap();
        let written = sink(&dir, ReportFormat::Text, true)
            .write(&clean_report())
            .unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_runs_in_the_same_second_get_their_own_files() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, ReportFormat::Text, true);
        let first = sample_report();
        let mut second = sample_report();
        second.run_id = uuid::Uuid::from_u128(1);

        let first_path = sink.write(&first).unwrap().unwrap();
        let second_path = sink.write(&second).unwrap().unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(fs::read_dir(dir.path().join("logs")).unwrap().count(), 2);
    }

    #[test]
    fn test_existing_report_is_not_replaced() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, ReportFormat::Text, true);
        let report = sample_report();
        let path = sink.write(&report).unwrap().unwrap();
        fs::write(&path, "kept").unwrap();

        assert!(sink.write(&report).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }
}
