//! Report output - console echo and persisted records
//!
//! Records live at `<evaluation dir>/<target>/<timestamp>/metrics.yml`, next to
//! the raw `workload.out` of the same run.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::info;

use super::report::MetricsReport;
use crate::utils::MetricsError;

/// Console format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Directory holding every artefact of one workload run
pub fn run_dir(evaluation_dir: &Path, target: &str, timestamp: &str) -> PathBuf {
    evaluation_dir.join(target).join(timestamp)
}

/// Prints and persists metrics reports
pub struct MetricsReporter {
    format: OutputFormat,
    evaluation_dir: PathBuf,
}

impl MetricsReporter {
    pub fn new(format: OutputFormat, evaluation_dir: impl Into<PathBuf>) -> Self {
        Self {
            format,
            evaluation_dir: evaluation_dir.into(),
        }
    }

    /// Render a report in the console format
    pub fn render(&self, report: &MetricsReport) -> Result<String, MetricsError> {
        match self.format {
            OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.to_json()?)?),
        }
    }

    /// Console text for a report
    ///
    /// A persisted run is echoed as the YAML record itself; `--output-format`
    /// only applies to reports that are not written to disk.
    pub fn echo_text(
        &self,
        report: &MetricsReport,
        persisted: bool,
    ) -> Result<String, MetricsError> {
        if persisted {
            Ok(serde_yaml::to_string(report)?)
        } else {
            self.render(report)
        }
    }

    /// Path of the record for a target and timestamp
    pub fn record_path(&self, target: &str, timestamp: &str) -> PathBuf {
        run_dir(&self.evaluation_dir, target, timestamp).join("metrics.yml")
    }

    /// Write the YAML record, creating the run directory if needed
    pub fn write_record(
        &self,
        report: &MetricsReport,
        target: &str,
        timestamp: &str,
    ) -> Result<PathBuf, MetricsError> {
        let path = self.record_path(target, timestamp);
        let yaml = serde_yaml::to_string(report)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| MetricsError::Persist {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, yaml).map_err(|source| MetricsError::Persist {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Persist and echo when a timestamp is given; otherwise only echo
    pub fn publish(
        &self,
        report: &MetricsReport,
        target: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<PathBuf>, MetricsError> {
        println!("{}", self.echo_text(report, timestamp.is_some())?);
        match timestamp {
            Some(ts) => {
                let path = self.write_record(report, target, ts)?;
                info!("evaluation results saved at {}", path.display());
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::table::{MetricKind, MetricSample, SampleValue};

    fn report() -> MetricsReport {
        MetricsReport::from_samples(|metric| match metric {
            MetricKind::ReceivedNotifications => vec![MetricSample {
                metric,
                value: SampleValue::Integer(200),
            }],
            MetricKind::Inconsistencies => vec![MetricSample {
                metric,
                value: SampleValue::Integer(3),
            }],
            MetricKind::ComposePostDuration => vec![MetricSample {
                metric,
                value: SampleValue::Float(7.25),
            }],
            _ => Vec::new(),
        })
    }

    #[test]
    fn test_record_path_layout() {
        let reporter = MetricsReporter::new(OutputFormat::Yaml, "/tmp/evaluation");
        assert_eq!(
            reporter.record_path("gcp", "2024-01-02_03:04:05"),
            PathBuf::from("/tmp/evaluation/gcp/2024-01-02_03:04:05/metrics.yml")
        );
    }

    #[test]
    fn test_write_record() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = MetricsReporter::new(OutputFormat::Yaml, dir.path());

        let path = reporter.write_record(&report(), "local", "ts").unwrap();
        assert!(path.ends_with("local/ts/metrics.yml"));

        let record: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record["num_received_notifications"].as_u64(), Some(200));
        assert_eq!(record["num_inconsistencies"].as_u64(), Some(3));
        assert_eq!(record["per_inconsistencies"].as_f64(), Some(1.5));
        assert_eq!(record["avg_compose_post_duration_ms"].as_f64(), Some(7.25));
        assert_eq!(record.as_mapping().unwrap().len(), 7);
    }

    #[test]
    fn test_persisted_echo_is_record() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = MetricsReporter::new(OutputFormat::Json, dir.path());
        let report = report();

        let path = reporter.write_record(&report, "gcp", "ts").unwrap();
        let echo = reporter.echo_text(&report, true).unwrap();
        assert_eq!(echo, fs::read_to_string(path).unwrap());

        let console = reporter.echo_text(&report, false).unwrap();
        assert!(console.trim_start().starts_with('{'));
    }

    #[test]
    fn test_publish_without_timestamp_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = MetricsReporter::new(OutputFormat::Json, dir.path());
        assert!(reporter.publish(&report(), "local", None).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_render_json() {
        let reporter = MetricsReporter::new(OutputFormat::Json, "unused");
        let text = reporter.render(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["num_inconsistencies"], 3);
        assert_eq!(value["per_inconsistencies"], 1.5);
    }
}
