//! Metrics aggregation across all application processes

use tracing::debug;

use super::report::MetricsReport;
use super::table::{extract_samples, MetricKind, MetricSample};
use crate::utils::{CommandError, CommandRunner, CommandSpec, MetricsError};

/// Produces the raw metric table for one metric
pub trait MetricsSource {
    fn fetch(&self, metric: MetricKind) -> Result<String, CommandError>;
}

/// Queries the application runtime CLI: `<runtime> <deployer> metrics <name>`
pub struct RuntimeMetricsSource<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    deployer: String,
}

impl<'a> RuntimeMetricsSource<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: &str, deployer: &str) -> Self {
        Self {
            runner,
            program: program.to_string(),
            deployer: deployer.to_string(),
        }
    }

    fn spec(&self, metric: MetricKind) -> CommandSpec {
        CommandSpec::new(&self.program).args([
            self.deployer.as_str(),
            "metrics",
            metric.runtime_name(),
        ])
    }
}

impl MetricsSource for RuntimeMetricsSource<'_> {
    fn fetch(&self, metric: MetricKind) -> Result<String, CommandError> {
        self.runner.output(&self.spec(metric))
    }
}

/// Turns metric tables into a [`MetricsReport`]
pub struct MetricsAggregator<'a, S: MetricsSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: MetricsSource + ?Sized> MetricsAggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fetch and scrape one metric
    pub fn samples(&self, metric: MetricKind) -> Result<Vec<MetricSample>, MetricsError> {
        let text = self
            .source
            .fetch(metric)
            .map_err(|source| MetricsError::SourceUnavailable {
                metric: metric.runtime_name(),
                source,
            })?;
        let samples = extract_samples(metric, &text);
        debug!("{}: {} rows", metric, samples.len());
        Ok(samples)
    }

    /// Fetch every metric and aggregate
    ///
    /// Any source failure aborts the whole run; a table with no rows counts
    /// as zero.
    pub fn aggregate(&self) -> Result<MetricsReport, MetricsError> {
        let mut fetched = Vec::with_capacity(MetricKind::ALL.len());
        for metric in MetricKind::ALL {
            fetched.push((metric, self.samples(metric)?));
        }

        Ok(MetricsReport::from_samples(|kind| {
            fetched
                .iter()
                .find(|(m, _)| *m == kind)
                .map(|(_, s)| s.clone())
                .unwrap_or_default()
        }))
    }
}
