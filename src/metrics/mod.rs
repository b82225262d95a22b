//! Metrics scraping, aggregation and reporting
//!
//! This module provides:
//! - Extraction of numeric cells from the runtime's metric tables
//! - Counter summation and duration averaging across processes
//! - The derived inconsistency percentage
//! - YAML records per workload run, JSON or YAML console output for
//!   reports that are not persisted

pub mod aggregator;
pub mod report;
pub mod reporter;
pub mod table;

pub use aggregator::{MetricsAggregator, MetricsSource, RuntimeMetricsSource};
pub use report::{inconsistency_percentage, mean_duration, round2, sum_counter, MetricsReport};
pub use reporter::{run_dir, MetricsReporter, OutputFormat};
pub use table::{extract_samples, MetricClass, MetricKind, MetricSample, SampleValue};
