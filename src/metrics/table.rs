//! Metric table scraping
//!
//! The application runtime prints one box-drawn table per metric, one data
//! row per process:
//!
//! ```text
//! ╭────────────────────────────────────────────────────────────────────────╮
//! │ // The number of composed posts                                        │
//! │ composed_posts: COUNTER                                                │
//! ├───────────────────┬────────────────────┬───────────────────────┬───────┤
//! │ serviceweaver_app │ serviceweaver_node │ serviceweaver_version │ Value │
//! ├───────────────────┼────────────────────┼───────────────────────┼───────┤
//! │ weaver-dsb-db     │ 0932683b           │ 1cd20361              │ 12    │
//! │ weaver-dsb-db     │ 1205179c           │ 1cd20361              │ 7     │
//! ╰───────────────────┴────────────────────┴───────────────────────┴───────╯
//! ```
//!
//! Only the numeric `Value` cell of data rows is extracted.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Data row: four column separators, then a numeric cell closed by a fifth
const ROW_PATTERN: &str = r"^.*│.*│.*│.*│\s*(\d+\.?\d*)\s*│.*$";

fn row_regex() -> &'static Regex {
    static ROW: OnceLock<Regex> = OnceLock::new();
    ROW.get_or_init(|| Regex::new(ROW_PATTERN).expect("row pattern is valid"))
}

/// How values of a metric combine across processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricClass {
    /// Summed across rows
    Counter,
    /// Averaged across rows
    Duration,
}

/// The metrics exported by the social network services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    ComposePostDuration,
    ComposedPosts,
    WritePostDuration,
    QueueDuration,
    ReceivedNotifications,
    Inconsistencies,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::ComposePostDuration,
        MetricKind::ComposedPosts,
        MetricKind::WritePostDuration,
        MetricKind::QueueDuration,
        MetricKind::ReceivedNotifications,
        MetricKind::Inconsistencies,
    ];

    /// Name the runtime exports the metric under
    pub fn runtime_name(&self) -> &'static str {
        match self {
            MetricKind::ComposePostDuration => "sn_compose_post_duration_ms",
            MetricKind::ComposedPosts => "sn_composed_posts",
            MetricKind::WritePostDuration => "sn_write_post_duration_ms",
            MetricKind::QueueDuration => "sn_queue_duration_ms",
            MetricKind::ReceivedNotifications => "sn_received_notifications",
            MetricKind::Inconsistencies => "sn_inconsistencies",
        }
    }

    pub fn class(&self) -> MetricClass {
        match self {
            MetricKind::ComposedPosts
            | MetricKind::ReceivedNotifications
            | MetricKind::Inconsistencies => MetricClass::Counter,
            MetricKind::ComposePostDuration
            | MetricKind::WritePostDuration
            | MetricKind::QueueDuration => MetricClass::Duration,
        }
    }

    pub fn from_runtime_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.runtime_name() == name)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.runtime_name())
    }
}

/// Numeric cell value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Integer(u64),
    Float(f64),
}

impl SampleValue {
    /// Integer unless the text carries a decimal point
    ///
    /// Integers beyond `u64` are kept as floats instead of being dropped.
    fn parse(text: &str) -> Option<Self> {
        if text.contains('.') {
            return text.parse().ok().map(SampleValue::Float);
        }
        match text.parse() {
            Ok(v) => Some(SampleValue::Integer(v)),
            Err(e) => {
                debug!("cell '{}' is not a u64 ({}), reading it as a float", text, e);
                text.parse().ok().map(SampleValue::Float)
            }
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            SampleValue::Integer(v) => v as f64,
            SampleValue::Float(v) => v,
        }
    }

    /// Counters are integral; a fractional counter cell is truncated and an
    /// out-of-range one saturates at `u64::MAX`
    pub fn as_u64(&self) -> u64 {
        match *self {
            SampleValue::Integer(v) => v,
            SampleValue::Float(v) => v as u64,
        }
    }
}

/// One value scraped from a table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub metric: MetricKind,
    pub value: SampleValue,
}

/// Extract every data-row value from a metric table, in row order
///
/// Headers, borders and blank lines are skipped. No rows is a valid, empty
/// result.
pub fn extract_samples(metric: MetricKind, text: &str) -> Vec<MetricSample> {
    let re = row_regex();
    text.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| SampleValue::parse(m.as_str()))
        .map(|value| MetricSample { metric, value })
        .collect()
}

/// Render a table the way the runtime prints it
#[cfg(test)]
pub(crate) fn sample_table(title: &str, values: &[&str]) -> String {
    let mut out = String::new();
    out.push_str("╭────────────────────────────────────────────────────────────────────────╮\n");
    out.push_str(&format!("│ // {:<68} │\n", title));
    out.push_str("├───────────────────┬────────────────────┬───────────────────────┬───────┤\n");
    out.push_str("│ serviceweaver_app │ serviceweaver_node │ serviceweaver_version │ Value │\n");
    out.push_str("├───────────────────┼────────────────────┼───────────────────────┼───────┤\n");
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!(
            "│ weaver-dsb-db     │ {:08x}           │ 1cd20361              │ {:<5} │\n",
            i, v
        ));
    }
    out.push_str("╰───────────────────┴────────────────────┴───────────────────────┴───────╯\n");
    out
}
