//! Aggregated metrics report

use serde::{Serialize, Serializer};

use super::table::{MetricClass, MetricKind, MetricSample};

/// Round to two decimal places, exact halves to even (`0.125` -> `0.12`)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn serialize_round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// Sum of counter samples, saturating at `u64::MAX`
pub fn sum_counter(samples: &[MetricSample]) -> u64 {
    samples
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.value.as_u64()))
}

/// Arithmetic mean of duration samples, zero when there are none
pub fn mean_duration(samples: &[MetricSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f64 = samples.iter().map(|s| s.value.as_f64()).sum();
    total / samples.len() as f64
}

/// Share of received notifications that observed an inconsistency, in percent
///
/// Zero when nothing was received.
pub fn inconsistency_percentage(inconsistencies: u64, received: u64) -> f64 {
    if received == 0 {
        return 0.0;
    }
    round2(inconsistencies as f64 / received as f64 * 100.0)
}

/// Result of one aggregation run
///
/// Fields are private: the derived values can only come from
/// [`MetricsReport::from_samples`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    num_composed_posts: u64,
    num_received_notifications: u64,
    num_inconsistencies: u64,
    per_inconsistencies: f64,
    #[serde(serialize_with = "serialize_round2")]
    avg_compose_post_duration_ms: f64,
    #[serde(serialize_with = "serialize_round2")]
    avg_write_post_duration_ms: f64,
    #[serde(serialize_with = "serialize_round2")]
    avg_queue_duration_ms: f64,
}

impl MetricsReport {
    /// Build a report from per-metric samples
    ///
    /// `samples_for` returns the samples scraped for one metric; it is called
    /// once per [`MetricKind`].
    pub fn from_samples<F>(mut samples_for: F) -> Self
    where
        F: FnMut(MetricKind) -> Vec<MetricSample>,
    {
        let mut counter = |kind: MetricKind| {
            debug_assert_eq!(kind.class(), MetricClass::Counter);
            sum_counter(&samples_for(kind))
        };
        let num_composed_posts = counter(MetricKind::ComposedPosts);
        let num_received_notifications = counter(MetricKind::ReceivedNotifications);
        let num_inconsistencies = counter(MetricKind::Inconsistencies);

        let mut duration = |kind: MetricKind| {
            debug_assert_eq!(kind.class(), MetricClass::Duration);
            mean_duration(&samples_for(kind))
        };
        let avg_compose_post_duration_ms = duration(MetricKind::ComposePostDuration);
        let avg_write_post_duration_ms = duration(MetricKind::WritePostDuration);
        let avg_queue_duration_ms = duration(MetricKind::QueueDuration);

        Self {
            num_composed_posts,
            num_received_notifications,
            num_inconsistencies,
            per_inconsistencies: inconsistency_percentage(
                num_inconsistencies,
                num_received_notifications,
            ),
            avg_compose_post_duration_ms,
            avg_write_post_duration_ms,
            avg_queue_duration_ms,
        }
    }

    pub fn composed_posts(&self) -> u64 {
        self.num_composed_posts
    }

    pub fn received_notifications(&self) -> u64 {
        self.num_received_notifications
    }

    pub fn inconsistencies(&self) -> u64 {
        self.num_inconsistencies
    }

    pub fn inconsistency_percentage(&self) -> f64 {
        self.per_inconsistencies
    }

    pub fn avg_compose_post_duration_ms(&self) -> f64 {
        self.avg_compose_post_duration_ms
    }

    pub fn avg_write_post_duration_ms(&self) -> f64 {
        self.avg_write_post_duration_ms
    }

    pub fn avg_queue_duration_ms(&self) -> f64 {
        self.avg_queue_duration_ms
    }

    /// JSON form with the same fields and rounding as the YAML record
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
