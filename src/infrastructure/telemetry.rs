//! Cache metrics
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

pub const LOOKUPS_TOTAL: &str = "semantic_cache_lookups_total";
pub const COMPLETIONS_TOTAL: &str = "semantic_cache_completions_total";
pub const QUERY_DURATION_SECONDS: &str = "semantic_cache_query_duration_seconds";

/// Where a query's answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Cache,
    Completion,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Completion => "completion",
        }
    }
}

fn outcome_label(hit: bool) -> &'static str {
    if hit {
        "hit"
    } else {
        "miss"
    }
}

/// Record a hit/miss decision
pub fn record_lookup(hit: bool) {
    counter!(LOOKUPS_TOTAL, "outcome" => outcome_label(hit)).increment(1);
}

/// Record a completion call made on a miss
pub fn record_completion(model: &str) {
    counter!(COMPLETIONS_TOTAL, "model" => model.to_string()).increment(1);
}

/// Record the end-to-end duration of a query
pub fn record_query_duration(source: AnswerSource, duration: Duration) {
    histogram!(QUERY_DURATION_SECONDS, "source" => source.as_str()).record(duration.as_secs_f64());
}
