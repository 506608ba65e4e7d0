// * Telemetry - JSON Logging and Prometheus Metrics
// * The library never installs a subscriber or records metrics on its own;
// * the binary (or any embedding service) calls in here around each parse.

use crate::engine::resolver::MatchKind;
use crate::refinery::{BatchItem, ParseResult};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Parses run, one per product (batch segments count individually)
    pub static ref PARSES_TOTAL: Counter = register_counter!(
        "spec_refinery_parses_total",
        "Total number of product parses"
    ).unwrap();

    // * Resolved fields by how they were matched
    pub static ref FIELDS_RESOLVED_TOTAL: CounterVec = register_counter_vec!(
        "spec_refinery_fields_resolved_total",
        "Resolved spec fields by match kind",
        &["kind"]
    ).unwrap();

    pub static ref CONFLICTS_TOTAL: Counter = register_counter!(
        "spec_refinery_conflicts_total",
        "Resolved fields flagged with a conflict"
    ).unwrap();

    pub static ref UNMATCHED_PAIRS_TOTAL: Counter = register_counter!(
        "spec_refinery_unmatched_pairs_total",
        "Extracted pairs no spec field claimed"
    ).unwrap();

    // * Batch imports
    pub static ref SEGMENTS_TOTAL: Counter = register_counter!(
        "spec_refinery_segments_total",
        "Products split out of batch inputs"
    ).unwrap();

    pub static ref PARSE_DURATION_SECONDS: Histogram = register_histogram!(
        "spec_refinery_parse_duration_seconds",
        "Wall time of a parse call in seconds",
        vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting on stderr
///
/// # Example
/// ```ignore
/// use spec_refinery::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(input = "lens.html", "Parsing");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level; `RUST_LOG` still wins when set
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .try_init();
}

/// Returns the current metrics in the text exposition format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Metrics encoding failed");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records one finished parse
pub fn record_parse(result: &ParseResult, elapsed: Duration) {
    PARSES_TOTAL.inc();
    PARSE_DURATION_SECONDS.observe(elapsed.as_secs_f64());

    for field in result.fields.values() {
        record_field_kind(field.kind);
    }
    CONFLICTS_TOTAL.inc_by(result.conflict_count() as f64);
    UNMATCHED_PAIRS_TOTAL.inc_by(result.unmatched_pairs.len() as f64);
}

/// Records a batch import; the elapsed time is split evenly across its products
pub fn record_batch(items: &[BatchItem], elapsed: Duration) {
    if items.len() > 1 {
        SEGMENTS_TOTAL.inc_by(items.len() as f64);
    }
    let share = elapsed / items.len().max(1) as u32;
    for item in items {
        record_parse(&item.result, share);
    }
}

fn record_field_kind(kind: MatchKind) {
    FIELDS_RESOLVED_TOTAL.with_label_values(&[kind.as_str()]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::resolver::ResolvedField;
    use crate::refinery::Segment;

    fn result_with_conflict() -> ParseResult {
        let mut field = ResolvedField::with_value("658 g");
        field.has_conflict = true;
        let mut result = ParseResult::default();
        result.fields.insert("Weight".to_string(), field);
        result
    }

    #[test]
    fn test_record_parse_moves_counters() {
        let parses = PARSES_TOTAL.get();
        let conflicts = CONFLICTS_TOTAL.get();
        let direct = FIELDS_RESOLVED_TOTAL.with_label_values(&["direct"]).get();

        record_parse(&result_with_conflict(), Duration::from_millis(2));

        assert!(PARSES_TOTAL.get() >= parses + 1.0);
        assert!(CONFLICTS_TOTAL.get() >= conflicts + 1.0);
        assert!(FIELDS_RESOLVED_TOTAL.with_label_values(&["direct"]).get() >= direct + 1.0);
    }

    #[test]
    fn test_record_batch_counts_segments() {
        let before = SEGMENTS_TOTAL.get();
        let items: Vec<BatchItem> = (0..2)
            .map(|_| BatchItem {
                segment: Segment::whole("Weight: 1 kg"),
                result: ParseResult::default(),
            })
            .collect();
        record_batch(&items, Duration::from_millis(4));
        assert!(SEGMENTS_TOTAL.get() >= before + 2.0);
    }

    #[test]
    fn test_metrics_string() {
        record_parse(&ParseResult::default(), Duration::from_micros(300));
        let metrics = get_metrics_string();
        assert!(metrics.contains("spec_refinery_parses_total"));
        assert!(metrics.contains("spec_refinery_parse_duration_seconds"));
    }
}
