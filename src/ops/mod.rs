// * Operations
// * Logging setup and parse metrics for whoever embeds the parser.

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, init_tracing_with_level, record_batch,
    record_parse,
};
