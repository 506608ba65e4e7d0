//! Command-line wrapper around the parser.
//!
//! ```bash
//! spec-refinery listing.html --schema schema.json --aliases community.json --pretty
//! cat bundle.txt | spec-refinery - --schema schema.json --batch --metric
//! ```

use clap::Parser;
use spec_refinery::acquisition::{acquire_or_empty, FileTextSource, StdinTextSource, TextSource};
use spec_refinery::config::constants::DEFAULT_COMMUNITY_MIN_USAGE;
use spec_refinery::ops::telemetry;
use spec_refinery::persistence::{CommunityAliasClient, JsonFileAliasStore};
use spec_refinery::{parse, parse_batch_products, ParseOptions, Schema, UnitSystem};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Extract schema-aligned product specs from text or HTML
#[derive(Parser, Debug)]
#[command(name = "spec-refinery")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file (text, HTML or Markdown); `-` reads stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Schema JSON: category -> [{"name": ..., "required": ...}]
    #[arg(short, long)]
    schema: PathBuf,

    /// Community alias JSON file
    #[arg(short, long)]
    aliases: Option<PathBuf>,

    /// Ignore community aliases used fewer times than this
    #[arg(long, default_value_t = DEFAULT_COMMUNITY_MIN_USAGE)]
    min_usage: u32,

    /// Split the input into products before parsing
    #[arg(long)]
    batch: bool,

    /// Rewrite measurements to metric
    #[arg(long, conflicts_with = "imperial")]
    metric: bool,

    /// Rewrite measurements to imperial
    #[arg(long)]
    imperial: bool,

    /// Canonicalize booleans, color temperatures and apertures
    #[arg(long)]
    coerce: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Dump Prometheus metrics to stderr after parsing
    #[arg(long)]
    metrics: bool,
}

impl Args {
    fn unit_system(&self) -> Option<UnitSystem> {
        match (self.metric, self.imperial) {
            (true, _) => Some(UnitSystem::Metric),
            (_, true) => Some(UnitSystem::Imperial),
            _ => None,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init_tracing_with_level(&args.log_level);

    let schema = match tokio::fs::read_to_string(&args.schema).await {
        Ok(json) => match Schema::from_json(&json) {
            Ok(schema) => schema,
            Err(e) => {
                eprintln!("error: {}: {}", args.schema.display(), e);
                return ExitCode::from(2);
            }
        },
        Err(e) => {
            eprintln!("error: {}: {}", args.schema.display(), e);
            return ExitCode::from(2);
        }
    };

    let mut options = ParseOptions::default().with_coercion(args.coerce);
    if let Some(system) = args.unit_system() {
        options = options.with_unit_system(system);
    }
    if let Some(path) = &args.aliases {
        let client = CommunityAliasClient::new(JsonFileAliasStore::new(path));
        options = options.with_community_aliases(client.fetch(args.min_usage).await);
    }

    let source: Box<dyn TextSource> = if args.input.as_os_str() == "-" {
        Box::new(StdinTextSource)
    } else {
        Box::new(FileTextSource::new(&args.input))
    };
    let text = acquire_or_empty(source.as_ref()).await;

    let started = Instant::now();
    let output = if args.batch {
        let items = parse_batch_products(&text, &schema, &options);
        telemetry::record_batch(&items, started.elapsed());
        tracing::info!(products = items.len(), "Batch parsed");
        to_json(&items, args.pretty)
    } else {
        let result = parse(&text, &schema, &options);
        telemetry::record_parse(&result, started.elapsed());
        tracing::info!(
            fields = result.fields.len(),
            conflicts = result.conflict_count(),
            unmatched = result.unmatched_pairs.len(),
            "Parsed"
        );
        Ok(if args.pretty { result.to_json_pretty() } else { result.to_json() })
    };

    if args.metrics {
        eprint!("{}", telemetry::get_metrics_string());
    }

    match output {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
