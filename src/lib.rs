//! Spec-Refinery: turns pasted or scraped product text into schema-aligned
//! specification fields with per-field confidence.

pub mod acquisition;
pub mod config;
pub mod engine;
pub mod ops;
pub mod persistence;
pub mod refinery;

pub use engine::{Schema, UnitSystem};
pub use refinery::{parse, parse_batch_products, BatchItem, ParseOptions, ParseResult};
