// * The Refinery (Extraction Pipeline)
// * text -> clean -> line pass -> detectors -> resolver -> optional value rewriting.
// * Every entry point is a pure function of its arguments; empty input yields
// * an all-default result rather than an error.

pub mod chunker;
pub mod content_cleaner;
pub mod metadata;
pub mod regex_extractor;
pub mod tables;

// * Re-exports for convenient access
pub use chunker::{detect_product_boundaries, Segment};
pub use content_cleaner::clean_input_text;
pub use metadata::{detect_brand, detect_category, detect_price, PriceMatch};
pub use regex_extractor::{extract_pairs, RawPair};

use crate::engine::alias_index::{AliasIndex, CommunityAliases};
use crate::engine::resolver::{resolve_fields, ResolvedField};
use crate::engine::schema::Schema;
use crate::engine::units::{coerce_value, normalize_units, UnitSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Runtime knobs for a parse
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Community-learned aliases, already fetched by the caller
    pub community_aliases: Option<CommunityAliases>,
    /// Rewrite measurement values into this system
    pub unit_system: Option<UnitSystem>,
    /// Canonicalize booleans, color temperature ranges and apertures
    pub coerce_values: bool,
}

impl ParseOptions {
    pub fn with_community_aliases(mut self, aliases: CommunityAliases) -> Self {
        self.community_aliases = Some(aliases);
        self
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = Some(unit_system);
        self
    }

    pub fn with_coercion(mut self, enabled: bool) -> Self {
        self.coerce_values = enabled;
        self
    }
}

/// Everything extracted from one product's text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub purchase_price: String,
    pub price_note: String,
    pub serial_number: String,
    pub model_number: String,
    pub fields: BTreeMap<String, ResolvedField>,
    pub unmatched_pairs: Vec<RawPair>,
    pub raw_extracted: Vec<RawPair>,
}

impl ParseResult {
    /// Converts result to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Converts result to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn conflict_count(&self) -> usize {
        self.fields.values().filter(|f| f.has_conflict).count()
    }
}

/// One product of a batch import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub segment: Segment,
    pub result: ParseResult,
}

/// Parses a single product. Builds a fresh alias index; callers parsing many
/// inputs against one schema should hold an `AliasIndexCache` and use
/// [`parse_with_index`].
///
/// # Example
/// ```
/// use spec_refinery::engine::schema::Schema;
/// use spec_refinery::refinery::{parse, ParseOptions};
///
/// let schema = Schema::new().with_category("Cameras", ["Weight", "Sensor Size"]);
/// let result = parse("Weight: 658 g\nSale Price: $2,498.00", &schema, &ParseOptions::default());
///
/// assert_eq!(result.fields["Weight"].value, "658 g");
/// assert_eq!(result.purchase_price, "2498.00");
/// ```
pub fn parse(text: &str, schema: &Schema, options: &ParseOptions) -> ParseResult {
    if text.trim().is_empty() {
        return ParseResult::default();
    }
    let index = AliasIndex::build_with_community(schema, options.community_aliases.as_ref());
    parse_with_index(text, &index, options)
}

/// Parses a single product against a prebuilt alias index
pub fn parse_with_index(text: &str, index: &AliasIndex, options: &ParseOptions) -> ParseResult {
    parse_cleaned(&clean_input_text(text), index, options)
}

/// Parses text that already went through [`clean_input_text`]. Cleaning is
/// not idempotent for entity-bearing text, so callers must not clean twice.
pub fn parse_cleaned(cleaned: &str, index: &AliasIndex, options: &ParseOptions) -> ParseResult {
    if cleaned.trim().is_empty() {
        return ParseResult::default();
    }

    // * Step 1: line pass
    let lines = extract_pairs(cleaned);

    // * Step 2: ancillary detectors
    let price = detect_price(&lines.pairs, cleaned).unwrap_or_default();
    let brand = detect_brand(&lines.name, cleaned).unwrap_or_default();
    let category = detect_category(cleaned).unwrap_or_default();
    let serial_number = metadata::detect_serial(&lines.pairs).unwrap_or_default();
    let model_number = metadata::detect_model(&lines.pairs).unwrap_or_default();

    // * Step 3: resolve pairs onto spec fields
    let resolution = resolve_fields(&lines.pairs, index, category);

    // * Step 4: optional value rewriting, confidences untouched
    let mut fields = resolution.fields;
    rewrite_values(&mut fields, options);

    tracing::debug!(
        chars = cleaned.len(),
        pairs = lines.pairs.len(),
        fields = fields.len(),
        unmatched = resolution.unmatched.len(),
        category,
        "Parse complete"
    );

    ParseResult {
        name: lines.name,
        brand: brand.to_string(),
        category: category.to_string(),
        purchase_price: price.price,
        price_note: price.note,
        serial_number,
        model_number,
        fields,
        unmatched_pairs: resolution.unmatched,
        raw_extracted: lines.pairs,
    }
}

/// Applies the unit system and coercion options to every field value and alternative
pub fn rewrite_values(fields: &mut BTreeMap<String, ResolvedField>, options: &ParseOptions) {
    if options.unit_system.is_none() && !options.coerce_values {
        return;
    }

    let rewrite = |spec: &str, value: &str| -> String {
        let mut out = match options.unit_system {
            Some(system) => normalize_units(value, system.is_metric()),
            None => value.to_string(),
        };
        if options.coerce_values {
            out = coerce_value(spec, &out);
        }
        out
    };

    for (spec, field) in fields.iter_mut() {
        field.value = rewrite(spec, &field.value);
        for alternative in field.alternatives.iter_mut() {
            alternative.value = rewrite(spec, &alternative.value);
        }
    }
}

/// Splits the input into products and parses each one independently.
/// Without a detectable split the whole input is returned as one item.
pub fn parse_batch_products(text: &str, schema: &Schema, options: &ParseOptions) -> Vec<BatchItem> {
    let cleaned = clean_input_text(text);
    if cleaned.is_empty() {
        return vec![BatchItem {
            segment: Segment::whole(""),
            result: ParseResult::default(),
        }];
    }

    // * One index for every segment; segments share nothing mutable
    let index = AliasIndex::build_with_community(schema, options.community_aliases.as_ref());
    let segments = detect_product_boundaries(&cleaned);

    if segments.is_empty() {
        let result = parse_cleaned(&cleaned, &index, options);
        return vec![BatchItem {
            segment: Segment::whole(&cleaned),
            result,
        }];
    }

    segments
        .into_iter()
        .map(|segment| {
            let mut result = parse_cleaned(&segment.text, &index, options);
            if result.name.is_empty() && !segment.name.is_empty() {
                result.name = segment.name.clone();
            }
            BatchItem { segment, result }
        })
        .collect()
}
