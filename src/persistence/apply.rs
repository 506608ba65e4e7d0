// * Apply Payload
// * Folds a reviewer's selections over a parse result to produce the record
// * that gets written back, and derives the alias observations worth learning.

use crate::engine::normalization::normalize;
use crate::refinery::{ParseResult, RawPair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a reviewer picked. Every field is optional; `specs` entries override
/// resolved values and an empty string removes the spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedValues {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub purchase_price: Option<String>,
    #[serde(default)]
    pub price_note: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
    /// Raw (unmatched) key -> spec name, chosen by hand
    #[serde(default, rename = "_manualMappings")]
    pub manual_mappings: BTreeMap<String, String>,
}

impl SelectedValues {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The record handed to storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPayload {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub purchase_price: String,
    pub price_note: String,
    pub serial_number: String,
    pub model_number: String,
    pub specs: BTreeMap<String, String>,
}

/// A (raw key -> spec) mapping a human confirmed; feeds the community alias store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasObservation {
    pub source_key: String,
    pub spec_name: String,
    pub category: String,
}

fn pick(selected: &Option<String>, parsed: &str) -> String {
    selected.clone().unwrap_or_else(|| parsed.to_string())
}

// * Unmatched pairs first; a mapped key that did match something is still honoured
fn find_pair<'a>(result: &'a ParseResult, raw_key: &str) -> Option<&'a RawPair> {
    let wanted = normalize(raw_key);
    if wanted.is_empty() {
        return None;
    }
    result
        .unmatched_pairs
        .iter()
        .chain(result.raw_extracted.iter())
        .find(|p| normalize(&p.key) == wanted)
}

/// Builds the stored record. Spec precedence: explicit override, then manual
/// mapping, then the resolved value.
pub fn build_apply_payload(result: &ParseResult, selected: &SelectedValues) -> ApplyPayload {
    let mut specs: BTreeMap<String, String> = result
        .fields
        .iter()
        .filter(|(_, field)| !field.value.trim().is_empty())
        .map(|(name, field)| (name.clone(), field.value.clone()))
        .collect();

    for (raw_key, spec_name) in &selected.manual_mappings {
        if spec_name.trim().is_empty() {
            continue;
        }
        match find_pair(result, raw_key) {
            Some(pair) => {
                specs.insert(spec_name.clone(), pair.value.clone());
            }
            None => tracing::debug!(raw_key = %raw_key, spec_name = %spec_name, "Manual mapping has no matching pair"),
        }
    }

    for (spec_name, value) in &selected.specs {
        if value.trim().is_empty() {
            specs.remove(spec_name);
        } else {
            specs.insert(spec_name.clone(), value.clone());
        }
    }

    ApplyPayload {
        name: pick(&selected.name, &result.name),
        brand: pick(&selected.brand, &result.brand),
        category: pick(&selected.category, &result.category),
        purchase_price: pick(&selected.purchase_price, &result.purchase_price),
        price_note: pick(&selected.price_note, &result.price_note),
        serial_number: pick(&selected.serial_number, &result.serial_number),
        model_number: pick(&selected.model_number, &result.model_number),
        specs,
    }
}

/// The alias observations a caller should record after an apply: one per
/// manual mapping that points at a real extracted key.
pub fn alias_observations(result: &ParseResult, selected: &SelectedValues) -> Vec<AliasObservation> {
    let category = pick(&selected.category, &result.category);
    selected
        .manual_mappings
        .iter()
        .filter(|(_, spec_name)| !spec_name.trim().is_empty())
        .filter_map(|(raw_key, spec_name)| {
            find_pair(result, raw_key).map(|pair| AliasObservation {
                source_key: pair.key.clone(),
                spec_name: spec_name.clone(),
                category: category.clone(),
            })
        })
        .collect()
}
