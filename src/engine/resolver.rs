// * Field Resolver
// * Resolves raw (key, value) pairs onto schema spec fields in three passes:
// *   1. direct alias lookups
// *   2. fuzzy scoring of the leftovers against spec names and alias keys
// *   3. per-field dedupe, merge, conflict flagging and range validation

use crate::config::constants::{
    CATEGORY_MISMATCH_PENALTY, CONFLICT_MAX_GAP, CONFLICT_MIN_CONFIDENCE, DIRECT_GRADE_CONFIDENCE,
    FUZZY_ALIAS_THRESHOLD, FUZZY_CONFIDENCE_CAP, FUZZY_PRIORITY_BOOST, FUZZY_SPEC_THRESHOLD,
    MERGE_MAX_SPREAD,
};
use crate::engine::alias_index::AliasIndex;
use crate::engine::normalization::{expand_abbreviations, normalize};
use crate::engine::similarity::similarity_score;
use crate::refinery::regex_extractor::RawPair;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

// * Fields that legitimately appear in every category; exempt from the category penalty
pub const SHARED_FIELDS: [&str; 7] = [
    "Weight",
    "Dimensions",
    "Battery Type",
    "Battery Life",
    "Mount Type",
    "Power Input",
    "Material",
];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").expect("Invalid number regex")
});

static WEIGHT_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s*(kg|kilograms?|g|grams?|lbs?|pounds?|oz|ounces?)\b")
        .expect("Invalid weight regex")
});

static F_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:f\s*/?\s*)?(\d+(?:\.\d+)?)").expect("Invalid f-number regex")
});

/// How a candidate reached its spec field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Direct,
    Fuzzy,
    Merged,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Direct => "direct",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Merged => "merged",
        }
    }
}

/// A value proposed for a spec field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub value: String,
    pub confidence: u8,
    pub source_key: String,
    pub line_index: usize,
    pub kind: MatchKind,
}

/// The chosen value for one spec field, with everything a reviewer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub value: String,
    pub confidence: u8,
    pub source_key: String,
    pub line_index: usize,
    pub kind: MatchKind,
    #[serde(default)]
    pub alternatives: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_count: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_conflict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_warning: Option<String>,
}

impl ResolvedField {
    /// A bare field holding just a value; used for stored specs and tests
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: 100,
            source_key: String::new(),
            line_index: 0,
            kind: MatchKind::Direct,
            alternatives: Vec::new(),
            merged_count: None,
            has_conflict: false,
            validation_warning: None,
        }
    }
}

/// Output of a resolver run
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub fields: BTreeMap<String, ResolvedField>,
    pub unmatched: Vec<RawPair>,
}

/// Runs all three passes over the extracted pairs
pub fn resolve_fields(pairs: &[RawPair], index: &AliasIndex, detected_category: &str) -> Resolution {
    // * spec name -> candidates, plus spec order of first candidate for stable iteration
    let mut candidates: HashMap<String, Vec<Candidate>> = HashMap::new();
    let mut matched = vec![false; pairs.len()];

    // * Pass 1: direct lookups on the normalized key, then its expansion
    for (i, pair) in pairs.iter().enumerate() {
        if pair.value.trim().is_empty() {
            continue;
        }
        let normalized = normalize(&pair.key);
        let entry = index
            .lookup(&normalized)
            .or_else(|| index.lookup(&expand_abbreviations(&normalized)));

        if let Some(entry) = entry {
            candidates
                .entry(entry.spec_name.clone())
                .or_default()
                .push(candidate(pair, entry.priority, MatchKind::Direct));
            matched[i] = true;
        }
    }

    // * Pass 2: fuzzy scoring for everything pass 1 left behind
    let detected = normalize(detected_category);
    for (i, pair) in pairs.iter().enumerate() {
        if matched[i] || pair.value.trim().is_empty() {
            continue;
        }

        let best = fuzzy_matches(&pair.key, index, &detected);
        if best.is_empty() {
            continue;
        }

        // * Emit in schema order so output never depends on hash order
        for spec in index.spec_names() {
            if let Some(&confidence) = best.get(spec.as_str()) {
                candidates
                    .entry(spec.clone())
                    .or_default()
                    .push(candidate(pair, confidence, MatchKind::Fuzzy));
            }
        }
        matched[i] = true;
    }

    // * Pass 3: resolve each spec independently
    let mut fields = BTreeMap::new();
    for (spec, list) in candidates {
        if let Some(field) = resolve_candidates(&spec, list) {
            fields.insert(spec, field);
        }
    }

    let unmatched: Vec<RawPair> = pairs
        .iter()
        .zip(matched.iter())
        .filter(|(_, m)| !**m)
        .map(|(p, _)| p.clone())
        .collect();

    tracing::debug!(
        pairs = pairs.len(),
        fields = fields.len(),
        unmatched = unmatched.len(),
        "Fields resolved"
    );

    Resolution { fields, unmatched }
}

fn candidate(pair: &RawPair, confidence: u8, kind: MatchKind) -> Candidate {
    Candidate {
        value: pair.value.trim().to_string(),
        confidence: confidence.min(100),
        source_key: pair.key.clone(),
        line_index: pair.line_index,
        kind,
    }
}

// * Best fuzzy confidence per spec for one key
fn fuzzy_matches<'a>(key: &str, index: &'a AliasIndex, detected: &str) -> HashMap<&'a str, u8> {
    let mut best: HashMap<&'a str, u8> = HashMap::new();
    let mut offer = |spec: &'a str, confidence: u8| {
        if confidence == 0 {
            return;
        }
        let slot = best.entry(spec).or_insert(0);
        if confidence > *slot {
            *slot = confidence;
        }
    };

    for spec in index.spec_names() {
        let score = similarity_score(key, spec);
        if score >= FUZZY_SPEC_THRESHOLD {
            let penalized = apply_category_penalty(score, spec, index.category_of(spec), detected);
            offer(spec.as_str(), penalized);
        }
    }

    for (alias, entry) in index.iter() {
        let score = similarity_score(key, alias);
        if score < FUZZY_ALIAS_THRESHOLD {
            continue;
        }
        let boosted = score as f64 + FUZZY_PRIORITY_BOOST * (entry.priority as f64 - 50.0);
        let boosted = boosted.round().clamp(0.0, FUZZY_CONFIDENCE_CAP as f64) as u8;
        let penalized =
            apply_category_penalty(boosted, &entry.spec_name, entry.category.as_deref(), detected);
        offer(entry.spec_name.as_str(), penalized);
    }

    best
}

fn apply_category_penalty(confidence: u8, spec: &str, category: Option<&str>, detected: &str) -> u8 {
    if detected.is_empty() || SHARED_FIELDS.contains(&spec) {
        return confidence;
    }
    match category {
        Some(category) if normalize(category) != detected => {
            confidence.saturating_sub(CATEGORY_MISMATCH_PENALTY)
        }
        _ => confidence,
    }
}

fn dedupe_key(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Pass 3 for a single spec. Returns None when no candidate holds a value.
pub fn resolve_candidates(spec: &str, mut list: Vec<Candidate>) -> Option<ResolvedField> {
    list.retain(|c| !c.value.trim().is_empty());
    if list.is_empty() {
        return None;
    }

    // * Stable sort keeps extraction order among equal confidences
    list.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let mut seen = HashSet::new();
    let deduped: Vec<Candidate> = list
        .into_iter()
        .filter(|c| seen.insert(dedupe_key(&c.value)))
        .collect();

    let direct: Vec<&Candidate> = deduped
        .iter()
        .filter(|c| c.confidence >= DIRECT_GRADE_CONFIDENCE)
        .collect();

    let spread = match (direct.first(), direct.last()) {
        (Some(hi), Some(lo)) => hi.confidence - lo.confidence,
        _ => u8::MAX,
    };

    let mut field = if direct.len() >= 2 && spread <= MERGE_MAX_SPREAD {
        let merged_count = direct.len();
        let total: u32 = direct.iter().map(|c| c.confidence as u32).sum();
        let confidence = (total as f64 / merged_count as f64).round() as u8;
        let value = direct.iter().map(|c| c.value.as_str()).collect::<Vec<_>>().join(", ");
        let source_key = direct.iter().map(|c| c.source_key.as_str()).collect::<Vec<_>>().join(" + ");
        let line_index = direct[0].line_index;

        ResolvedField {
            value,
            confidence,
            source_key,
            line_index,
            kind: MatchKind::Merged,
            alternatives: deduped[merged_count..].to_vec(),
            merged_count: Some(merged_count),
            has_conflict: false,
            validation_warning: None,
        }
    } else {
        let has_conflict = deduped.len() >= 2
            && deduped[1].confidence >= CONFLICT_MIN_CONFIDENCE
            && deduped[0].confidence - deduped[1].confidence <= CONFLICT_MAX_GAP;

        // * Sorted descending, so the first direct-grade candidate is the head when one exists
        let chosen = deduped
            .iter()
            .position(|c| c.confidence >= DIRECT_GRADE_CONFIDENCE)
            .unwrap_or(0);
        let head = &deduped[chosen];

        ResolvedField {
            value: head.value.clone(),
            confidence: head.confidence,
            source_key: head.source_key.clone(),
            line_index: head.line_index,
            kind: head.kind,
            alternatives: deduped
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != chosen)
                .map(|(_, c)| c.clone())
                .collect(),
            merged_count: None,
            has_conflict,
            validation_warning: None,
        }
    };

    field.validation_warning = validate_value(spec, &field.value);
    Some(field)
}

// * Soft numeric ranges per spec
struct RangeRule {
    spec: &'static str,
    min: f64,
    max: f64,
    unit: &'static str,
    extract: fn(&str) -> Option<f64>,
}

const RANGE_RULES: &[RangeRule] = &[
    RangeRule { spec: "Weight", min: 0.0, max: 100.0, unit: "kg", extract: extract_kilograms },
    RangeRule { spec: "Maximum Aperture", min: 0.7, max: 64.0, unit: "", extract: extract_f_number },
    RangeRule { spec: "Minimum Aperture", min: 0.7, max: 128.0, unit: "", extract: extract_f_number },
    RangeRule { spec: "Focal Length", min: 1.0, max: 2000.0, unit: "mm", extract: extract_number },
    RangeRule { spec: "Color Temperature", min: 1000.0, max: 20000.0, unit: "K", extract: extract_number },
    RangeRule { spec: "Effective Pixels", min: 0.1, max: 500.0, unit: "MP", extract: extract_number },
    RangeRule { spec: "Screen Size", min: 0.5, max: 100.0, unit: "in", extract: extract_number },
    RangeRule { spec: "Frame Rate", min: 1.0, max: 1000.0, unit: "fps", extract: extract_number },
    RangeRule { spec: "CRI", min: 0.0, max: 100.0, unit: "", extract: extract_number },
    RangeRule { spec: "Filter Size", min: 20.0, max: 200.0, unit: "mm", extract: extract_number },
    RangeRule { spec: "Flight Time", min: 1.0, max: 300.0, unit: "min", extract: extract_number },
];

/// Advisory range check. None when the spec has no rule or no number parses.
pub fn validate_value(spec: &str, value: &str) -> Option<String> {
    let spec_normalized = normalize(spec);
    let rule = RANGE_RULES.iter().find(|r| normalize(r.spec) == spec_normalized)?;
    let number = (rule.extract)(value)?;

    if number < rule.min || number > rule.max {
        let unit = if rule.unit.is_empty() {
            String::new()
        } else {
            format!(" {}", rule.unit)
        };
        return Some(format!(
            "{} of {}{} is outside the expected range {}–{}{}",
            rule.spec, number, unit, rule.min, rule.max, unit
        ));
    }

    None
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn extract_number(value: &str) -> Option<f64> {
    NUMBER.find(value).and_then(|m| parse_number(m.as_str()))
}

fn extract_f_number(value: &str) -> Option<f64> {
    F_NUMBER
        .captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

fn extract_kilograms(value: &str) -> Option<f64> {
    let caps = WEIGHT_WITH_UNIT.captures(value)?;
    let amount = parse_number(&caps[1])?;
    let unit = caps[2].to_lowercase();

    let kilograms = if unit.starts_with("kg") || unit.starts_with("kilo") {
        amount
    } else if unit.starts_with("lb") || unit.starts_with("pound") {
        amount * 0.453_592_37
    } else if unit.starts_with("oz") || unit.starts_with("ounce") {
        amount * 0.028_349_523
    } else {
        amount / 1000.0
    };
    Some(kilograms)
}
