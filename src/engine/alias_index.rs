// * Priority-Ranked Alias Index
// * normalized alias -> {spec name, priority, category}, layered in a fixed order:
// *   schema names (100) -> expanded names (98) -> name words (40)
// *   -> curated aliases (80 / 78) -> community aliases (<= 75)
// * A key changes hands only to a strictly higher priority, so ties keep the first claim.

use crate::config::constants::{
    COMMUNITY_BASE_PRIORITY, COMMUNITY_MAX_PRIORITY, COMMUNITY_USAGE_OFFSET,
    COMMUNITY_USAGE_WEIGHT, MIN_ALIAS_WORD_LEN, PRIORITY_CURATED, PRIORITY_CURATED_EXPANDED,
    PRIORITY_EXACT, PRIORITY_EXPANDED, PRIORITY_WORD,
};
use crate::engine::normalization::{expand_abbreviations, normalize};
use crate::engine::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh64::xxh64;

// * Words that appear across too many spec names to identify one on their own
static GENERIC_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "maximum", "minimum", "number", "total", "range", "rating", "level", "supported",
        "support", "other", "additional", "options", "included", "system", "general",
        "features", "details", "standard", "optional", "internal", "external", "front",
        "approximately", "image", "video",
    ]
    .into_iter()
    .collect()
});

// * Curated canonical spec name -> known aliases
const CURATED_ALIASES: &[(&str, &[&str])] = &[
    ("Maximum Aperture", &["max aperture", "aperture (max)", "widest aperture", "fastest aperture", "f-number"]),
    ("Minimum Aperture", &["min aperture", "smallest aperture"]),
    ("Focal Length", &["focal range", "zoom range", "focal length range"]),
    ("Mount Type", &["mount", "lens mount", "lens mount type", "mount system", "bayonet"]),
    ("Weight", &["weight (approx.)", "body weight", "net weight", "item weight", "mass"]),
    ("Dimensions", &["size", "product dimensions", "measurements", "overall dimensions", "w x h x d"]),
    ("Sensor Size", &["sensor format", "image sensor size", "format"]),
    ("Sensor Type", &["image sensor", "sensor"]),
    ("Effective Pixels", &["megapixels", "resolution (mp)", "effective resolution", "mp"]),
    ("ISO Range", &["iso", "iso sensitivity", "sensitivity", "iso sensitivity range"]),
    ("Shutter Speed", &["shutter speed range", "shutter"]),
    ("Image Stabilization", &["stabilization", "ibis", "vibration reduction", "optical stabilization"]),
    ("Video Resolution", &["max video resolution", "video recording", "video"]),
    ("Battery Type", &["battery", "battery model", "power source", "compatible battery"]),
    ("Battery Life", &["battery runtime", "shots per charge", "runtime", "run time", "cipa rating"]),
    ("Color Temperature", &["cct", "colour temperature", "kelvin range", "color temp range"]),
    ("CRI", &["color rendering index", "cri rating", "ra"]),
    ("Power Input", &["power", "input voltage", "power supply", "dc input"]),
    ("Maximum Power", &["power output", "wattage", "output power"]),
    ("Filter Size", &["filter thread", "filter diameter", "front filter thread"]),
    ("Minimum Focus Distance", &["close focus", "minimum focusing distance", "mfd", "closest focusing distance"]),
    ("Weather Sealing", &["weather resistant", "weatherproof", "dust and moisture resistance", "environmental sealing"]),
    ("Polar Pattern", &["pickup pattern", "directionality"]),
    ("Frequency Response", &["frequency range"]),
    ("Connectivity", &["wireless", "interfaces", "ports"]),
    ("Storage Media", &["memory card", "card slots", "media type", "recording media"]),
    ("Material", &["construction", "build material", "body material"]),
    ("Maximum Payload", &["load capacity", "max load", "payload"]),
    ("Flight Time", &["max flight time", "flight duration"]),
    ("Screen Size", &["display size", "lcd size", "monitor size"]),
    ("Frame Rate", &["fps", "frame rates", "max frame rate"]),
];

/// One alias claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    pub spec_name: String,
    pub priority: u8,
    pub category: Option<String>,
}

/// A community-learned mapping, as fetched from the alias store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityAlias {
    pub spec_name: String,
    pub usage_count: u32,
}

/// normalized key -> community alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityAliases {
    entries: BTreeMap<String, CommunityAlias>,
}

impl CommunityAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Inserts under the normalized form of `key`
    pub fn insert(&mut self, key: &str, spec_name: &str, usage_count: u32) {
        self.entries.insert(
            normalize(key),
            CommunityAlias {
                spec_name: spec_name.to_string(),
                usage_count,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&CommunityAlias> {
        self.entries.get(&normalize(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommunityAlias)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only entries used at least `min_usage` times
    pub fn retain_min_usage(&mut self, min_usage: u32) {
        self.entries.retain(|_, alias| alias.usage_count >= min_usage);
    }

    pub fn fingerprint(&self) -> u64 {
        let mut canonical = String::new();
        for (key, alias) in &self.entries {
            canonical.push_str(key);
            canonical.push('\u{1f}');
            canonical.push_str(&alias.spec_name);
            canonical.push('\u{1f}');
            canonical.push_str(&alias.usage_count.to_string());
            canonical.push('\u{1e}');
        }
        xxh64(canonical.as_bytes(), 0)
    }
}

/// Priority for a community alias: 55 + floor((usage - 3) * 1.5), within [0, 75]
pub fn community_priority(usage_count: u32) -> u8 {
    let bonus = ((usage_count as i64 - COMMUNITY_USAGE_OFFSET) as f64 * COMMUNITY_USAGE_WEIGHT).floor();
    let priority = (COMMUNITY_BASE_PRIORITY as f64 + bonus).min(COMMUNITY_MAX_PRIORITY as f64);
    priority.max(0.0) as u8
}

/// Alias index built from a schema. Pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    entries: HashMap<String, AliasEntry>,
    // * First-insertion order of keys, so fuzzy scans are deterministic
    order: Vec<String>,
    spec_names: Vec<String>,
    spec_categories: HashMap<String, String>,
    // * normalized spec name -> spec name as declared
    spec_lookup: HashMap<String, String>,
}

impl AliasIndex {
    /// Builds the index from the schema alone
    pub fn build(schema: &Schema) -> Self {
        Self::build_with_community(schema, None)
    }

    /// Builds the index, layering community aliases last
    pub fn build_with_community(schema: &Schema, community: Option<&CommunityAliases>) -> Self {
        let mut index = Self::default();

        // * Layer 1: schema names, their expansions, and distinctive words
        for (category, field) in schema.iter_fields() {
            let name = field.name.trim();
            let normalized = normalize(name);
            if normalized.is_empty() {
                continue;
            }

            if !index.spec_lookup.contains_key(&normalized) {
                index.spec_names.push(name.to_string());
                index.spec_lookup.insert(normalized.clone(), name.to_string());
            }
            let spec_name = index.spec_lookup[&normalized].clone();
            index
                .spec_categories
                .entry(spec_name.clone())
                .or_insert_with(|| category.to_string());

            index.claim(&normalized, &spec_name, PRIORITY_EXACT);

            let expanded = expand_abbreviations(&normalized);
            if expanded != normalized {
                index.claim(&expanded, &spec_name, PRIORITY_EXPANDED);
            }

            if normalized.split_whitespace().count() > 1 {
                for word in name.unicode_words() {
                    let word = normalize(word);
                    if word.chars().count() >= MIN_ALIAS_WORD_LEN
                        && !GENERIC_WORDS.contains(word.as_str())
                    {
                        index.claim(&word, &spec_name, PRIORITY_WORD);
                    }
                }
            }
        }

        // * Layer 2: curated aliases, only for specs the schema declares
        for (canonical, aliases) in CURATED_ALIASES {
            let Some(spec_name) = index.resolve_spec(canonical) else {
                continue;
            };
            for alias in aliases.iter() {
                let normalized = normalize(alias);
                index.claim(&normalized, &spec_name, PRIORITY_CURATED);

                let expanded = expand_abbreviations(&normalized);
                if expanded != normalized {
                    index.claim(&expanded, &spec_name, PRIORITY_CURATED_EXPANDED);
                }
            }
        }

        // * Layer 3: community aliases
        if let Some(community) = community {
            for (key, alias) in community.iter() {
                let Some(spec_name) = index.resolve_spec(&alias.spec_name) else {
                    continue;
                };
                index.claim(&normalize(key), &spec_name, community_priority(alias.usage_count));
            }
        }

        tracing::debug!(
            aliases = index.entries.len(),
            specs = index.spec_names.len(),
            "Alias index built"
        );

        index
    }

    // * Inserts when the key is free or held at a strictly lower priority
    fn claim(&mut self, key: &str, spec_name: &str, priority: u8) -> bool {
        if key.is_empty() {
            return false;
        }

        if let Some(existing) = self.entries.get(key) {
            if existing.priority >= priority {
                return false;
            }
        } else {
            self.order.push(key.to_string());
        }

        let category = self.spec_categories.get(spec_name).cloned();
        self.entries.insert(
            key.to_string(),
            AliasEntry {
                spec_name: spec_name.to_string(),
                priority,
                category,
            },
        );
        true
    }

    /// Maps any spelling of a spec name to the declared name
    pub fn resolve_spec(&self, name: &str) -> Option<String> {
        self.spec_lookup.get(&normalize(name)).cloned()
    }

    /// Looks up an already-normalized key
    pub fn lookup(&self, normalized_key: &str) -> Option<&AliasEntry> {
        self.entries.get(normalized_key)
    }

    /// Alias keys and entries in first-claim order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasEntry)> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|e| (k.as_str(), e)))
    }

    /// Spec names in schema order
    pub fn spec_names(&self) -> &[String] {
        &self.spec_names
    }

    pub fn category_of(&self, spec_name: &str) -> Option<&str> {
        self.spec_categories.get(spec_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-owned memo of alias indexes keyed by schema and community fingerprints
#[derive(Debug, Default)]
pub struct AliasIndexCache {
    indexes: HashMap<(u64, u64), Arc<AliasIndex>>,
}

impl AliasIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for these inputs, building it on first use
    pub fn get_or_build(
        &mut self,
        schema: &Schema,
        community: Option<&CommunityAliases>,
    ) -> Arc<AliasIndex> {
        let key = (
            schema.fingerprint(),
            community.map(CommunityAliases::fingerprint).unwrap_or(0),
        );

        self.indexes
            .entry(key)
            .or_insert_with(|| Arc::new(AliasIndex::build_with_community(schema, community)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_schema() -> Schema {
        Schema::new()
            .with_category("Cameras", ["Sensor Size", "Weight", "Battery Type", "Max Shutter Speed"])
            .with_category("Lenses", ["Maximum Aperture", "Focal Length", "Weight"])
    }

    #[test]
    fn test_exact_names_at_top_priority() {
        let index = AliasIndex::build(&camera_schema());
        let entry = index.lookup("sensor size").unwrap();
        assert_eq!(entry.spec_name, "Sensor Size");
        assert_eq!(entry.priority, 100);
        assert_eq!(entry.category.as_deref(), Some("Cameras"));
    }

    #[test]
    fn test_shared_spec_keeps_first_category() {
        let index = AliasIndex::build(&camera_schema());
        assert_eq!(index.category_of("Weight"), Some("Cameras"));
        assert_eq!(index.spec_names().iter().filter(|s| *s == "Weight").count(), 1);
    }

    #[test]
    fn test_expanded_form_registered() {
        let index = AliasIndex::build(&camera_schema());
        let entry = index.lookup("maximum shutter speed").unwrap();
        assert_eq!(entry.spec_name, "Max Shutter Speed");
        assert_eq!(entry.priority, 98);
    }

    #[test]
    fn test_word_aliases() {
        let index = AliasIndex::build(&camera_schema());
        // * "aperture" comes from "Maximum Aperture"; "maximum" is generic
        assert_eq!(index.lookup("aperture").unwrap().priority, 40);
        assert!(index.lookup("maximum").is_none());
        // * "sensor" is claimed by a curated alias only if Sensor Type exists; here it's a word
        assert_eq!(index.lookup("sensor").unwrap().spec_name, "Sensor Size");
    }

    #[test]
    fn test_curated_aliases_need_known_spec() {
        let index = AliasIndex::build(&camera_schema());
        assert_eq!(index.lookup("max aperture").unwrap().priority, 80);
        assert_eq!(index.lookup("widest aperture").unwrap().spec_name, "Maximum Aperture");
        // * "Polar Pattern" is not in the schema
        assert!(index.lookup("pickup pattern").is_none());
        // * curated "battery" beats the word alias at 40
        assert_eq!(index.lookup("battery").unwrap().priority, 80);
    }

    #[test]
    fn test_community_priority_formula() {
        assert_eq!(community_priority(3), 55);
        assert_eq!(community_priority(4), 56);
        assert_eq!(community_priority(5), 58);
        assert_eq!(community_priority(100), 75);
        assert_eq!(community_priority(0), 50);
    }

    #[test]
    fn test_community_never_beats_exact_or_curated() {
        let mut community = CommunityAliases::new();
        community.insert("Weight", "Focal Length", 500);
        community.insert("mass", "Focal Length", 500);
        community.insert("heft", "Weight", 10);
        community.insert("zoom", "Unknown Spec", 10);

        let index = AliasIndex::build_with_community(&camera_schema(), Some(&community));

        assert_eq!(index.lookup("weight").unwrap().spec_name, "Weight");
        assert_eq!(index.lookup("weight").unwrap().priority, 100);
        assert_eq!(index.lookup("mass").unwrap().spec_name, "Weight");
        assert_eq!(index.lookup("heft").unwrap().priority, community_priority(10));
        assert!(index.lookup("zoom").is_none());
    }

    #[test]
    fn test_first_claim_wins_ties() {
        let schema = Schema::new().with_category("Lighting", ["Beam Angle", "Angle Adjustment"]);
        let index = AliasIndex::build(&schema);
        // * Neither word claims "angle" at 40 before "Beam Angle" does
        assert_eq!(index.lookup("angle").unwrap().spec_name, "Beam Angle");
    }

    #[test]
    fn test_malformed_fields_skipped() {
        let schema = Schema::from_json(r#"{"Audio": [{"required": true}, {"name": null}, {"name": 42}, {"name": "Polar Pattern"}]}"#)
            .unwrap();
        let index = AliasIndex::build(&schema);
        assert_eq!(index.spec_names(), &["Polar Pattern".to_string()]);
    }

    #[test]
    fn test_cache_reuses_index() {
        let schema = camera_schema();
        let mut cache = AliasIndexCache::new();

        let a = cache.get_or_build(&schema, None);
        let b = cache.get_or_build(&schema, None);
        assert!(Arc::ptr_eq(&a, &b));

        let mut community = CommunityAliases::new();
        community.insert("heft", "Weight", 5);
        let c = cache.get_or_build(&schema, Some(&community));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }
}
