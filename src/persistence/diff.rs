// * Spec Diff
// * Compares freshly resolved fields against the values already stored for a product.

use crate::engine::resolver::ResolvedField;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Classification of one spec across old and new values.
/// Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Changed,
    Added,
    Unchanged,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub spec_name: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    /// Confidence of the new value, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

fn comparable(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Diffs stored spec values against resolved fields. Blank values count as absent.
/// Entries come out changed, added, unchanged, removed; alphabetical within each group.
pub fn diff_specs(
    existing: &BTreeMap<String, String>,
    fields: &BTreeMap<String, ResolvedField>,
) -> Vec<DiffEntry> {
    let names: BTreeSet<&String> = existing.keys().chain(fields.keys()).collect();

    let mut entries: Vec<DiffEntry> = names
        .into_iter()
        .filter_map(|name| {
            let old = present(existing.get(name).map(String::as_str));
            let new_field = fields.get(name).filter(|f| present(Some(f.value.as_str())).is_some());
            let new = new_field.map(|f| f.value.trim());

            let status = match (old, new) {
                (None, None) => return None,
                (None, Some(_)) => DiffStatus::Added,
                (Some(_), None) => DiffStatus::Removed,
                (Some(o), Some(n)) if comparable(o) == comparable(n) => DiffStatus::Unchanged,
                (Some(_), Some(_)) => DiffStatus::Changed,
            };

            Some(DiffEntry {
                spec_name: name.clone(),
                status,
                old_value: old.map(str::to_string),
                new_value: new.map(str::to_string),
                confidence: new_field.map(|f| f.confidence),
            })
        })
        .collect();

    // * Stable: names stay alphabetical inside each status group
    entries.sort_by_key(|e| e.status);
    entries
}

/// Counts entries per status, in output order
pub fn summarize(entries: &[DiffEntry]) -> BTreeMap<DiffStatus, usize> {
    let mut summary = BTreeMap::new();
    for entry in entries {
        *summary.entry(entry.status).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, ResolvedField> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ResolvedField::with_value(*v)))
            .collect()
    }

    #[test]
    fn test_changed_and_added() {
        let entries = diff_specs(&existing(&[("A", "1")]), &fields(&[("A", "2"), ("B", "3")]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].spec_name, "A");
        assert_eq!(entries[0].status, DiffStatus::Changed);
        assert_eq!(entries[0].old_value.as_deref(), Some("1"));
        assert_eq!(entries[0].new_value.as_deref(), Some("2"));
        assert_eq!(entries[1].spec_name, "B");
        assert_eq!(entries[1].status, DiffStatus::Added);
    }

    #[test]
    fn test_status_ordering() {
        let entries = diff_specs(
            &existing(&[("Weight", "658 g"), ("Mount", "Sony E"), ("Color", "Black")]),
            &fields(&[("Weight", "658  G"), ("Mount", "RF"), ("ISO", "100-51200")]),
        );
        let statuses: Vec<DiffStatus> = entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![DiffStatus::Changed, DiffStatus::Added, DiffStatus::Unchanged, DiffStatus::Removed]
        );
        assert_eq!(entries[2].spec_name, "Weight");
        assert_eq!(entries[3].spec_name, "Color");
        assert_eq!(entries[3].confidence, None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let entries = diff_specs(&existing(&[("A", "  "), ("B", "x")]), &fields(&[("A", ""), ("B", " ")]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].spec_name, "B");
        assert_eq!(entries[0].status, DiffStatus::Removed);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(diff_specs(&BTreeMap::new(), &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_summary() {
        let entries = diff_specs(&existing(&[("A", "1"), ("C", "x")]), &fields(&[("A", "2"), ("B", "3")]));
        let summary = summarize(&entries);
        assert_eq!(summary[&DiffStatus::Changed], 1);
        assert_eq!(summary[&DiffStatus::Added], 1);
        assert_eq!(summary[&DiffStatus::Removed], 1);
        assert!(!summary.contains_key(&DiffStatus::Unchanged));
    }

    #[test]
    fn test_serialized_shape() {
        let entries = diff_specs(&existing(&[]), &fields(&[("Weight", "1 kg")]));
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["specName"], "Weight");
        assert_eq!(json["status"], "added");
        assert_eq!(json["confidence"], 100);
        assert!(json.get("oldValue").is_none());
    }
}
