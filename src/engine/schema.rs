// * Target Schema
// * Category -> ordered list of spec fields. Iteration order is significant:
// * alias priority ties are settled by whichever spec claims a key first.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use xxhash_rust::xxh64::xxh64;

/// Errors raised while loading a schema definition
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single named spec field within a category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    // * Missing, null or non-string names deserialize as empty and are skipped by the alias index
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_required")]
    pub required: bool,
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(name)) => name,
        _ => String::new(),
    })
}

fn lenient_required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(serde_json::Value::Bool(true))))
}

impl SchemaField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCategory {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

/// Ordered category map. Serialized as a JSON object whose key order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    categories: Vec<SchemaCategory>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `{"Category": [{"name": "...", "required": true}, ...], ...}`
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Appends a category (or extends an existing one) with the given fields
    pub fn with_category<I, F>(mut self, name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<SchemaField>,
    {
        let fields: Vec<SchemaField> = fields.into_iter().map(Into::into).collect();
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.fields.extend(fields),
            None => self.categories.push(SchemaCategory {
                name: name.to_string(),
                fields,
            }),
        }
        self
    }

    pub fn categories(&self) -> &[SchemaCategory] {
        &self.categories
    }

    /// (category, field) pairs in declaration order
    pub fn iter_fields(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.categories
            .iter()
            .flat_map(|c| c.fields.iter().map(move |f| (c.name.as_str(), f)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter_fields().all(|(_, f)| f.name.trim().is_empty())
    }

    /// Stable content hash, used as a memoization key for alias indexes
    pub fn fingerprint(&self) -> u64 {
        let mut canonical = String::new();
        for category in &self.categories {
            canonical.push_str(&category.name);
            canonical.push('\u{1d}');
            for field in &category.fields {
                canonical.push_str(&field.name);
                canonical.push(if field.required { '!' } else { '?' });
                canonical.push('\u{1e}');
            }
        }
        xxh64(canonical.as_bytes(), 0)
    }
}

impl From<&str> for SchemaField {
    fn from(name: &str) -> Self {
        SchemaField::new(name)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.fields)?;
        }
        map.end()
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = Schema;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of category name to a list of spec fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
        let mut schema = Schema::new();
        while let Some((name, fields)) = access.next_entry::<String, Vec<SchemaField>>()? {
            schema = schema.with_category(&name, fields);
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_preserves_order() {
        let json = r#"{
            "Lenses": [{"name": "Focal Length", "required": true}, {"name": "Weight"}],
            "Cameras": [{"name": "Sensor Size"}, {"name": "Weight"}]
        }"#;
        let schema = Schema::from_json(json).unwrap();

        let names: Vec<&str> = schema.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lenses", "Cameras"]);
        assert!(schema.categories()[0].fields[0].required);
        assert_eq!(schema.iter_fields().count(), 4);
    }

    #[test]
    fn test_missing_name_is_tolerated() {
        let schema = Schema::from_json(r#"{"Audio": [{"required": true}, {"name": "Polar Pattern"}]}"#)
            .unwrap();
        assert_eq!(schema.categories()[0].fields[0].name, "");
        assert!(!schema.is_empty());
    }

    #[test]
    fn test_null_and_non_string_names_are_tolerated() {
        let schema = Schema::from_json(
            r#"{"Audio": [{"name": null}, {"name": 42, "required": null}, {"name": "Polar Pattern", "required": true}]}"#,
        )
        .unwrap();
        let fields = &schema.categories()[0].fields;
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "");
        assert_eq!(fields[1].name, "");
        assert!(!fields[1].required);
        assert!(fields[2].required);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Schema::from_json("[1, 2]"), Err(SchemaError::Json(_))));
    }

    #[test]
    fn test_fingerprint_tracks_content_and_order() {
        let a = Schema::new().with_category("Lenses", ["Focal Length", "Weight"]);
        let b = Schema::new().with_category("Lenses", ["Focal Length", "Weight"]);
        let c = Schema::new().with_category("Lenses", ["Weight", "Focal Length"]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_serialize_round_trip_order() {
        let schema = Schema::new()
            .with_category("Lighting", ["Color Temperature"])
            .with_category("Audio", ["Polar Pattern"]);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.find("Lighting").unwrap() < json.find("Audio").unwrap());
    }
}
