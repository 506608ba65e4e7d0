// * Unit Normalizer & Value Coercer
// * Pure string rewrites applied after resolution. Confidence bookkeeping never passes through here.

use crate::engine::normalization::normalize;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

const MM_PER_INCH: f64 = 25.4;
const MM_PER_CM: f64 = 10.0;
const GRAMS_PER_POUND: f64 = 453.592_37;
const GRAMS_PER_OUNCE: f64 = 28.349_523;

/// Target unit system for value post-processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn is_metric(self) -> bool {
        self == UnitSystem::Metric
    }
}

// * Measurement patterns match the whole (trimmed) value so prose is never rewritten
static COMPOUND_WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)\.?\s*,?\s*(\d+(?:\.\d+)?)\s*(?:oz|ounces?)\.?$")
        .expect("Invalid compound weight regex")
});

static DIMENSIONS_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(\d+(?:\.\d+)?)\s*(?:in|"|″)?\s*[x×*]\s*(\d+(?:\.\d+)?)\s*(?:in|"|″)?\s*[x×*]\s*(\d+(?:\.\d+)?)\s*(?:inches|inch|in\.?|"|″)$"#)
        .expect("Invalid inch dimensions regex")
});

static DIMENSIONS_METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*[x×*]\s*(\d+(?:\.\d+)?)\s*[x×*]\s*(\d+(?:\.\d+)?)\s*(mm|cm)$")
        .expect("Invalid metric dimensions regex")
});

type Converter = fn(f64) -> String;

// * Single-unit conversions toward metric, tried in order
static METRIC_CONVERSIONS: LazyLock<Vec<(Regex, Converter)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r#"(?i)^(\d+(?:\.\d+)?)\s*(?:inches|inch|in\.?|"|″)$"#)
                .expect("Invalid inch regex"),
            inches_to_mm as Converter,
        ),
        (
            Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)\.?$").expect("Invalid pound regex"),
            pounds_to_grams as Converter,
        ),
        (
            Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:oz|ounces?)\.?$").expect("Invalid ounce regex"),
            ounces_to_grams as Converter,
        ),
        (
            Regex::new(r"(?i)^(-?\d+(?:\.\d+)?)\s*°?\s*F$").expect("Invalid fahrenheit regex"),
            fahrenheit_to_celsius as Converter,
        ),
    ]
});

static IMPERIAL_CONVERSIONS: LazyLock<Vec<(Regex, Converter)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*mm$").expect("Invalid millimeter regex"),
            mm_to_inches as Converter,
        ),
        (
            Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*cm$").expect("Invalid centimeter regex"),
            cm_to_inches as Converter,
        ),
    ]
});

fn inches_to_mm(v: f64) -> String {
    format!("{} mm", format_number(v * MM_PER_INCH, 1))
}

fn pounds_to_grams(v: f64) -> String {
    format_grams(v * GRAMS_PER_POUND)
}

fn ounces_to_grams(v: f64) -> String {
    format_grams(v * GRAMS_PER_OUNCE)
}

fn fahrenheit_to_celsius(v: f64) -> String {
    format!("{} °C", format_number((v - 32.0) * 5.0 / 9.0, 1))
}

fn mm_to_inches(v: f64) -> String {
    format!("{} in", format_number(v / MM_PER_INCH, 2))
}

fn cm_to_inches(v: f64) -> String {
    format!("{} in", format_number(v * MM_PER_CM / MM_PER_INCH, 2))
}

static COLOR_TEMP_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{3,5})\s*K?\s*(?:-|–|—|~|to)\s*(\d{3,5})\s*K$")
        .expect("Invalid color temperature regex")
});

static BARE_APERTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:f\s*/?\s*)?(\d+(?:\.\d+)?)$").expect("Invalid aperture regex")
});

// * Spec names whose values are yes/no flags
static BOOLEAN_SPECS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [
        "Weather Sealing", "Weather Resistant", "Image Stabilization", "Touchscreen",
        "Touch Screen", "Wi-Fi", "WiFi", "Bluetooth", "GPS", "Built-in Flash", "Autofocus",
        "Articulating Screen", "Waterproof", "Hot Shoe", "Headphone Jack", "Phantom Power",
        "Dimmable", "App Control", "Obstacle Avoidance", "HDMI Output",
    ]
    .iter()
    .map(|s| normalize(s))
    .collect()
});

const TRUE_WORDS: &[&str] = &[
    "yes", "y", "true", "✓", "✔", "☑", "included", "supported", "available", "built-in",
    "builtin", "present", "on", "1", "with",
];

const FALSE_WORDS: &[&str] = &[
    "no", "n", "false", "✗", "✘", "✕", "none", "not supported", "not available",
    "not included", "unsupported", "absent", "off", "0", "without",
];

/// Rewrites a measurement into the target system. Values that are not a bare
/// measurement are returned unchanged (trimmed).
///
/// # Example
/// ```
/// use spec_refinery::engine::units::normalize_units;
///
/// assert_eq!(normalize_units("6.5 x 4.3 x 3.1 inches", true), "165.1 × 109.2 × 78.7 mm");
/// ```
pub fn normalize_units(value: &str, to_metric: bool) -> String {
    let trimmed = value.trim();

    if to_metric {
        if let Some(caps) = COMPOUND_WEIGHT.captures(trimmed) {
            let pounds = capture_f64(&caps, 1);
            let ounces = capture_f64(&caps, 2);
            return format_grams(pounds * GRAMS_PER_POUND + ounces * GRAMS_PER_OUNCE);
        }

        if let Some(caps) = DIMENSIONS_IN.captures(trimmed) {
            return format_triple(&caps, MM_PER_INCH, 1, "mm");
        }

        if let Some(converted) = apply_table(&METRIC_CONVERSIONS, trimmed) {
            return converted;
        }
    } else {
        if let Some(caps) = DIMENSIONS_METRIC.captures(trimmed) {
            let factor = if caps[4].eq_ignore_ascii_case("cm") {
                MM_PER_CM / MM_PER_INCH
            } else {
                1.0 / MM_PER_INCH
            };
            return format_triple(&caps, factor, 2, "in");
        }

        if let Some(converted) = apply_table(&IMPERIAL_CONVERSIONS, trimmed) {
            return converted;
        }
    }

    trimmed.to_string()
}

/// Canonicalizes a value according to what its spec holds: yes/no flags,
/// color temperature ranges and f-numbers. Anything else passes through.
pub fn coerce_value(spec_name: &str, value: &str) -> String {
    let spec = normalize(spec_name);
    let trimmed = value.trim();

    if BOOLEAN_SPECS.contains(&spec) {
        if let Some(flag) = coerce_boolean(trimmed) {
            return if flag { "Yes" } else { "No" }.to_string();
        }
        return trimmed.to_string();
    }

    if spec.contains("color temperature") || spec == "cct" {
        if let Some(caps) = COLOR_TEMP_RANGE.captures(trimmed) {
            return format!("{}–{} K", &caps[1], &caps[2]);
        }
    }

    if spec.contains("aperture") {
        if let Some(caps) = BARE_APERTURE.captures(trimmed) {
            return format!("f/{}", &caps[1]);
        }
    }

    trimmed.to_string()
}

/// Maps the yes/no vocabulary onto a bool
pub fn coerce_boolean(value: &str) -> Option<bool> {
    let lower = value.trim().to_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn apply_table(table: &[(Regex, Converter)], value: &str) -> Option<String> {
    table.iter().find_map(|(pattern, convert)| {
        pattern
            .captures(value)
            .map(|caps| convert(capture_f64(&caps, 1)))
    })
}

fn format_triple(caps: &Captures, factor: f64, decimals: usize, unit: &str) -> String {
    let parts: Vec<String> = (1..=3)
        .map(|i| format_number(capture_f64(caps, i) * factor, decimals))
        .collect();
    format!("{} {}", parts.join(" × "), unit)
}

fn capture_f64(caps: &Captures, group: usize) -> f64 {
    caps.get(group)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

// * Grams below a kilogram, kilograms (2 dp) above
fn format_grams(grams: f64) -> String {
    if grams >= 1000.0 {
        format!("{} kg", format_number(grams / 1000.0, 2))
    } else {
        format!("{} g", format_number(grams, 0))
    }
}

/// Fixed decimals with trailing zeros removed
fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    if formatted.contains('.') {
        let stripped = formatted.trim_end_matches('0').trim_end_matches('.');
        if stripped == "-0" {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_triple_to_mm() {
        assert_eq!(normalize_units("6.5 x 4.3 x 3.1 inches", true), "165.1 × 109.2 × 78.7 mm");
        assert_eq!(normalize_units("2 × 3 × 4\"", true), "50.8 × 76.2 × 101.6 mm");
    }

    #[test]
    fn test_dimension_triple_to_inches() {
        assert_eq!(normalize_units("254 x 127 x 25.4 mm", false), "10 × 5 × 1 in");
        assert_eq!(normalize_units("10 x 20 x 5 cm", false), "3.94 × 7.87 × 1.97 in");
    }

    #[test]
    fn test_compound_weight() {
        assert_eq!(normalize_units("1 lb 5 oz", true), "595 g");
        assert_eq!(normalize_units("3 lbs 2 oz", true), "1.42 kg");
    }

    #[test]
    fn test_single_units() {
        assert_eq!(normalize_units("2 in", true), "50.8 mm");
        assert_eq!(normalize_units("16 oz", true), "454 g");
        assert_eq!(normalize_units("2.5 lb", true), "1.13 kg");
        assert_eq!(normalize_units("212°F", true), "100 °C");
        assert_eq!(normalize_units("50.8 mm", false), "2 in");
    }

    #[test]
    fn test_non_measurements_untouched() {
        assert_eq!(normalize_units("  3 in 1 adapter ", true), "3 in 1 adapter");
        assert_eq!(normalize_units("Full-frame CMOS", true), "Full-frame CMOS");
        assert_eq!(normalize_units("738 g", true), "738 g");
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(coerce_value("Weather Sealing", "✓"), "Yes");
        assert_eq!(coerce_value("Wi-Fi", "Supported"), "Yes");
        assert_eq!(coerce_value("Bluetooth", "not available"), "No");
        assert_eq!(coerce_value("GPS", "Via smartphone"), "Via smartphone");
        // * Not a boolean spec
        assert_eq!(coerce_value("Sensor Size", "yes"), "yes");
    }

    #[test]
    fn test_color_temperature_range() {
        assert_eq!(coerce_value("Color Temperature", "2700K-6500K"), "2700–6500 K");
        assert_eq!(coerce_value("Color Temperature", "3200 to 5600K"), "3200–5600 K");
        assert_eq!(coerce_value("Color Temperature", "5600K"), "5600K");
    }

    #[test]
    fn test_aperture_prefix() {
        assert_eq!(coerce_value("Maximum Aperture", "2.8"), "f/2.8");
        assert_eq!(coerce_value("Maximum Aperture", "F1.4"), "f/1.4");
        assert_eq!(coerce_value("Minimum Aperture", "f/22"), "f/22");
        assert_eq!(coerce_value("Maximum Aperture", "f/2.8-4"), "f/2.8-4");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(165.1, 1), "165.1");
        assert_eq!(format_number(10.0, 2), "10");
        assert_eq!(format_number(-0.01, 1), "0");
    }
}
