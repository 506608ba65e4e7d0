// * Product Metadata Detection
// * Heuristic detectors that run over the raw pairs and the full cleaned text:
// * price -> brand -> category -> serial / model numbers.

use crate::engine::normalization::normalize;
use crate::refinery::regex_extractor::RawPair;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// * Known manufacturers, matched case-insensitively on word boundaries.
// * Longer names precede their prefixes ("Fujifilm" before "Fuji").
pub const BRANDS: &[&str] = &[
    "Canon", "Nikon", "Sony", "Fujifilm", "Fuji", "Panasonic", "Lumix", "Olympus", "OM System",
    "Leica", "Hasselblad", "Pentax", "Ricoh", "Sigma", "Tamron", "Tokina", "Samyang", "Rokinon",
    "Zeiss", "Voigtlander", "Laowa", "Viltrox", "7Artisans", "TTArtisan", "Blackmagic",
    "RED Digital Cinema", "ARRI", "GoPro", "DJI", "Insta360", "Godox", "Profoto", "Aputure",
    "Nanlite", "Elinchrom", "Westcott", "Neewer", "Rode", "Røde", "Sennheiser", "Shure",
    "Tascam", "Deity", "Saramonic", "Manfrotto", "Gitzo", "Peak Design", "Benro", "Sirui",
    "Joby", "Zhiyun", "Atomos", "SmallHD", "Feelworld", "SanDisk", "Lexar", "ProGrade",
    "Angelbird", "Kingston", "Anton Bauer", "Core SWX", "SmallRig", "Tilta", "Lowepro",
    "Think Tank", "Tiffen", "B+W", "Hoya", "NiSi", "PolarPro",
];

/// Fixed product categories with their keyword vocabulary. Declaration order breaks ties.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("Cameras", &["camera", "mirrorless", "dslr", "camcorder", "sensor", "shutter", "viewfinder", "iso", "megapixel", "burst"]),
    ("Lenses", &["lens", "aperture", "focal length", "zoom", "prime", "filter thread", "optical", "elements", "bokeh", "mount"]),
    ("Lighting", &["light", "led", "cri", "tlci", "color temperature", "lux", "softbox", "flash", "strobe", "bi-color"]),
    ("Audio", &["microphone", "mic", "audio", "polar pattern", "frequency response", "xlr", "preamp", "lavalier", "shotgun", "recorder"]),
    ("Drones", &["drone", "flight time", "propeller", "quadcopter", "gps", "obstacle", "altitude", "remote controller", "fpv", "hover"]),
    ("Tripods & Supports", &["tripod", "monopod", "ball head", "legs", "max load", "leg sections", "center column", "pan head", "fluid head", "quick release"]),
    ("Gimbals & Stabilizers", &["gimbal", "stabilizer", "payload", "axis", "pan", "tilt", "roll", "follow mode", "steadicam", "motor"]),
    ("Monitors & Recorders", &["monitor", "display", "nits", "brightness", "hdmi", "sdi", "lut", "waveform", "touchscreen", "prores"]),
    ("Storage & Media", &["memory card", "sd card", "cfexpress", "ssd", "storage", "read speed", "write speed", "capacity", "uhs", "microsd"]),
    ("Power & Batteries", &["battery", "charger", "mah", "wh", "v-mount", "power bank", "dc output", "charging", "voltage", "np-f"]),
    ("Accessories", &["cage", "strap", "bag", "case", "adapter", "cable", "filter", "hood", "cap", "bracket"]),
];

// * Price labels, best first. An exact key match outranks a containment match.
const PRICE_LABELS: &[&str] = &[
    "purchase price",
    "price paid",
    "paid",
    "sale price",
    "our price",
    "your price",
    "special price",
    "current price",
    "price",
    "cost",
    "list price",
    "regular price",
    "retail price",
    "msrp",
    "rrp",
];

static PRICE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:price|cost|paid|msrp|rrp)\b").expect("Invalid price key regex")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([$€£¥]|usd|eur|gbp|jpy)?\s*(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{1,2}))?")
        .expect("Invalid amount regex")
});

static CURRENCY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([$€£¥])\s*(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{1,2}))?\s*(?:-|–|—|to)\s*[$€£¥]?\s*(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?",
    )
    .expect("Invalid currency range regex")
});

static CURRENCY_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([$€£¥])\s*(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{1,2}))?")
        .expect("Invalid currency regex")
});

static SERIAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:serial(?:\s*(?:number|no\.?|num|#))?|s/?n|sn)$").expect("Invalid serial key regex")
});

static MODEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:model(?:\s*(?:number|no\.?|num|#|code))?|mpn|part\s*(?:number|no\.?|#)|mfr\.?\s*(?:part\s*)?(?:number|no\.?|#)|item\s*model\s*number)$")
        .expect("Invalid model key regex")
});

static BRAND_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    BRANDS
        .iter()
        .map(|brand| {
            let pattern = format!(r"(?i)(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])", regex::escape(brand));
            (*brand, Regex::new(&pattern).expect("Invalid brand regex"))
        })
        .collect()
});

static CATEGORY_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CATEGORIES
        .iter()
        .map(|(name, keywords)| {
            let alternation = keywords.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
            let pattern = format!(r"(?i)\b(?:{})\b", alternation);
            (*name, Regex::new(&pattern).expect("Invalid category regex"))
        })
        .collect()
});

/// Detected purchase price: always formatted with two decimals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMatch {
    pub price: String,
    pub note: String,
}

fn format_amount(whole: &str, cents: Option<&str>) -> Option<String> {
    let whole = whole.replace(',', "");
    let raw = match cents {
        Some(cents) => format!("{}.{}", whole, cents),
        None => whole,
    };
    raw.parse::<f64>().ok().map(|v| format!("{:.2}", v))
}

fn currency_note(symbol: &str) -> String {
    match symbol.to_lowercase().as_str() {
        "" | "$" | "usd" => String::new(),
        other => format!("Currency: {}", other.to_uppercase()),
    }
}

fn price_label_rank(key: &str) -> Option<usize> {
    let key = normalize(key);
    PRICE_LABELS
        .iter()
        .position(|label| key == *label)
        .or_else(|| PRICE_LABELS.iter().position(|label| key.contains(label)))
}

/// Price detection: labelled pairs first (ranked), then a currency range in the
/// text (lower bound), then the first currency-prefixed amount.
pub fn detect_price(pairs: &[RawPair], text: &str) -> Option<PriceMatch> {
    let mut labelled: Vec<(usize, &RawPair)> = pairs
        .iter()
        .filter(|p| PRICE_KEY.is_match(&p.key))
        .filter_map(|p| price_label_rank(&p.key).map(|rank| (rank, p)))
        .collect();
    labelled.sort_by_key(|(rank, _)| *rank);

    for (_, pair) in labelled {
        if let Some(caps) = AMOUNT.captures(&pair.value) {
            let symbol = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if let Some(price) = format_amount(&caps[2], caps.get(3).map(|m| m.as_str())) {
                return Some(PriceMatch {
                    price,
                    note: currency_note(symbol),
                });
            }
        }
    }

    if let Some(caps) = CURRENCY_RANGE.captures(text) {
        if let Some(price) = format_amount(&caps[2], caps.get(3).map(|m| m.as_str())) {
            let mut note = format!("Range: {}", caps[0].trim());
            let currency = currency_note(&caps[1]);
            if !currency.is_empty() {
                note.push_str("; ");
                note.push_str(&currency);
            }
            return Some(PriceMatch { price, note });
        }
    }

    let caps = CURRENCY_SINGLE.captures(text)?;
    let price = format_amount(&caps[2], caps.get(3).map(|m| m.as_str()))?;
    Some(PriceMatch {
        price,
        note: currency_note(&caps[1]),
    })
}

/// First brand from the static list found in `text`
pub fn find_brand(text: &str) -> Option<&'static str> {
    BRAND_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(brand, _)| *brand)
}

/// Brand lookup over the product name first, then the whole text
pub fn detect_brand(name: &str, text: &str) -> Option<&'static str> {
    find_brand(name).or_else(|| find_brand(text))
}

/// Category with the most keyword hits; None when nothing matches
pub fn detect_category(text: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (name, pattern) in CATEGORY_PATTERNS.iter() {
        let hits = pattern.find_iter(text).count();
        if hits > 0 && best.map_or(true, |(_, score)| hits > score) {
            best = Some((*name, hits));
        }
    }

    if let Some((category, hits)) = best {
        tracing::trace!(category, hits, "Category detected");
    }
    best.map(|(name, _)| name)
}

fn first_value_for(pairs: &[RawPair], key: &Regex) -> Option<String> {
    pairs
        .iter()
        .find(|p| key.is_match(p.key.trim()) && !p.value.trim().is_empty())
        .map(|p| p.value.trim().to_string())
}

pub fn detect_serial(pairs: &[RawPair]) -> Option<String> {
    first_value_for(pairs, &SERIAL_KEY)
}

pub fn detect_model(pairs: &[RawPair]) -> Option<String> {
    first_value_for(pairs, &MODEL_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> RawPair {
        RawPair {
            key: key.to_string(),
            value: value.to_string(),
            source_line: format!("{}: {}", key, value),
            line_index: 0,
        }
    }

    #[test]
    fn test_labelled_price() {
        let pairs = vec![pair("Sale Price", "$499.00")];
        let price = detect_price(&pairs, "Sale Price: $499.00").unwrap();
        assert_eq!(price.price, "499.00");
        assert_eq!(price.note, "");
    }

    #[test]
    fn test_price_label_priority() {
        let pairs = vec![
            pair("List Price", "$1,299"),
            pair("MSRP", "$1,399.99"),
            pair("Sale Price", "$1,099.5"),
        ];
        let price = detect_price(&pairs, "").unwrap();
        assert_eq!(price.price, "1099.50");
    }

    #[test]
    fn test_price_range_fallback() {
        let text = "Body only\nAvailable from $2,498.00 - $2,798.00 depending on kit";
        let price = detect_price(&[], text).unwrap();
        assert_eq!(price.price, "2498.00");
        assert!(price.note.starts_with("Range:"));
        assert!(price.note.contains("$2,798.00"));
    }

    #[test]
    fn test_single_currency_fallback() {
        let price = detect_price(&[], "Paid €899 at the shop").unwrap();
        assert_eq!(price.price, "899.00");
        assert_eq!(price.note, "Currency: €");

        let price = detect_price(&[], "Bought for £450.5 last year").unwrap();
        assert_eq!(price.price, "450.50");
        assert_eq!(price.note, "Currency: £");
    }

    #[test]
    fn test_no_price() {
        assert!(detect_price(&[pair("Price", "Call for pricing")], "no money here").is_none());
    }

    #[test]
    fn test_brand_name_first() {
        assert_eq!(detect_brand("Sony A7 IV", "Compatible with Canon batteries"), Some("Sony"));
        assert_eq!(detect_brand("", "Made by Fujifilm in Japan"), Some("Fujifilm"));
        assert_eq!(detect_brand("Mystery Cam", "no brand"), None);
    }

    #[test]
    fn test_brand_word_boundaries() {
        // * "sonya" and "canonical" are not brands
        assert_eq!(find_brand("sonya canonical"), None);
        assert_eq!(find_brand("DJI Mini 4 Pro"), Some("DJI"));
    }

    #[test]
    fn test_category_scoring() {
        let text = "Mirrorless camera with full-frame sensor, ISO 100-51200 and a 5-axis stabilizer";
        assert_eq!(detect_category(text), Some("Cameras"));

        let text = "Fast prime lens, aperture f/1.4, filter thread 67mm";
        assert_eq!(detect_category(text), Some("Lenses"));

        assert_eq!(detect_category("nothing relevant"), None);
    }

    #[test]
    fn test_category_tie_goes_to_first_declared() {
        // * one hit each for Cameras ("camera") and Lenses ("lens")
        assert_eq!(detect_category("camera lens"), Some("Cameras"));
    }

    #[test]
    fn test_serial_and_model() {
        let pairs = vec![
            pair("Weight", "738 g"),
            pair("Serial No.", "SN123456"),
            pair("Model Number", "ILCE-7M4"),
            pair("S/N", "ignored"),
        ];
        assert_eq!(detect_serial(&pairs).as_deref(), Some("SN123456"));
        assert_eq!(detect_model(&pairs).as_deref(), Some("ILCE-7M4"));
        assert_eq!(detect_model(&[pair("Modelling", "x")]), None);
    }
}
