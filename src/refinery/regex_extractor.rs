// * Pair Extraction
// * Turns cleaned lines into raw (key, value) candidates. Delimited lines are
// * tried against a fixed pattern order; undelimited label/value line pairs
// * fall back to a two-line heuristic. The first leftover line that reads
// * like a product title becomes the product name.

use crate::config::constants::{
    MAX_LABEL_LENGTH, MAX_LINE_LENGTH, MAX_VALUE_LENGTH, MIN_LABEL_LENGTH, MIN_LINE_LENGTH,
};
use crate::refinery::metadata::find_brand;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

// * Delimiters, tried in this order; the first whose value survives validation wins
static DELIMITERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("tab", r"^([^\t]+?)\t+(.+)$"),
        ("colon", r"^([^:]+?)\s*:\s*(.+)$"),
        ("pipe", r"^([^|]+?)\s*\|\s*(.+)$"),
        ("equals", r"^([^=]+?)\s*=\s*([^>\s].*)$"),
        ("arrow", r"^(.+?)\s*(?:→|->|=>)\s*(.+)$"),
        ("dash", r"^(.+?)\s+[-–—]\s+(.+)$"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("Invalid delimiter regex")))
    .collect()
});

// * Navigation, legal and commerce chrome that never carries specs
static NOISE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:home|menu|search|sign in|sign up|log ?in|log ?out|register|my account|account|cart|basket|checkout|wish ?list|compare|share|print|email|back|next|previous|back to top|skip to (?:main )?content|add to (?:cart|bag|basket|wish ?list)|buy now|shop now|order now|pre-?order|in stock|out of stock|sold out|free shipping.*|free returns.*|write a review|reviews?(?: \(\d+\))?|q ?& ?a|ask a question|see (?:all|more)|view (?:all|more|details)|learn more|read more|show (?:more|less)|contact us|customer (?:service|support)|help|faq|newsletter|subscribe|follow us|privacy policy|terms(?: of (?:use|service)| & conditions| and conditions)?|cookie (?:policy|settings)|accept(?: all)?(?: cookies)?)[\s.!:>»›|]*$",
    )
    .expect("Invalid noise regex")
});

static NOISE_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)all rights reserved|©|\bcopyright\b|\bcookies?\b.*\b(?:consent|accept)")
        .expect("Invalid legal noise regex")
});

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s.,/%$€£¥+-]+$").expect("Invalid bare number regex"));

static ALL_CAPS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_&-]*$").expect("Invalid caps token regex"));

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[({<][^\])}>]*[\])}>]$").expect("Invalid bracketed regex"));

static BARE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{L}[^:|=\t→]*$").expect("Invalid label regex"));

static VALUE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\d|\d\s*(?:mm|cm|m|in|inch(?:es)?|kg|g|lbs?|oz|mah|wh|v|w|a|hz|khz|mhz|ghz|fps|p|mp|k|lux|lm|db|gb|tb|mb/s|gb/s|min|h|hrs?|°)\b|\b(?:yes|no|true|false|none|n/a|included|built-in)\b|\bf/\d|^[A-Z]{1,6}-?\d[\w-]*$",
    )
    .expect("Invalid value hint regex")
});

static PRODUCT_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:camera|mirrorless|dslr|camcorder|lens|speedlight|flash|strobe|light|led panel|microphone|mic|recorder|drone|tripod|monopod|gimbal|stabilizer|monitor|battery|charger|memory card|ssd|softbox|kit)\b",
    )
    .expect("Invalid product noun regex")
});

/// A raw key/value candidate pulled from one line (or a label line plus its value line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPair {
    pub key: String,
    pub value: String,
    pub source_line: String,
    pub line_index: usize,
}

/// Everything the line pass produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineExtraction {
    pub pairs: Vec<RawPair>,
    pub name: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Noise test for a trimmed line
pub fn is_noise_line(line: &str) -> bool {
    NOISE_PHRASE.is_match(line)
        || NOISE_ANYWHERE.is_match(line)
        || BARE_NUMBER.is_match(line)
        || ALL_CAPS_TOKEN.is_match(line)
        || BRACKETED.is_match(line)
}

fn is_candidate_line(line: &str) -> bool {
    let len = char_len(line);
    (MIN_LINE_LENGTH..=MAX_LINE_LENGTH).contains(&len) && !is_noise_line(line)
}

fn is_url(value: &str) -> bool {
    let value = value.trim();
    if value.starts_with("www.") || value.starts_with("//") {
        return true;
    }
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https" | "ftp"))
        .unwrap_or(false)
}

fn valid_value(value: &str) -> bool {
    let len = char_len(value);
    (1..=MAX_VALUE_LENGTH).contains(&len) && !is_url(value)
}

fn clean_key(key: &str) -> String {
    key.trim()
        .trim_start_matches(['•', '*', '·', '-', '–', '#'])
        .trim_end_matches([':', '.', ' '])
        .trim()
        .to_string()
}

/// Splits a line on the first delimiter pattern that yields a usable pair
pub fn split_delimited(line: &str) -> Option<(String, String)> {
    for (_, pattern) in DELIMITERS.iter() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let key = clean_key(&caps[1]);
        let value = caps[2].trim().to_string();
        // * A URL on the right means this delimiter was part of the URL; try the next one
        if !key.is_empty() && valid_value(&value) {
            return Some((key, value));
        }
    }
    None
}

fn looks_like_label(line: &str) -> bool {
    let len = char_len(line);
    (MIN_LABEL_LENGTH..=MAX_LABEL_LENGTH).contains(&len) && BARE_LABEL.is_match(line)
}

fn looks_like_value(line: &str) -> bool {
    VALUE_HINT.is_match(line) && valid_value(line)
}

/// True when the line names a known brand or a generic product noun
pub fn looks_like_product_name(line: &str) -> bool {
    find_brand(line).is_some() || PRODUCT_NOUN.is_match(line)
}

/// Runs the line pass over cleaned text
pub fn extract_pairs(text: &str) -> LineExtraction {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut result = LineExtraction::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if !is_candidate_line(line) {
            i += 1;
            continue;
        }

        if let Some((key, value)) = split_delimited(line) {
            result.pairs.push(RawPair {
                key,
                value,
                source_line: line.to_string(),
                line_index: i,
            });
            i += 1;
            continue;
        }

        // * Two-line heuristic: "Weight" on one line, "738 g" on the next
        if looks_like_label(line.trim_start_matches('#').trim()) {
            if let Some(next) = lines.get(i + 1).copied() {
                if is_candidate_line(next) && split_delimited(next).is_none() && looks_like_value(next) {
                    result.pairs.push(RawPair {
                        key: clean_key(line),
                        value: next.to_string(),
                        source_line: format!("{}\n{}", line, next),
                        line_index: i,
                    });
                    i += 2;
                    continue;
                }
            }
        }

        if result.name.is_empty() && looks_like_product_name(line) {
            result.name = line.trim_start_matches('#').trim().to_string();
        }
        i += 1;
    }

    tracing::trace!(
        lines = lines.len(),
        pairs = result.pairs.len(),
        has_name = !result.name.is_empty(),
        "Line pass complete"
    );

    result
}
