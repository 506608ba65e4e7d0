// * Key Normalization & Abbreviation Expansion
// * Every comparison in the matcher runs on the canonical form produced here.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// * Dash variants folded to a space (hyphen, en/em dash, figure dash, minus, underscore)
const DASHES: [char; 7] = ['-', '\u{2010}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}', '_'];

// * Per-token abbreviation dictionary. Values may expand to several words.
static ABBREVIATIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("max", "maximum"),
        ("min", "minimum"),
        ("wt", "weight"),
        ("dim", "dimensions"),
        ("dims", "dimensions"),
        ("res", "resolution"),
        ("temp", "temperature"),
        ("batt", "battery"),
        ("cap", "capacity"),
        ("approx", "approximately"),
        ("freq", "frequency"),
        ("resp", "response"),
        ("sens", "sensitivity"),
        ("mfr", "manufacturer"),
        ("mfg", "manufacturer"),
        ("qty", "quantity"),
        ("no", "number"),
        ("num", "number"),
        ("af", "autofocus"),
        ("mf", "manual focus"),
        ("ois", "optical image stabilization"),
        ("ibis", "in body image stabilization"),
        ("fps", "frames per second"),
        ("wb", "white balance"),
        ("evf", "electronic viewfinder"),
        ("cct", "color temperature"),
        ("cri", "color rendering index"),
        ("lm", "lumens"),
        ("dia", "diameter"),
        ("diam", "diameter"),
        ("len", "length"),
        ("ht", "height"),
        ("hgt", "height"),
        ("pwr", "power"),
        ("vid", "video"),
        ("rec", "recording"),
        ("ext", "external"),
        ("int", "internal"),
        ("conn", "connectivity"),
        ("bt", "bluetooth"),
        ("mic", "microphone"),
        ("stab", "stabilization"),
        ("mag", "magnification"),
        ("colour", "color"),
        ("incl", "included"),
        ("compat", "compatibility"),
        ("gn", "guide number"),
        ("hss", "high speed sync"),
    ]
    .into_iter()
    .collect()
});

// * Words too common to carry matching signal on their own
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "and", "for", "with", "from", "per", "into", "your", "this", "that", "are",
        "was", "has", "have", "all", "its", "via", "not", "any",
    ]
    .into_iter()
    .collect()
});

/// Canonical comparison form of a key or spec name.
///
/// Lowercases, folds dash variants to spaces, drops bracket punctuation and
/// every character outside `[a-z0-9 /%.]`, then collapses whitespace.
/// Applying it twice yields the same string.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars().flat_map(char::to_lowercase) {
        match ch {
            'a'..='z' | '0'..='9' | '/' | '%' | '.' => out.push(ch),
            c if c.is_whitespace() || DASHES.contains(&c) => out.push(' '),
            // * Brackets and everything else are dropped without a separator
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expands known abbreviations token by token. Expects normalized input.
pub fn expand_abbreviations(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|token| ABBREVIATIONS.get(token).copied().unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes then expands in one step.
pub fn canonicalize(input: &str) -> String {
    expand_abbreviations(&normalize(input))
}

/// Splits an expanded string into signal-bearing tokens.
/// Tokens of two characters or fewer and stop words are dropped.
pub fn tokenize(expanded: &str) -> Vec<&str> {
    expanded
        .split_whitespace()
        .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(t))
        .collect()
}
