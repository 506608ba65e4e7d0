// * String Similarity Scorer
// * Layered heuristics, cheapest first: exact -> expanded -> containment -> tokens -> edit distance.
// * Returns an integer score in [0, 100].

use crate::config::constants::EDIT_DISTANCE_MAX_LEN;
use crate::engine::normalization::{expand_abbreviations, normalize, tokenize};

// * Score bands
const SCORE_EXACT: u8 = 100;
const SCORE_EXPANDED: u8 = 97;
const CONTAINMENT_MIN_RATIO: f64 = 0.4;
const CONTAINMENT_FLOOR: f64 = 80.0;
const CONTAINMENT_SPAN: f64 = 15.0;
const TOKEN_MIN_RATIO: f64 = 0.5;
const TOKEN_BASE: f64 = 50.0;
const TOKEN_SPAN: f64 = 35.0;
const TOKEN_EXACT_BONUS: f64 = 5.0;
const NEAR_TOKEN_WEIGHT: f64 = 0.8;
const NEAR_TOKEN_MIN_LEN: usize = 5;
const SHARED_LONG_TOKEN_LEN: usize = 7;
const SHARED_LONG_TOKEN_SCORE: u8 = 55;
const SHARED_TOKEN_LEN: usize = 5;
const SHARED_TOKEN_SCORE: u8 = 50;
const EDIT_MIN_RATIO: f64 = 0.7;
const EDIT_BASE: f64 = 40.0;
const EDIT_SPAN: f64 = 20.0;

/// Similarity between two raw strings, 0-100.
///
/// # Example
/// ```
/// use spec_refinery::engine::similarity::similarity_score;
///
/// assert_eq!(similarity_score("Max Aperture", "Maximum Aperture"), 97);
/// assert_eq!(similarity_score("Weight", "weight"), 100);
/// ```
pub fn similarity_score(a: &str, b: &str) -> u8 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return 0;
    }

    // * Step 1: exact after normalization, then after expansion
    if norm_a == norm_b {
        return SCORE_EXACT;
    }

    let exp_a = expand_abbreviations(&norm_a);
    let exp_b = expand_abbreviations(&norm_b);
    if exp_a == exp_b {
        return SCORE_EXPANDED;
    }

    // * Step 2: one contains the other
    if let Some(score) = containment_score(&exp_a, &exp_b) {
        return score;
    }

    // * Step 3: token overlap
    if let Some(score) = token_overlap_score(&exp_a, &exp_b) {
        return score;
    }

    // * Step 4: edit distance, short strings only
    let len_a = exp_a.chars().count();
    let len_b = exp_b.chars().count();
    if len_a <= EDIT_DISTANCE_MAX_LEN && len_b <= EDIT_DISTANCE_MAX_LEN {
        let distance = levenshtein(&exp_a, &exp_b);
        let ratio = 1.0 - distance as f64 / len_a.max(len_b) as f64;
        if ratio >= EDIT_MIN_RATIO {
            return (EDIT_BASE + ratio * EDIT_SPAN).round() as u8;
        }
    }

    0
}

// * 80-95, linear in the length ratio over (0.4, 1.0]
fn containment_score(a: &str, b: &str) -> Option<u8> {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if !longer.contains(shorter) {
        return None;
    }

    let ratio = shorter.chars().count() as f64 / longer.chars().count() as f64;
    if ratio <= CONTAINMENT_MIN_RATIO {
        return None;
    }

    let scaled = (ratio - CONTAINMENT_MIN_RATIO) / (1.0 - CONTAINMENT_MIN_RATIO);
    Some((CONTAINMENT_FLOOR + scaled * CONTAINMENT_SPAN).round() as u8)
}

fn token_overlap_score(a: &str, b: &str) -> Option<u8> {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return None;
    }

    // * Each token on the right side can be consumed once
    let mut used = vec![false; tokens_b.len()];
    let mut exact = 0usize;
    let mut leftovers = Vec::new();

    for token in &tokens_a {
        match (0..tokens_b.len()).find(|&j| !used[j] && tokens_b[j] == *token) {
            Some(j) => {
                used[j] = true;
                exact += 1;
            }
            None => leftovers.push(*token),
        }
    }

    let mut near = 0usize;
    for token in leftovers {
        if token.chars().count() < NEAR_TOKEN_MIN_LEN {
            continue;
        }
        let hit = (0..tokens_b.len()).find(|&j| {
            !used[j]
                && tokens_b[j].chars().count() >= NEAR_TOKEN_MIN_LEN
                && levenshtein(token, tokens_b[j]) <= 1
        });
        if let Some(j) = hit {
            used[j] = true;
            near += 1;
        }
    }

    let weighted = exact as f64 + NEAR_TOKEN_WEIGHT * near as f64;
    let ratio = weighted / tokens_a.len().max(tokens_b.len()) as f64;

    if ratio >= TOKEN_MIN_RATIO {
        let mut score = TOKEN_BASE + ratio * TOKEN_SPAN;
        if exact > near {
            score += TOKEN_EXACT_BONUS;
        }
        return Some(score.round().min(100.0) as u8);
    }

    // * Fallback: a single long shared token still carries signal
    let longest_shared = tokens_a
        .iter()
        .filter(|t| tokens_b.contains(t))
        .map(|t| t.chars().count())
        .max()?;

    if longest_shared >= SHARED_LONG_TOKEN_LEN {
        Some(SHARED_LONG_TOKEN_SCORE)
    } else if longest_shared >= SHARED_TOKEN_LEN {
        Some(SHARED_TOKEN_SCORE)
    } else {
        None
    }
}

/// Unit-cost Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // * Two rolling rows instead of the full matrix
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
