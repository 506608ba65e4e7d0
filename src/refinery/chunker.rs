// * Batch Segmenter
// * Splits one pasted blob into per-product segments. Boundaries come from
// * horizontal rules, markdown headings, "Product Name:" style labels, or a
// * brand line right after a blank line.

use crate::config::constants::{MIN_LINES_BETWEEN_BOUNDARIES, MIN_SEGMENT_CHARS};
use crate::refinery::metadata::find_brand;
use crate::refinery::regex_extractor::split_delimited;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:-{3,}|\*{3,}|_{3,}|={3,}|(?:- ){2,}-|(?:\* ){2,}\*)$").expect("Invalid rule regex")
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s+(.+?)\s*#*$").expect("Invalid heading regex"));

static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:product|item|model)\s*name\s*[:\-–]\s*(.+)$").expect("Invalid name label regex")
});

/// A contiguous span of input believed to describe one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub index: usize,
    pub text: String,
    /// Name captured from the boundary line, empty when the boundary carried none
    pub name: String,
    /// First line of the segment (inclusive)
    pub start_line: usize,
    /// Line after the segment (exclusive)
    pub end_line: usize,
}

impl Segment {
    /// A single segment spanning the whole input
    pub fn whole(text: &str) -> Self {
        Self {
            index: 0,
            text: text.to_string(),
            name: String::new(),
            start_line: 0,
            end_line: text.lines().count(),
        }
    }
}

enum Boundary {
    // * The boundary line is a separator and belongs to neither side
    Separator,
    // * The boundary line opens the next segment and may name it
    Opens(String),
}

fn boundary_signal(line: &str, after_blank: bool) -> Option<Boundary> {
    if HORIZONTAL_RULE.is_match(line) {
        return Some(Boundary::Separator);
    }
    if let Some(caps) = HEADING.captures(line) {
        return Some(Boundary::Opens(caps[1].trim().to_string()));
    }
    if let Some(caps) = NAME_LABEL.captures(line) {
        return Some(Boundary::Opens(caps[1].trim().to_string()));
    }
    if after_blank && find_brand(line).is_some() && split_delimited(line).is_none() {
        return Some(Boundary::Opens(line.to_string()));
    }
    None
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Detects per-product segments. An empty result means "no split": the
/// input should be treated as one product.
pub fn detect_product_boundaries(text: &str) -> Vec<Segment> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segments: Vec<Segment> = Vec::new();

    let close = |start: usize, end: usize, name: &str, segments: &mut Vec<Segment>| {
        if start >= end {
            return;
        }
        let body = lines[start..end].join("\n");
        if non_whitespace_len(&body) < MIN_SEGMENT_CHARS {
            return;
        }
        segments.push(Segment {
            index: segments.len(),
            text: body.trim().to_string(),
            name: name.to_string(),
            start_line: start,
            end_line: end,
        });
    };

    let mut start = 0usize;
    let mut name = String::new();
    let mut last_boundary: Option<usize> = None;
    let mut after_blank = true;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        let signal = if line.is_empty() { None } else { boundary_signal(line, after_blank) };

        if let Some(boundary) = signal {
            let far_enough = last_boundary.map_or(true, |b| i - b >= MIN_LINES_BETWEEN_BOUNDARIES);
            if far_enough {
                close(start, i, &name, &mut segments);
                match boundary {
                    Boundary::Separator => {
                        start = i + 1;
                        name.clear();
                    }
                    Boundary::Opens(captured) => {
                        start = i;
                        name = captured;
                    }
                }
                last_boundary = Some(i);
            }
        }

        after_blank = line.is_empty();
    }
    close(start, lines.len(), &name, &mut segments);

    if segments.len() < 2 {
        return Vec::new();
    }

    tracing::debug!(segments = segments.len(), "Product boundaries detected");
    segments
}
