// * Text Normalizer
// * Turns pasted HTML or plain text into clean, line-oriented text:
// * non-text elements dropped, tables/definition lists flattened to
// * `key\tvalue` lines, block boundaries kept as newlines, entities decoded.

use crate::refinery::tables::{flatten_definition_list, flatten_table};
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;
use std::sync::LazyLock;

// * Elements whose entire subtree carries no spec text
const REMOVED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "img", "picture", "svg", "canvas",
    "video", "audio", "iframe", "object", "embed", "nav", "form", "button", "select", "input",
    "textarea",
];

// * Elements whose end marks a line break
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "li", "ul", "ol",
    "h1", "h2", "h3", "h4", "h5", "h6", "tr", "blockquote", "pre", "figure", "figcaption",
    "address", "details", "summary", "caption", "body", "html",
];

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z/!][^>]*>").expect("Invalid tag regex"));

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,7});")
        .expect("Invalid entity regex")
});

static TAB_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\t[ \t]*").expect("Invalid tab regex"));

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \u{a0}\u{2009}\u{202f}\r\x0c\x0b]+").expect("Invalid space regex"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank-line regex"));

static NAMED_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("amp", "&"),
        ("lt", "<"),
        ("gt", ">"),
        ("quot", "\""),
        ("apos", "'"),
        ("nbsp", " "),
        ("ensp", " "),
        ("emsp", " "),
        ("thinsp", " "),
        ("ndash", "–"),
        ("mdash", "—"),
        ("minus", "−"),
        ("hellip", "…"),
        ("lsquo", "‘"),
        ("rsquo", "’"),
        ("ldquo", "“"),
        ("rdquo", "”"),
        ("laquo", "«"),
        ("raquo", "»"),
        ("bull", "•"),
        ("middot", "·"),
        ("copy", "©"),
        ("reg", "®"),
        ("trade", "™"),
        ("deg", "°"),
        ("times", "×"),
        ("divide", "÷"),
        ("plusmn", "±"),
        ("micro", "µ"),
        ("frac12", "½"),
        ("frac14", "¼"),
        ("frac34", "¾"),
        ("sup2", "²"),
        ("sup3", "³"),
        ("prime", "′"),
        ("Prime", "″"),
        ("euro", "€"),
        ("pound", "£"),
        ("yen", "¥"),
        ("cent", "¢"),
        ("check", "✓"),
        ("cross", "✗"),
    ])
});

/// Cleans pasted input into normalized, line-oriented text. Never panics;
/// empty input yields an empty string.
///
/// # Example
/// ```
/// use spec_refinery::refinery::content_cleaner::clean_input_text;
///
/// let text = clean_input_text("<table><tr><td>Weight</td><td>2kg</td></tr></table>");
/// assert_eq!(text, "Weight\t2kg");
/// ```
pub fn clean_input_text(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let raw = if TAG_PATTERN.is_match(input) {
        render_html(input)
    } else {
        decode_entities(input)
    };

    tidy_lines(&raw)
}

/// Decodes named and numeric character references; unknown ones are kept verbatim
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from)
            } else {
                NAMED_ENTITIES.get(body).map(|s| s.to_string())
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn render_html(html: &str) -> String {
    // * html5ever decodes entities inside text nodes while parsing
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);
    walk(document.root_element(), &mut out);
    out
}

fn walk(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if REMOVED_TAGS.contains(&name) {
        return;
    }

    match name {
        "br" => {
            out.push('\n');
            return;
        }
        // * Rules and headings keep markdown markers so batch input can still be split
        "hr" => {
            start_line(out);
            out.push_str("---\n");
            return;
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            start_line(out);
            let level = name[1..].parse::<usize>().unwrap_or(1);
            out.push_str(&"#".repeat(level));
            out.push(' ');
        }
        "table" => {
            push_lines(out, flatten_table(&element));
            return;
        }
        "dl" => {
            push_lines(out, flatten_definition_list(&element));
            return;
        }
        _ => {}
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    walk(child, out);
                }
            }
            _ => {}
        }
    }

    if BLOCK_TAGS.contains(&name) {
        out.push('\n');
    }
}

fn start_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_lines(out: &mut String, lines: Vec<String>) {
    out.push('\n');
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

// * Inline text keeps a single separating space; layout whitespace is discarded
fn push_text(out: &mut String, text: &str) {
    let starts_with_space = text.starts_with(char::is_whitespace);
    let ends_with_space = text.ends_with(char::is_whitespace);
    let words: Vec<&str> = text.split_whitespace().collect();

    let needs_gap = |out: &String| !out.is_empty() && !out.ends_with(char::is_whitespace);

    if words.is_empty() {
        if needs_gap(out) {
            out.push(' ');
        }
        return;
    }
    if starts_with_space && needs_gap(out) {
        out.push(' ');
    }
    out.push_str(&words.join(" "));
    if ends_with_space {
        out.push(' ');
    }
}

fn tidy_lines(raw: &str) -> String {
    let lines: Vec<String> = raw
        .replace("\r\n", "\n")
        .split('\n')
        .map(|line| {
            let line = TAB_RUN.replace_all(line, "\t");
            let line = SPACE_RUN.replace_all(&line, " ");
            line.trim().to_string()
        })
        .collect();

    let joined = lines.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}
