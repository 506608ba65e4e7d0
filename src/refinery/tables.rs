// * Table & Definition-List Flattening
// * Spec sheets are overwhelmingly published as <table> or <dl> markup.
// * Each row is flattened to a single `key\tvalue` line so the pair
// * extractor can treat it like any other delimited line.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static SELECTOR_TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("Invalid tr selector"));
static SELECTOR_DT_DD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt, dd").expect("Invalid dt/dd selector"));

/// Collapses all descendant text of an element to single-spaced form
pub fn element_text(element: &ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

// * True when `element`'s closest ancestor named `tag` is `container`
fn owned_by(element: &ElementRef, container: &ElementRef, tag: &str) -> bool {
    element
        .ancestors()
        .find(|n| n.value().as_element().is_some_and(|e| e.name() == tag))
        .is_some_and(|n| n.id() == container.id())
}

/// Flattens one row's cells: a single cell stands alone, otherwise
/// `first\trest, joined, by, commas`.
pub fn flatten_row(cells: &[String]) -> Option<String> {
    let cells: Vec<&str> = cells.iter().map(|c| c.as_str()).filter(|c| !c.is_empty()).collect();
    match cells.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        [key, values @ ..] => Some(format!("{}\t{}", key, values.join(", "))),
    }
}

/// Renders a `<table>` as one line per row. Rows belonging to nested
/// tables are left to the nested table's own cell text.
pub fn flatten_table(table: &ElementRef) -> Vec<String> {
    table
        .select(&SELECTOR_TR)
        .filter(|row| owned_by(row, table, "table"))
        .filter_map(|row| {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| element_text(&cell))
                .collect();
            flatten_row(&cells)
        })
        .collect()
}

/// Renders a `<dl>`: every `<dt>` followed by its `<dd>` values.
/// Consecutive `<dd>`s under one term are joined; an orphan `<dd>` stands alone.
pub fn flatten_definition_list(list: &ElementRef) -> Vec<String> {
    let mut lines = Vec::new();
    let mut term: Option<String> = None;
    let mut values: Vec<String> = Vec::new();

    let flush = |term: &mut Option<String>, values: &mut Vec<String>, lines: &mut Vec<String>| {
        let mut cells: Vec<String> = term.take().into_iter().collect();
        cells.append(values);
        if let Some(line) = flatten_row(&cells) {
            lines.push(line);
        }
    };

    for item in list.select(&SELECTOR_DT_DD).filter(|e| owned_by(e, list, "dl")) {
        let text = element_text(&item);
        if item.value().name() == "dt" {
            flush(&mut term, &mut values, &mut lines);
            term = Some(text);
        } else if !text.is_empty() {
            values.push(text);
        }
    }
    flush(&mut term, &mut values, &mut lines);

    lines
}
