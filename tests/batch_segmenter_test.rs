use spec_refinery::engine::Schema;
use spec_refinery::refinery::{detect_product_boundaries, parse_batch_products, ParseOptions};

// * Multi-product splitting and per-segment parsing

fn schema() -> Schema {
    Schema::new().with_category("Drones", ["Weight", "Flight Time"])
}

const TWO_DRONES: &str =
    "DJI Mini 4 Pro\nWeight: 249 g\nFlight Time: 34 min\n\nDJI Air 3\nWeight: 720 g\nFlight Time: 46 min";

#[test]
fn test_segments_cover_disjoint_line_ranges() {
    let segments = detect_product_boundaries(TWO_DRONES);
    assert_eq!(segments.len(), 2);
    assert!(segments[0].end_line <= segments[1].start_line);
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert!(segment.start_line < segment.end_line);
    }
}

#[test]
fn test_each_product_parsed_independently() {
    let items = parse_batch_products(TWO_DRONES, &schema(), &ParseOptions::default());
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].result.fields["Weight"].value, "249 g");
    assert_eq!(items[0].result.fields["Flight Time"].value, "34 min");
    assert_eq!(items[1].result.fields["Weight"].value, "720 g");
    assert_eq!(items[1].result.name, "DJI Air 3");

    // * Nothing leaks from the first product into the second
    assert_eq!(items[1].result.raw_extracted.len(), 2);
}

#[test]
fn test_single_product_returns_whole_input() {
    let text = "DJI Mini 4 Pro\nWeight: 249 g\nFlight Time: 34 min";
    let items = parse_batch_products(text, &schema(), &ParseOptions::default());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].segment.start_line, 0);
    assert_eq!(items[0].segment.end_line, 3);
    assert_eq!(items[0].result.fields.len(), 2);
}

#[test]
fn test_rule_separated_bundle_serializes() {
    let text = "Sony A7 IV\nWeight: 658 g\nFlight Time: none\n---\nCanon EOS R6\nWeight: 680 g\nFlight Time: none";
    let items = parse_batch_products(text, &schema(), &ParseOptions::default());
    assert_eq!(items.len(), 2);

    let json = serde_json::to_value(&items).unwrap();
    assert_eq!(json[1]["result"]["fields"]["Weight"]["value"], "680 g");
    assert_eq!(json[0]["segment"]["name"], "Sony A7 IV");
}
