use spec_refinery::acquisition::{acquire_or_empty, AcquisitionError, FileTextSource, TextSource};
use spec_refinery::engine::Schema;
use spec_refinery::refinery::{parse, ParseOptions, ParseResult};
use std::io::Write;

// * File acquisition feeding the parser

fn schema() -> Schema {
    Schema::new().with_category("Audio", ["Polar Pattern", "Weight"])
}

#[tokio::test]
async fn test_html_file_parses() {
    let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
    write!(
        file,
        "<h1>Rode NTG5 Microphone</h1><table><tr><th>Polar Pattern</th><td>Supercardioid</td></tr><tr><th>Weight</th><td>76 g</td></tr></table>"
    )
    .unwrap();

    let text = acquire_or_empty(&FileTextSource::new(file.path())).await;
    let result = parse(&text, &schema(), &ParseOptions::default());

    assert_eq!(result.fields["Polar Pattern"].value, "Supercardioid");
    assert_eq!(result.fields["Weight"].value, "76 g");
}

#[tokio::test]
async fn test_pdf_degrades_to_empty_result() {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.7").unwrap();

    let source = FileTextSource::new(file.path());
    assert!(matches!(source.acquire().await, Err(AcquisitionError::Unsupported(_))));

    let text = acquire_or_empty(&source).await;
    assert_eq!(parse(&text, &schema(), &ParseOptions::default()), ParseResult::default());
}

#[tokio::test]
async fn test_dyn_source() {
    let file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    std::fs::write(file.path(), "Polar Pattern: Cardioid\n").unwrap();

    let source: Box<dyn TextSource> = Box::new(FileTextSource::new(file.path()));
    assert!(source.describe().ends_with(".md"));
    assert_eq!(acquire_or_empty(source.as_ref()).await.trim(), "Polar Pattern: Cardioid");
}
