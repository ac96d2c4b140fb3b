use quickrag_ingest::faq::{convert_faq_file, SPLIT_FAQ_COLUMNS};
use quickrag_ingest::{load_csv_documents, Chunker, ChunkingConfig};
use std::fs;
use tempfile::tempdir;

const EXPORT: &str = r#"[
  {
    "id": 1,
    "title": "Password reset",
    "content": "Question: How do I reset my password?\nAnswer: Use the 'Forgot password' link, then check your inbox.",
    "category": "account",
    "metadata": { "type": "faq", "difficulty": "easy", "audience": "user" }
  },
  {
    "id": 2,
    "title": "Refunds",
    "content": "Question: When are refunds issued?\nAnswer: Within five business days, to the original payment method.",
    "category": "billing",
    "metadata": { "type": "faq", "difficulty": "medium", "audience": "user" }
  }
]"#;

#[test]
fn split_export_feeds_the_csv_loader() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("faq.json");
    let json_out = dir.path().join("faq_split.json");
    let csv_out = dir.path().join("faq_split.csv");
    fs::write(&input, EXPORT).unwrap();

    let count = convert_faq_file(&input, &json_out, Some(csv_out.as_path())).unwrap();
    assert_eq!(count, 2);

    let header = fs::read_to_string(&csv_out).unwrap();
    let first_line = header.lines().next().unwrap();
    assert_eq!(first_line, SPLIT_FAQ_COLUMNS.join(","));

    let split: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    assert_eq!(split[1]["question"], "When are refunds issued?");
    assert_eq!(split[1]["type"], "faq");

    // No `text`/`content` column in the split CSV, so question + answer is used.
    let docs = load_csv_documents(&csv_out, None).unwrap();
    assert_eq!(
        docs[0],
        "How do I reset my password?\n\nUse the 'Forgot password' link, then check your inbox."
    );
    assert_eq!(docs.len(), 2);
}

#[test]
fn long_rows_are_windowed_after_loading() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docs.csv");
    let long = "x".repeat(2_500);
    fs::write(&path, format!("text\nshort one\n{long}\nlast\n")).unwrap();

    let docs = load_csv_documents(&path, None).unwrap();
    let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
    let chunks = chunker.chunk_all(docs);

    let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    assert_eq!(sizes, vec![9, 1_000, 1_000, 500, 4]);
    assert_eq!(chunks.first().unwrap(), "short one");
    assert_eq!(chunks.last().unwrap(), "last");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_csv_documents(dir.path().join("absent.csv"), None).unwrap_err();
    assert!(matches!(err, quickrag_ingest::IngestError::Io(_)));
}
