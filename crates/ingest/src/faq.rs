//! Conversion of the FAQ knowledge-base export into question/answer records.
//!
//! Each exported entry keeps its question and answer inside a single
//! `content` field (`"Question: ...\nAnswer: ..."`). Splitting them lets the
//! CSV loader pick up the `question` + `answer` columns directly.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

static QUESTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Question:\s*(.*?)\n").expect("valid question regex"));
static ANSWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Answer:\s*(.*)").expect("valid answer regex"));

/// Column order of the split CSV export.
pub const SPLIT_FAQ_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "question",
    "answer",
    "category",
    "type",
    "difficulty",
    "audience",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqMetadata {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

/// One entry of the raw FAQ export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub metadata: Option<FaqMetadata>,
}

/// A FAQ entry with question and answer pulled apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitFaqRecord {
    pub id: Value,
    pub title: Option<String>,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub audience: String,
}

/// Extract `(question, answer)` from a `content` field; absent parts are empty.
#[must_use]
pub fn split_content(content: &str) -> (String, String) {
    let capture = |re: &Regex| {
        re.captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };
    (capture(&QUESTION_RE), capture(&ANSWER_RE))
}

impl From<FaqEntry> for SplitFaqRecord {
    fn from(entry: FaqEntry) -> Self {
        let (question, answer) = split_content(entry.content.as_deref().unwrap_or_default());
        let metadata = entry.metadata.unwrap_or_default();
        Self {
            id: entry.id,
            title: entry.title,
            question,
            answer,
            category: entry.category,
            kind: metadata.kind.unwrap_or_default(),
            difficulty: metadata.difficulty.unwrap_or_default(),
            audience: metadata.audience.unwrap_or_default(),
        }
    }
}

impl SplitFaqRecord {
    fn csv_row(&self) -> [String; 8] {
        let id = match &self.id {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        [
            id,
            self.title.clone().unwrap_or_default(),
            self.question.clone(),
            self.answer.clone(),
            self.category.clone().unwrap_or_default(),
            self.kind.clone(),
            self.difficulty.clone(),
            self.audience.clone(),
        ]
    }
}

/// Parse a FAQ export (a JSON array of entries) and split every entry.
pub fn split_faq_json(raw: &str) -> Result<Vec<SplitFaqRecord>> {
    let entries: Vec<FaqEntry> = serde_json::from_str(raw)?;
    Ok(entries.into_iter().map(SplitFaqRecord::from).collect())
}

/// Write records as pretty-printed JSON, non-ASCII text kept verbatim.
pub fn write_split_json(records: &[SplitFaqRecord], path: impl AsRef<Path>) -> Result<()> {
    let body = serde_json::to_string_pretty(records)?;
    std::fs::write(path, body)?;
    Ok(())
}

/// Write records as CSV with a [`SPLIT_FAQ_COLUMNS`] header.
pub fn write_split_csv(records: &[SplitFaqRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(SPLIT_FAQ_COLUMNS)?;
    for record in records {
        writer.write_record(record.csv_row())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a FAQ export from `input` and write the split JSON (and optionally CSV).
pub fn convert_faq_file(
    input: impl AsRef<Path>,
    json_out: impl AsRef<Path>,
    csv_out: Option<&Path>,
) -> Result<usize> {
    let raw = std::fs::read_to_string(input.as_ref())?;
    let records = split_faq_json(&raw)?;
    write_split_json(&records, json_out.as_ref())?;
    if let Some(csv_out) = csv_out {
        write_split_csv(&records, csv_out)?;
    }
    log::info!(
        "Split {} FAQ entries from {}",
        records.len(),
        input.as_ref().display()
    );
    Ok(records.len())
}
