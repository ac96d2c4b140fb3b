use crate::error::{IngestError, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

/// Which column(s) of a table become the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumns {
    /// A single `text` column
    Text(usize),
    /// `title` and `content`, joined by a blank line
    TitleContent { title: usize, content: usize },
    /// A single `content` column
    Content(usize),
    /// `question` and `answer`, joined by a blank line
    QuestionAnswer { question: usize, answer: usize },
}

impl TextColumns {
    /// Pick text columns from a header row.
    ///
    /// Preference order: `text`, `title`+`content`, `content`,
    /// `question`+`answer`. Header names are matched exactly.
    pub fn detect(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        if let Some(text) = find("text") {
            return Ok(Self::Text(text));
        }
        if let (Some(title), Some(content)) = (find("title"), find("content")) {
            return Ok(Self::TitleContent { title, content });
        }
        if let Some(content) = find("content") {
            return Ok(Self::Content(content));
        }
        if let (Some(question), Some(answer)) = (find("question"), find("answer")) {
            return Ok(Self::QuestionAnswer { question, answer });
        }

        Err(IngestError::NoTextColumn {
            columns: headers.iter().map(str::to_string).collect(),
        })
    }

    /// Flatten one row; missing cells count as empty.
    #[must_use]
    pub fn flatten(&self, record: &StringRecord) -> String {
        let cell = |idx: usize| record.get(idx).unwrap_or_default();
        match *self {
            Self::Text(idx) | Self::Content(idx) => cell(idx).to_string(),
            Self::TitleContent { title, content } => {
                format!("{}\n\n{}", cell(title), cell(content))
            }
            Self::QuestionAnswer { question, answer } => {
                format!("{}\n\n{}", cell(question), cell(answer))
            }
        }
    }
}

/// Load one document per row from a CSV file.
///
/// `max_docs` keeps only the first rows, which is handy for quick trial runs.
pub fn load_csv_documents(path: impl AsRef<Path>, max_docs: Option<usize>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let documents = read_csv_documents(file, max_docs)?;
    log::info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

/// Like [`load_csv_documents`], reading from any source.
pub fn read_csv_documents(source: impl Read, max_docs: Option<usize>) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let columns = TextColumns::detect(reader.headers()?)?;
    log::debug!("Using text columns {columns:?}");

    let limit = max_docs.unwrap_or(usize::MAX);
    let mut documents = Vec::new();
    for record in reader.records().take(limit) {
        documents.push(columns.flatten(&record?));
    }
    Ok(documents)
}
