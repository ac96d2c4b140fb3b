/// Build the generation prompt from ranked documents and the user query.
///
/// Documents are joined with a blank line, best match first.
#[must_use]
pub fn build_prompt(documents: &[String], query: &str) -> String {
    let context = documents.join("\n\n");
    format!(
        "Context:\n{context}\n\nUser Query: {query}\n\nAnswer concisely and cite which retrieved docs you used."
    )
}
