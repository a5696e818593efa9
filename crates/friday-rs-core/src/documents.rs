//! Study sources mapped into bounded reference documents.

use friday_rs_protocol::{DocumentMetadata, DocumentRef, StudySource};

/// Build request documents from study sources, preserving order.
///
/// Text is cut to `max_chars` characters. Titles default to `Source {index}`
/// and origins to an empty string. `max_documents` keeps only the first N.
pub fn build_documents(
    sources: &[StudySource],
    max_chars: usize,
    max_documents: Option<usize>,
) -> Vec<DocumentRef> {
    let limit = max_documents.unwrap_or(usize::MAX);
    sources
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, source)| DocumentRef {
            id: index.to_string(),
            text: truncate_chars(&source.content, max_chars),
            metadata: DocumentMetadata {
                title: non_empty(source.title.as_deref())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Source {index}")),
                origin: non_empty(source.origin.as_deref())
                    .unwrap_or_default()
                    .to_string(),
            },
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
