//! Content reader: turns a stored document into text, never failing.

use tracing::warn;

use docmerge_shared::Document;

use crate::DocumentStore;

/// Read a document's textual content.
///
/// - Markdown and plain text are decoded as UTF-8 (a leading BOM is dropped).
/// - Word formats have no text extraction; their stem stands in for content.
/// - Missing, unreadable, or undecodable files yield an empty string and a warning.
pub fn read_content(store: &dyn DocumentStore, document: &Document) -> String {
    if !document.format.is_textual() {
        return document.name.clone();
    }

    let bytes = match store.read_bytes(&document.relative_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %document.relative_path, error = %e, "cannot read document, treating as empty");
            return String::new();
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        },
        Err(e) => {
            warn!(path = %document.relative_path, error = %e, "document is not valid UTF-8, treating as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn doc(path: &str) -> Document {
        Document::from_relative(path).unwrap()
    }

    #[test]
    fn reads_markdown_and_text() {
        let store = MemoryStore::new()
            .with_file("a.md", "# 标题\n正文")
            .with_file("b.txt", "plain");
        assert_eq!(read_content(&store, &doc("a.md")), "# 标题\n正文");
        assert_eq!(read_content(&store, &doc("b.txt")), "plain");
    }

    #[test]
    fn strips_bom() {
        let store = MemoryStore::new().with_file("a.md", "\u{feff}hello");
        assert_eq!(read_content(&store, &doc("a.md")), "hello");
    }

    #[test]
    fn word_documents_use_name_placeholder() {
        let store = MemoryStore::new().with_bytes("reports/预算报告.docx", vec![0x50, 0x4b, 0x03]);
        assert_eq!(
            read_content(&store, &doc("reports/预算报告.docx")),
            "预算报告"
        );
        // No read is needed for the placeholder, so even a missing file works.
        let empty = MemoryStore::new();
        assert_eq!(read_content(&empty, &doc("legacy.doc")), "legacy");
    }

    #[test]
    fn failures_degrade_to_empty() {
        let store = MemoryStore::new()
            .with_unreadable("locked.md")
            .with_bytes("binary.md", vec![0xff, 0xfe, 0x00, 0xc3]);
        assert_eq!(read_content(&store, &doc("locked.md")), "");
        assert_eq!(read_content(&store, &doc("binary.md")), "");
        assert_eq!(read_content(&store, &doc("missing.md")), "");
    }
}
