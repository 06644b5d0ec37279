//! PDF page loading.
//!
//! Extraction runs on a blocking thread; each page becomes one [`PageRecord`]
//! with a 1-based page number and its character offset in the document.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::RagError;
use crate::record::{PageRecord, PageRecordMetadata};

/// All pages of one loaded file.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub doc_id: String,
    pub path: PathBuf,
    pub pages: Vec<PageRecord>,
}

/// Loads one PDF into page records.
///
/// `doc_id` is the file stem and `source_name` the file name. Pages with no
/// extractable text are kept (they simply produce no chunks).
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<LoadedDocument, RagError> {
    let path = path.as_ref().to_path_buf();
    let (doc_id, source_name) = names_for(&path)?;

    let bytes = tokio::fs::read(&path).await?;
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await
        .map_err(|e| RagError::Pdf(format!("extraction task failed: {e}")))?
        .map_err(|e| RagError::Pdf(format!("{}: {e}", path.display())))?;

    let records = pages_to_records(&doc_id, &source_name, pages);
    let empty = records.iter().filter(|p| p.text.trim().is_empty()).count();
    if empty > 0 {
        warn!(%doc_id, empty_pages = empty, "pages without extractable text");
    }
    info!(%doc_id, pages = records.len(), "pdf loaded");

    Ok(LoadedDocument {
        doc_id,
        path,
        pages: records,
    })
}

/// Loads every `*.pdf` directly inside `dir`, sorted by file name.
pub async fn load_pdfs_from_dir(dir: impl AsRef<Path>) -> Result<Vec<LoadedDocument>, RagError> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_pdf(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(dir = %dir.display(), files = paths.len(), "pdf files discovered");

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        docs.push(load_pdf(&path).await?);
    }
    Ok(docs)
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn names_for(path: &Path) -> Result<(String, String), RagError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RagError::InvalidInput(format!("not a file path: {}", path.display())))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(stem);
    Ok((stem.to_string(), name.to_string()))
}

fn pages_to_records(doc_id: &str, source_name: &str, pages: Vec<String>) -> Vec<PageRecord> {
    let mut offset = 0usize;
    pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let record = PageRecord {
                meta: PageRecordMetadata {
                    doc_id: doc_id.to_string(),
                    source_name: source_name.to_string(),
                    page_number: i as u32 + 1,
                    char_offset: offset,
                },
                text,
            };
            offset += record.text.chars().count();
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets_accumulate_in_characters() {
        let pages = vec!["αβ".to_string(), "".to_string(), "xyz".to_string()];
        let records = pages_to_records("paper", "paper.pdf", pages);
        let numbers: Vec<_> = records.iter().map(|r| r.meta.page_number).collect();
        let offsets: Vec<_> = records.iter().map(|r| r.meta.char_offset).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(offsets, vec![0, 2, 2]);
    }

    #[test]
    fn names_come_from_the_file() {
        let (id, name) = names_for(Path::new("/data/raw/2302.13971v1.pdf")).unwrap();
        assert_eq!(id, "2302.13971v1");
        assert_eq!(name, "2302.13971v1.pdf");
    }

    #[tokio::test]
    async fn directory_scan_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a pdf").unwrap();
        let docs = load_pdfs_from_dir(dir.path()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn garbage_pdf_is_a_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        assert!(matches!(load_pdf(&path).await, Err(RagError::Pdf(_))));
    }
}
