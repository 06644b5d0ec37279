//! Sliding-window chunking of page text.
//!
//! Windows are measured in characters (Unicode scalar values):
//! - window `[start, start + size)`, then `start += size - overlap`
//! - the last window stops at end-of-text and may be shorter than `size`
//! - adjacent windows share exactly `overlap` characters
//!
//! Chunk ids are `{doc_id}_{offset}` where `offset` is the document-level
//! character position of the window start, so ids are stable across runs and
//! unique within a document. Pages chunked on their own without an offset are
//! told apart by page number.

use tracing::{debug, trace};

use crate::errors::RagError;
use crate::record::{Chunk, ChunkMetadata, PageRecord, PageRecordMetadata};

/// Fixed-size overlapping window splitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Creates a chunker.
    ///
    /// # Errors
    /// [`RagError::Config`] unless `size > 0` and `overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, RagError> {
        if size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if overlap >= size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into windows carrying `meta` forward.
    ///
    /// Returns no chunks when `text` is empty after trimming. Windows that
    /// contain only whitespace are skipped; `chunk_index` counts emitted chunks.
    ///
    /// Ids are `{doc_id}_{char_offset + start}`. A page past the first that has
    /// no `char_offset` gets `{doc_id}_p{page}_{start}`, so pages chunked one
    /// call at a time never share an id.
    pub fn chunk(&self, text: &str, meta: &PageRecordMetadata) -> Vec<Chunk> {
        let prefix = if meta.page_number > 1 && meta.char_offset == 0 {
            format!("{}_p{}", meta.doc_id, meta.page_number)
        } else {
            meta.doc_id.clone()
        };
        self.chunk_at(text, meta, &prefix, meta.char_offset, 0)
    }

    /// Chunks every page of a document.
    ///
    /// Each page starts at its `char_offset`, or right after the previous page
    /// when the offset is missing or would overlap it. `chunk_index` runs
    /// across the whole document.
    pub fn chunk_document(&self, pages: &[PageRecord]) -> Vec<Chunk> {
        let mut out = Vec::new();
        let mut next_free = 0usize;
        for page in pages {
            let offset = page.meta.char_offset.max(next_free);
            let chunks = self.chunk_at(&page.text, &page.meta, &page.meta.doc_id, offset, out.len());
            out.extend(chunks);
            next_free = offset + page.text.chars().count();
        }
        debug!(
            pages = pages.len(),
            chunks = out.len(),
            size = self.size,
            overlap = self.overlap,
            "document chunked"
        );
        out
    }

    fn chunk_at(
        &self,
        text: &str,
        meta: &PageRecordMetadata,
        id_prefix: &str,
        doc_offset: usize,
        first_index: usize,
    ) -> Vec<Chunk> {
        if text.trim().is_empty() {
            trace!(doc_id = %meta.doc_id, page = meta.page_number, "empty page text; no chunks");
            return Vec::new();
        }

        // Byte position of every char boundary, plus the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;
        let step = self.size - self.overlap;

        let mut out = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + self.size).min(len);
            let window = &text[bounds[start]..bounds[end]];

            if !window.trim().is_empty() {
                let char_start = doc_offset + start;
                out.push(Chunk {
                    id: format!("{id_prefix}_{char_start}"),
                    text: window.to_string(),
                    metadata: ChunkMetadata {
                        doc_id: meta.doc_id.clone(),
                        source_name: meta.source_name.clone(),
                        page_number: meta.page_number,
                        chunk_index: first_index + out.len(),
                        char_start,
                        char_end: doc_offset + end,
                    },
                });
            }

            if end == len {
                break;
            }
            start += step;
        }
        out
    }
}
