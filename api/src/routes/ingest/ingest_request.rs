use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Request payload for /ingest.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// PDF file or directory of PDFs. Relative paths that do not exist as
    /// given are looked up under the raw papers directory; omitted means the
    /// whole raw papers directory.
    #[serde(default)]
    pub path: Option<String>,
}

impl IngestRequest {
    pub fn resolve(&self, raw_dir: &Path) -> PathBuf {
        match self.path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            None => raw_dir.to_path_buf(),
            Some(p) => {
                let given = PathBuf::from(p);
                if given.is_absolute() || given.exists() {
                    given
                } else {
                    raw_dir.join(given)
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestedDocument {
    pub doc_id: String,
    pub source_path: String,
    pub pages: usize,
    /// `0` when the document had no extractable text.
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub documents: Vec<IngestedDocument>,
    pub total_chunks: usize,
}
