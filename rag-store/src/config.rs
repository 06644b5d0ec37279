//! Index backend configuration.

use std::path::PathBuf;

use crate::errors::RagError;

/// Distance function used for the Qdrant vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (the local index always uses cosine).
    Cosine,
    Dot,
    Euclid,
}

/// Qdrant connection and collection settings.
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    /// gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    pub collection: String,
    pub distance: DistanceKind,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl QdrantConfig {
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            exact_search: false,
        }
    }
}

/// Which vector index to open.
#[derive(Clone, Debug)]
pub enum IndexConfig {
    /// File-backed index stored under a directory.
    Local { path: PathBuf },
    Qdrant(QdrantConfig),
}

impl IndexConfig {
    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        match self {
            IndexConfig::Local { path } => {
                if path.as_os_str().is_empty() {
                    return Err(RagError::Config("index path is empty".into()));
                }
            }
            IndexConfig::Qdrant(q) => {
                if q.url.trim().is_empty() {
                    return Err(RagError::Config("qdrant url is empty".into()));
                }
                if q.collection.trim().is_empty() {
                    return Err(RagError::Config("qdrant collection is empty".into()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_rejected() {
        assert!(IndexConfig::Local { path: PathBuf::new() }.validate().is_err());
        assert!(IndexConfig::Qdrant(QdrantConfig::new_default("", "papers")).validate().is_err());
        assert!(IndexConfig::Qdrant(QdrantConfig::new_default("http://localhost:6334", " ")).validate().is_err());
        assert!(IndexConfig::Local { path: "data/vector_store".into() }.validate().is_ok());
    }
}
