//! Hospital record sources.
//!
//! [`HospitalSource`] is the single boundary between the directory and its
//! backing store. Two implementations exist:
//! - [`LiveSource`]: the hosted record service over HTTP
//! - [`FallbackSource`]: an owned in-memory store seeded from bundled data
//!
//! Which one is used is decided once, by [`connect`].

mod envelope;
mod fallback;
mod live;

pub use envelope::*;
pub use fallback::*;
pub use live::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, DirectoryConfig};
use crate::directory::RegionGroups;
use crate::models::{Comment, FilterCriteria, Hospital, NewComment, NewHospital, StatsSummary};

/// Source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Hospital not found: {0}")]
    NotFound(String),

    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fallback store lock poisoned")]
    StorePoisoned,
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Which backend a source talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Live,
    Fallback,
}

/// Pagination metadata attached to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of the region-grouped listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub groups: RegionGroups,
    /// Present when the source reported pagination metadata
    pub meta: Option<PageMeta>,
}

/// Capability set every record source provides.
#[async_trait]
pub trait HospitalSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// One page of regions. Page 0 means every region.
    async fn list(&self, page: u32, page_size: u32) -> SourceResult<ListPage>;

    /// Aggregate statistics. Malformed payloads degrade to defaults.
    async fn stats(&self) -> SourceResult<StatsSummary>;

    /// Full, unpaginated search.
    async fn search(&self, criteria: &FilterCriteria) -> SourceResult<Vec<Hospital>>;

    async fn get_by_id(&self, id: &str) -> SourceResult<Hospital>;

    async fn create(&self, hospital: &NewHospital) -> SourceResult<Hospital>;

    /// Add a comment; it becomes the first (most recent) comment of the record.
    async fn add_comment(&self, id: &str, comment: &NewComment) -> SourceResult<Comment>;

    async fn update(&self, id: &str, hospital: &NewHospital) -> SourceResult<Hospital>;

    async fn delete(&self, id: &str) -> SourceResult<()>;
}

/// Build the source selected by `config.use_fallback`.
pub fn connect(config: &DirectoryConfig) -> SourceResult<Arc<dyn HospitalSource>> {
    config.validate()?;
    if config.use_fallback {
        tracing::info!("Using bundled fallback hospital data");
        Ok(Arc::new(FallbackSource::seeded()?))
    } else {
        tracing::info!("Using hospital record service at {}", config.base_url);
        Ok(Arc::new(LiveSource::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_selects_variant() {
        let source = connect(&DirectoryConfig::fallback()).unwrap();
        assert_eq!(source.kind(), SourceKind::Fallback);

        let source = connect(&DirectoryConfig::live("http://localhost:9")).unwrap();
        assert_eq!(source.kind(), SourceKind::Live);
    }

    #[test]
    fn test_connect_rejects_bad_config() {
        let result = connect(&DirectoryConfig::live("::nope::"));
        assert!(matches!(result, Err(SourceError::Config(_))));
    }
}
