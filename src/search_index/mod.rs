//! Search index access
//!
//! This module defines the full-text search collaborator the title lookups
//! run against, and its Elasticsearch implementation.

mod elasticsearch;
mod elasticsearch_types;

pub use elasticsearch::ElasticsearchIndex;

use crate::TitleType;
use crate::metadata_retrieval::TitleDetails;
use crate::scoring::SearchHit;
use thiserror::Error;

/// Errors that can occur while querying the search index
#[derive(Debug, Error)]
pub enum SearchIndexError {
    /// The index could not be reached or the request failed in transit
    #[error("Search request failed: {0}")]
    RequestError(String),

    /// The index answered with a non-success status
    #[error("Search index answered HTTP {status}: {details}")]
    BackendResponse { status: u16, details: String },

    /// Failed to parse the index response
    #[error("Failed to parse search response: {0}")]
    ParseError(String),

    /// A hit lacks the identifier or score every title hit must carry
    #[error("Malformed search hit at position {position}: {reason}")]
    MalformedHit { position: usize, reason: String },
}

/// Trait for full-text indexes holding title records.
///
/// Indexes are named `imdb-{type}*`, one family per [`TitleType`].
pub trait SearchIndex {
    /// Returns the cluster information document.
    fn info(&self) -> Result<serde_json::Value, SearchIndexError>;

    /// Checks that the index answers at all.
    fn ping(&self) -> Result<(), SearchIndexError> {
        self.info().map(|_| ())
    }

    /// Runs a free-text title query.
    ///
    /// # Arguments
    ///
    /// * `title_type` - Which index family to search
    /// * `query` - Query string in the index's query-string syntax
    /// * `year` - Optional release year boosting matching titles
    ///
    /// # Returns
    ///
    /// Every hit with its IMDb id and score, in index order. The same id may
    /// appear several times.
    fn search_titles(
        &self,
        title_type: TitleType,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchIndexError>;

    /// Fetches the primary record stored for an IMDb id, if any.
    fn primary_record(
        &self,
        title_type: TitleType,
        imdb_id: &str,
    ) -> Result<Option<TitleDetails>, SearchIndexError>;
}

/// Index pattern covering all indexes of a title type
pub(crate) fn index_pattern(title_type: TitleType) -> String {
    format!("imdb-{}*", title_type.as_str())
}
