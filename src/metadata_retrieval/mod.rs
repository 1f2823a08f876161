/// Data structures and traits for title and episode metadata retrieval.
///
/// This module provides the season and episode shapes used by the episode
/// locator, as well as the provider trait implemented by TMDB and by the
/// caching wrapper.
mod cached;
mod tmdb;
mod tmdb_types;

pub use cached::CachedMetadataProvider;
pub use tmdb::TmdbProvider;

use crate::TitleType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The requested resource does not exist at the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API returned invalid or unexpected data
    #[error("API returned invalid data: {0}")]
    InvalidData(String),
}

/// Season summary as listed on a series record.
///
/// Season number 0 holds the specials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// The season number
    pub season_number: u32,
    /// Number of episodes aired in this season
    pub episode_count: u32,
}

impl Season {
    pub fn new(season_number: u32, episode_count: u32) -> Self {
        Self {
            season_number,
            episode_count,
        }
    }

    /// Whether this is the specials pseudo-season
    pub fn is_specials(&self) -> bool {
        self.season_number == 0
    }
}

/// Episode metadata exactly as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeMetadata(pub serde_json::Value);

/// A title record (movie or series) as returned by a provider or index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleDetails(pub serde_json::Value);

/// Trait for metadata providers that can fetch title and episode information.
///
/// Implementors are passed explicitly into the lookup functions, so tests can
/// substitute fakes and callers decide whether responses are cached.
pub trait MetadataProvider {
    /// Resolves an IMDb id to the provider's own identifier.
    ///
    /// Returns `Ok(None)` when the provider knows no title of the given type
    /// for this IMDb id.
    fn find_by_imdb_id(
        &self,
        imdb_id: &str,
        title_type: TitleType,
    ) -> Result<Option<u64>, MetadataRetrievalError>;

    /// Fetches the full title record for a provider identifier.
    fn fetch_title(
        &self,
        title_type: TitleType,
        id: u64,
    ) -> Result<TitleDetails, MetadataRetrievalError>;

    /// Fetches the season list of a series, including specials.
    fn fetch_seasons(&self, series_id: u64) -> Result<Vec<Season>, MetadataRetrievalError>;

    /// Fetches a single episode.
    ///
    /// # Arguments
    ///
    /// * `series_id` - Provider identifier of the series
    /// * `season_number` - Season to query
    /// * `episode_number` - Episode number passed to the provider as is
    fn fetch_episode(
        &self,
        series_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<EpisodeMetadata, MetadataRetrievalError>;
}
