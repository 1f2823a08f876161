//! titlehound - Title metadata lookups
//!
//! This library ranks full-text search hits for movie and tv titles and
//! locates tv episodes addressed by their absolute, series-wide number.
//! Search index and metadata provider are passed in explicitly, so every
//! lookup can run against real clients, cached clients or test fakes.

mod cache;
mod config;
mod episode_locator;
mod metadata_retrieval;
mod scoring;
mod search_index;
mod title_parser;

pub use cache::{CacheError, CacheStorage};
pub use config::{ConfigError, Settings};
pub use episode_locator::{
    EpisodeLocation, INFER_SEASON_SENTINEL, LocatedEpisode, SEASON_WINDOW, SeasonRequest,
    locate_and_fetch, resolve_season,
};
pub use metadata_retrieval::{
    CachedMetadataProvider, EpisodeMetadata, MetadataProvider, MetadataRetrievalError, Season,
    TitleDetails, TmdbProvider,
};
pub use scoring::{RankedScores, SearchHit, aggregate};
pub use search_index::{ElasticsearchIndex, SearchIndex, SearchIndexError};
pub use title_parser::{
    NormalizedTitle, TitleNormalizer, TorrentParser, normalizer, normalizer_names,
};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Kind of title a lookup is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Tv,
    Movie,
}

impl TitleType {
    /// Lowercase name as used in index patterns and provider paths
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleType::Tv => "tv",
            TitleType::Movie => "movie",
        }
    }
}

/// Errors reported by the lookup operations
///
/// The three variants separate caller mistakes, dependency outages and
/// legitimately empty answers.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The input broke a contract before any external call was made
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// A dependency failed to answer
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Nothing matched the request
    #[error("No match: {0}")]
    NotFound(String),
}

impl From<SearchIndexError> for LookupError {
    fn from(error: SearchIndexError) -> Self {
        match error {
            SearchIndexError::MalformedHit { .. } => {
                LookupError::PreconditionViolation(error.to_string())
            }
            _ => LookupError::UpstreamUnavailable(error.to_string()),
        }
    }
}

/// Maps a provider failure, keeping the provider's own "not found" apart
fn provider_error(context: &str, error: MetadataRetrievalError) -> LookupError {
    match error {
        MetadataRetrievalError::NotFound(_) => {
            LookupError::NotFound(format!("{context}: {error}"))
        }
        _ => LookupError::UpstreamUnavailable(format!("{context}: {error}")),
    }
}

/// Fails fast when the search index does not answer
fn ensure_reachable<I: SearchIndex + ?Sized>(index: &I) -> Result<(), LookupError> {
    index.ping().map_err(|e| {
        LookupError::UpstreamUnavailable(format!("search index is unreachable: {e}"))
    })
}

/// Returns the search cluster's information document
pub fn search_index_info<I: SearchIndex + ?Sized>(
    index: &I,
) -> Result<serde_json::Value, LookupError> {
    index.info().map_err(|e| {
        LookupError::UpstreamUnavailable(format!("search index is unreachable: {e}"))
    })
}

/// Searches titles and ranks them by their best score
///
/// # Arguments
///
/// * `index` - Search index to query
/// * `title_type` - Movie or tv index family
/// * `query` - Free-text query
/// * `year` - Optional release year, an empty string counts as absent
///
/// # Returns
///
/// IMDb ids mapped to their best score, best first. No hit yields an empty
/// ranking.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use titlehound::{ElasticsearchIndex, TitleType, lookup_titles};
///
/// let index = ElasticsearchIndex::new("http://localhost:9200", Duration::from_secs(10)).unwrap();
/// let ranked = lookup_titles(&index, TitleType::Movie, "heat", Some("1995")).unwrap();
/// for (imdb_id, score) in ranked.iter() {
///     println!("{imdb_id}: {score}");
/// }
/// ```
pub fn lookup_titles<I: SearchIndex + ?Sized>(
    index: &I,
    title_type: TitleType,
    query: &str,
    year: Option<&str>,
) -> Result<RankedScores, LookupError> {
    ensure_reachable(index)?;

    let hits = index.search_titles(title_type, query, year)?;
    debug!(query, hits = hits.len(), "search finished");

    Ok(aggregate(&hits))
}

/// Fetches the primary search-index record of an IMDb id
pub fn title_detail<I: SearchIndex + ?Sized>(
    index: &I,
    title_type: TitleType,
    imdb_id: &str,
) -> Result<TitleDetails, LookupError> {
    ensure_reachable(index)?;

    index
        .primary_record(title_type, imdb_id)?
        .ok_or_else(|| LookupError::NotFound(format!("No match found using imdbId {imdb_id}.")))
}

/// Resolves an IMDb id at the provider, failing with `NotFound` when unknown
fn provider_id<P: MetadataProvider + ?Sized>(
    provider: &P,
    imdb_id: &str,
    title_type: TitleType,
) -> Result<u64, LookupError> {
    provider
        .find_by_imdb_id(imdb_id, title_type)
        .map_err(|e| provider_error(&format!("looking up imdbId {imdb_id}"), e))?
        .ok_or_else(|| LookupError::NotFound(format!("No match found with imdbId {imdb_id}.")))
}

/// Fetches the provider's title record for an IMDb id
pub fn provider_title_detail<P: MetadataProvider + ?Sized>(
    provider: &P,
    title_type: TitleType,
    imdb_id: &str,
) -> Result<TitleDetails, LookupError> {
    let id = provider_id(provider, imdb_id, title_type)?;

    provider
        .fetch_title(title_type, id)
        .map_err(|e| provider_error(&format!("fetching {} {id}", title_type.as_str()), e))
}

/// Finds an episode of the series with the given IMDb id
///
/// # Arguments
///
/// * `provider` - Metadata provider to query
/// * `imdb_id` - IMDb id of the series
/// * `season` - Season to start at, or [`SeasonRequest::Infer`]
/// * `episode` - Absolute episode number
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use titlehound::{SeasonRequest, TmdbProvider, find_episode};
///
/// let tmdb = TmdbProvider::new("api-key", "fr", Duration::from_secs(10)).unwrap();
/// let season = SeasonRequest::from_raw(-1).unwrap();
/// let located = find_episode(&tmdb, "tt0903747", season, 14).unwrap();
/// println!("season {}", located.location.season_number);
/// ```
pub fn find_episode<P: MetadataProvider + ?Sized>(
    provider: &P,
    imdb_id: &str,
    season: SeasonRequest,
    episode: u32,
) -> Result<LocatedEpisode, LookupError> {
    let series_id = provider_id(provider, imdb_id, TitleType::Tv)?;
    locate_and_fetch(provider, series_id, season, episode)
}

/// Normalizes release text with the named normalizer
pub fn normalize_title(parser: &str, text: &str) -> Result<NormalizedTitle, LookupError> {
    Ok(normalizer(parser)?.normalize(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::cell::Cell;

    /// Index returning canned hits; `up` toggles reachability
    struct FakeIndex {
        up: bool,
        hits: Vec<SearchHit>,
        record: Option<Value>,
        searches: Cell<usize>,
    }

    impl FakeIndex {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                up: true,
                hits,
                record: None,
                searches: Cell::new(0),
            }
        }
    }

    impl SearchIndex for FakeIndex {
        fn info(&self) -> Result<Value, SearchIndexError> {
            if self.up {
                Ok(json!({ "cluster_name": "test" }))
            } else {
                Err(SearchIndexError::RequestError("connection refused".to_string()))
            }
        }

        fn search_titles(
            &self,
            _title_type: TitleType,
            _query: &str,
            _year: Option<&str>,
        ) -> Result<Vec<SearchHit>, SearchIndexError> {
            self.searches.set(self.searches.get() + 1);
            Ok(self.hits.clone())
        }

        fn primary_record(
            &self,
            _title_type: TitleType,
            _imdb_id: &str,
        ) -> Result<Option<TitleDetails>, SearchIndexError> {
            Ok(self.record.clone().map(TitleDetails))
        }
    }

    /// Provider knowing a single series with two seasons of ten episodes
    struct FakeProvider {
        known_imdb_id: &'static str,
        answering_season: u32,
    }

    impl MetadataProvider for FakeProvider {
        fn find_by_imdb_id(
            &self,
            imdb_id: &str,
            _title_type: TitleType,
        ) -> Result<Option<u64>, MetadataRetrievalError> {
            Ok((imdb_id == self.known_imdb_id).then_some(1396))
        }

        fn fetch_title(
            &self,
            title_type: TitleType,
            id: u64,
        ) -> Result<TitleDetails, MetadataRetrievalError> {
            Ok(TitleDetails(json!({ "id": id, "type": title_type.as_str() })))
        }

        fn fetch_seasons(&self, _series_id: u64) -> Result<Vec<Season>, MetadataRetrievalError> {
            Ok(vec![Season::new(0, 2), Season::new(1, 10), Season::new(2, 10)])
        }

        fn fetch_episode(
            &self,
            series_id: u64,
            season_number: u32,
            episode_number: u32,
        ) -> Result<EpisodeMetadata, MetadataRetrievalError> {
            if season_number != self.answering_season {
                return Err(MetadataRetrievalError::NotFound(format!(
                    "/tv/{series_id}/season/{season_number}/episode/{episode_number}"
                )));
            }
            Ok(EpisodeMetadata(json!({
                "season_number": season_number,
                "episode_number": episode_number,
            })))
        }
    }

    #[test]
    fn test_lookup_titles_ranks_hits() {
        let index = FakeIndex::new(vec![
            SearchHit::new("tt0113277", 4.0),
            SearchHit::new("tt0113277", 11.0),
            SearchHit::new("tt2235779", 6.0),
        ]);

        let ranked = lookup_titles(&index, TitleType::Movie, "heat", None).unwrap();

        assert_eq!(ranked.ids(), vec!["tt0113277", "tt2235779"]);
        assert_eq!(ranked.get("tt0113277"), Some(11.0));
    }

    #[test]
    fn test_lookup_titles_without_hits_is_empty() {
        let index = FakeIndex::new(Vec::new());
        assert!(lookup_titles(&index, TitleType::Tv, "nothing", Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_unreachable_index_is_not_searched() {
        let mut index = FakeIndex::new(vec![SearchHit::new("tt1", 1.0)]);
        index.up = false;

        let result = lookup_titles(&index, TitleType::Movie, "heat", None);

        assert!(matches!(result, Err(LookupError::UpstreamUnavailable(_))));
        assert_eq!(index.searches.get(), 0);
        assert!(matches!(
            search_index_info(&index),
            Err(LookupError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_hit_is_precondition_violation() {
        let error = LookupError::from(SearchIndexError::MalformedHit {
            position: 0,
            reason: "missing _score".to_string(),
        });
        assert!(matches!(error, LookupError::PreconditionViolation(_)));

        let error = LookupError::from(SearchIndexError::BackendResponse {
            status: 503,
            details: String::new(),
        });
        assert!(matches!(error, LookupError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_title_detail() {
        let mut index = FakeIndex::new(Vec::new());
        assert!(matches!(
            title_detail(&index, TitleType::Movie, "tt0113277"),
            Err(LookupError::NotFound(_))
        ));

        index.record = Some(json!({ "imdbId": "tt0113277", "source": "primary" }));
        let detail = title_detail(&index, TitleType::Movie, "tt0113277").unwrap();
        assert_eq!(detail.0["imdbId"], "tt0113277");
    }

    #[test]
    fn test_provider_title_detail() {
        let provider = FakeProvider {
            known_imdb_id: "tt0903747",
            answering_season: 1,
        };

        let detail = provider_title_detail(&provider, TitleType::Tv, "tt0903747").unwrap();
        assert_eq!(detail.0, json!({ "id": 1396, "type": "tv" }));

        assert!(matches!(
            provider_title_detail(&provider, TitleType::Tv, "tt0000001"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_episode_infers_season() {
        let provider = FakeProvider {
            known_imdb_id: "tt0903747",
            answering_season: 2,
        };

        let located = find_episode(&provider, "tt0903747", SeasonRequest::Infer, 14).unwrap();

        assert_eq!(
            located.location,
            EpisodeLocation {
                season_number: 2,
                episode_number: 14,
            }
        );
    }

    #[test]
    fn test_find_episode_for_unknown_series() {
        let provider = FakeProvider {
            known_imdb_id: "tt0903747",
            answering_season: 1,
        };

        assert!(matches!(
            find_episode(&provider, "tt9999999", SeasonRequest::Explicit(1), 1),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_normalize_title() {
        let title = normalize_title("torrent_parser", "Heat.1995.1080p.mkv").unwrap();
        assert_eq!(title.query_string(), "Heat");

        assert!(matches!(
            normalize_title("unknown", "Heat"),
            Err(LookupError::PreconditionViolation(_))
        ));
    }
}
