/// TMDB API response types for deserialization.
///
/// Only the fields the lookups rely on are typed; full title and episode
/// records are passed through as raw JSON.
use serde::Deserialize;

/// Response of the `/find/{external_id}` endpoint.
#[derive(Debug, Default, Deserialize)]
pub(super) struct TmdbFindResponse {
    #[serde(default)]
    pub movie_results: Vec<TmdbFindResult>,
    #[serde(default)]
    pub tv_results: Vec<TmdbFindResult>,
}

/// A single entry of a find result list.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbFindResult {
    pub id: u64,
}

/// The subset of `/tv/{id}` needed for season resolution.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeries {
    #[serde(default)]
    pub seasons: Vec<TmdbSeasonSummary>,
}

/// One entry of the `seasons` array on a series record.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeasonSummary {
    pub season_number: u32,
    /// Missing on some freshly announced seasons
    #[serde(default)]
    pub episode_count: u32,
}
