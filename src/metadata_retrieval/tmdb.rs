/// TMDB metadata provider implementation.
use super::tmdb_types::{TmdbFindResponse, TmdbSeries};
use super::{EpisodeMetadata, MetadataProvider, MetadataRetrievalError, Season, TitleDetails};
use crate::TitleType;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Metadata provider for the TMDB v3 API.
///
/// Every request carries the API key and the configured response language.
pub struct TmdbProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbProvider {
    /// Creates a new TMDB provider instance.
    ///
    /// # Arguments
    ///
    /// * `api_key` - TMDB v3 API key
    /// * `language` - Language tag for localized fields (e.g. "fr")
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MetadataRetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    /// Points the provider at another API root, e.g. a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues a GET request and deserializes the JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataRetrievalError> {
        let url = self.url(path);
        debug!(%url, "tmdb request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        if response.status() == 404 {
            return Err(MetadataRetrievalError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            return Err(MetadataRetrievalError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json()
            .map_err(|e| MetadataRetrievalError::ParseError(e.to_string()))
    }

    /// Picks the first provider id for the requested title type.
    fn first_result(response: TmdbFindResponse, title_type: TitleType) -> Option<u64> {
        let results = match title_type {
            TitleType::Tv => response.tv_results,
            TitleType::Movie => response.movie_results,
        };
        results.first().map(|result| result.id)
    }

    /// Converts a series record to its season list, preserving provider order.
    fn convert_seasons(series: TmdbSeries) -> Vec<Season> {
        series
            .seasons
            .into_iter()
            .map(|season| Season::new(season.season_number, season.episode_count))
            .collect()
    }
}

impl MetadataProvider for TmdbProvider {
    fn find_by_imdb_id(
        &self,
        imdb_id: &str,
        title_type: TitleType,
    ) -> Result<Option<u64>, MetadataRetrievalError> {
        let response: TmdbFindResponse = self.get_json(
            &format!("/find/{}", imdb_id),
            &[("external_source", "imdb_id")],
        )?;

        Ok(Self::first_result(response, title_type))
    }

    fn fetch_title(
        &self,
        title_type: TitleType,
        id: u64,
    ) -> Result<TitleDetails, MetadataRetrievalError> {
        self.get_json(
            &format!("/{}/{}", title_type.as_str(), id),
            &[("language", self.language.as_str())],
        )
    }

    fn fetch_seasons(&self, series_id: u64) -> Result<Vec<Season>, MetadataRetrievalError> {
        let series: TmdbSeries = self.get_json(
            &format!("/tv/{}", series_id),
            &[("language", self.language.as_str())],
        )?;

        Ok(Self::convert_seasons(series))
    }

    fn fetch_episode(
        &self,
        series_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<EpisodeMetadata, MetadataRetrievalError> {
        self.get_json(
            &format!(
                "/tv/{}/season/{}/episode/{}",
                series_id, season_number, episode_number
            ),
            &[("language", self.language.as_str())],
        )
    }
}
