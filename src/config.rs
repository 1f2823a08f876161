//! Runtime settings
//!
//! Settings come from command line flags with environment variable
//! fallbacks, and know how to build the search and metadata clients.

use crate::cache::CacheError;
use crate::metadata_retrieval::{
    CachedMetadataProvider, MetadataProvider, MetadataRetrievalError, TmdbProvider,
};
use crate::search_index::{ElasticsearchIndex, SearchIndexError};
use clap::Args;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while turning settings into clients
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider command was run without an API key
    #[error("TMDB API key missing, pass --tmdb-api-key or set TMDB_API_KEY")]
    MissingApiKey,

    /// The response cache could not be opened
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The provider client could not be built
    #[error("Metadata provider error: {0}")]
    Provider(#[from] MetadataRetrievalError),

    /// The search client could not be built
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
}

/// Connection and cache settings shared by all commands
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Elasticsearch base URL
    #[arg(long, env = "ES_HOST", default_value = "http://localhost:9200", global = true)]
    pub es_host: String,

    /// TMDB v3 API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true, global = true)]
    pub tmdb_api_key: Option<String>,

    /// Language of localized provider fields
    #[arg(long, env = "TMDB_LANGUAGE", default_value = "fr", global = true)]
    pub language: String,

    /// Days a provider response stays cached
    #[arg(long, env = "TITLEHOUND_CACHE_TTL_DAYS", default_value_t = 30, global = true)]
    pub cache_ttl_days: u64,

    /// Disable the provider response cache
    #[arg(long, default_value_t = false, global = true)]
    pub no_cache: bool,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_days * 24 * 60 * 60)
    }

    /// Builds the Elasticsearch client
    pub fn search_index(&self) -> Result<ElasticsearchIndex, ConfigError> {
        Ok(ElasticsearchIndex::new(&self.es_host, self.timeout())?)
    }

    /// Builds the TMDB provider, wrapped in the response cache unless disabled
    pub fn metadata_provider(&self) -> Result<Box<dyn MetadataProvider>, ConfigError> {
        let api_key = self
            .tmdb_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let tmdb = TmdbProvider::new(api_key, &self.language, self.timeout())?;

        if self.no_cache {
            debug!("provider cache disabled");
            return Ok(Box::new(tmdb));
        }

        let namespace = format!("tmdb-{}", self.language);
        let cached = CachedMetadataProvider::open(tmdb, &namespace, Some(self.cache_ttl()))?;
        Ok(Box::new(cached))
    }
}
