//! Cached metadata provider implementation
//!
//! This module provides a caching wrapper for metadata providers that
//! automatically stores and retrieves provider responses from a local cache.

use super::{EpisodeMetadata, MetadataProvider, MetadataRetrievalError, Season, TitleDetails};
use crate::TitleType;
use crate::cache::{CacheError, CacheStorage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// A caching wrapper for metadata providers
///
/// Successful responses of the wrapped provider are kept on disk until their
/// time-to-live expires. Failures are never cached, and cache failures never
/// fail a request.
pub struct CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    /// The underlying metadata provider
    provider: P,
    finds: CacheStorage<Option<u64>>,
    titles: CacheStorage<TitleDetails>,
    seasons: CacheStorage<Vec<Season>>,
    episodes: CacheStorage<EpisodeMetadata>,
}

impl<P> CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    /// Wraps `provider` with caches in the system cache directory
    ///
    /// # Arguments
    ///
    /// * `provider` - The metadata provider to wrap
    /// * `namespace` - Prefix separating caches of differently configured
    ///   providers (e.g. one per response language)
    /// * `ttl` - Maximum age of a cached response
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let tmdb = TmdbProvider::new(api_key, "fr", Duration::from_secs(10))?;
    /// let cached = CachedMetadataProvider::open(tmdb, "tmdb-fr", Some(ttl))?;
    /// ```
    pub fn open(provider: P, namespace: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        Ok(Self {
            provider,
            finds: CacheStorage::open(&format!("{namespace}-find"), ttl)?,
            titles: CacheStorage::open(&format!("{namespace}-title"), ttl)?,
            seasons: CacheStorage::open(&format!("{namespace}-seasons"), ttl)?,
            episodes: CacheStorage::open(&format!("{namespace}-episode"), ttl)?,
        })
    }

    /// Same as [`CachedMetadataProvider::open`], below an explicit root directory
    pub fn open_in(
        provider: P,
        root: &Path,
        namespace: &str,
        ttl: Option<Duration>,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            provider,
            finds: CacheStorage::open_in(root, &format!("{namespace}-find"), ttl)?,
            titles: CacheStorage::open_in(root, &format!("{namespace}-title"), ttl)?,
            seasons: CacheStorage::open_in(root, &format!("{namespace}-seasons"), ttl)?,
            episodes: CacheStorage::open_in(root, &format!("{namespace}-episode"), ttl)?,
        })
    }
}

/// Serves `key` from `cache`, falling back to `fetch` and storing its result
fn cached<T, F>(cache: &CacheStorage<T>, key: &str, fetch: F) -> Result<T, MetadataRetrievalError>
where
    T: Serialize + for<'de> Deserialize<'de>,
    F: FnOnce() -> Result<T, MetadataRetrievalError>,
{
    match cache.load(key) {
        Ok(Some(value)) => {
            debug!(key, "cache hit");
            return Ok(value);
        }
        Ok(None) => {}
        Err(e) => {
            // A broken entry is refetched and overwritten below
            warn!(key, error = %e, "cache read failed");
        }
    }

    let value = fetch()?;

    if let Err(e) = cache.store(key, &value) {
        warn!(key, error = %e, "cache write failed");
    }

    Ok(value)
}

impl<P> MetadataProvider for CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    fn find_by_imdb_id(
        &self,
        imdb_id: &str,
        title_type: TitleType,
    ) -> Result<Option<u64>, MetadataRetrievalError> {
        let key = format!("{}/{}", title_type.as_str(), imdb_id);
        cached(&self.finds, &key, || {
            self.provider.find_by_imdb_id(imdb_id, title_type)
        })
    }

    fn fetch_title(
        &self,
        title_type: TitleType,
        id: u64,
    ) -> Result<TitleDetails, MetadataRetrievalError> {
        let key = format!("{}/{}", title_type.as_str(), id);
        cached(&self.titles, &key, || self.provider.fetch_title(title_type, id))
    }

    fn fetch_seasons(&self, series_id: u64) -> Result<Vec<Season>, MetadataRetrievalError> {
        cached(&self.seasons, &series_id.to_string(), || {
            self.provider.fetch_seasons(series_id)
        })
    }

    fn fetch_episode(
        &self,
        series_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<EpisodeMetadata, MetadataRetrievalError> {
        let key = format!("{}/{}/{}", series_id, season_number, episode_number);
        cached(&self.episodes, &key, || {
            self.provider
                .fetch_episode(series_id, season_number, episode_number)
        })
    }
}
