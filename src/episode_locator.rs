//! Episode location
//!
//! Resolves a series-wide (absolute) episode index to the season holding it,
//! then fetches the episode through a bounded window of season numbers.

use crate::LookupError;
use crate::metadata_retrieval::{EpisodeMetadata, MetadataProvider, Season};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Number of consecutive season numbers tried per lookup
pub const SEASON_WINDOW: u32 = 5;

/// Raw season value asking for the season to be inferred
pub const INFER_SEASON_SENTINEL: i64 = -1;

/// How the season of a lookup is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonRequest {
    /// Derive the season from the series' episode counts
    Infer,
    /// Start the window at this season number
    Explicit(u32),
}

impl SeasonRequest {
    /// Parses a caller supplied season value, where `-1` means "infer".
    pub fn from_raw(raw: i64) -> Result<Self, LookupError> {
        if raw == INFER_SEASON_SENTINEL {
            return Ok(Self::Infer);
        }

        u32::try_from(raw).map(Self::Explicit).map_err(|_| {
            LookupError::PreconditionViolation(format!(
                "invalid season {raw}, expected a season number or {INFER_SEASON_SENTINEL}"
            ))
        })
    }
}

/// Season and episode number a lookup was answered with.
///
/// `episode_number` is the absolute index the lookup was made with; it is
/// never rebased onto the resolved season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeLocation {
    pub season_number: u32,
    pub episode_number: u32,
}

/// Result of a successful [`locate_and_fetch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedEpisode {
    pub location: EpisodeLocation,
    pub metadata: EpisodeMetadata,
}

/// Finds the season containing an absolute episode index.
///
/// `seasons` must be sorted by ascending season number. Specials (season 0)
/// do not count towards the absolute index. An index past the last episode
/// resolves to the last season rather than failing.
///
/// # Errors
///
/// `PreconditionViolation` when `seasons` holds no regular season.
///
/// # Examples
///
/// ```
/// use titlehound::{Season, resolve_season};
///
/// let seasons = [Season::new(0, 3), Season::new(1, 10), Season::new(2, 10)];
/// assert_eq!(resolve_season(&seasons, 11).unwrap(), 2);
/// ```
pub fn resolve_season(seasons: &[Season], absolute_episode: u32) -> Result<u32, LookupError> {
    let mut cumulative: u64 = 0;
    let mut last_seen = None;

    for season in seasons.iter().filter(|season| !season.is_specials()) {
        cumulative += u64::from(season.episode_count);
        last_seen = Some(season.season_number);

        if u64::from(absolute_episode) <= cumulative {
            return Ok(season.season_number);
        }
    }

    // Out of range indices fall back to the last season examined
    last_seen.ok_or_else(|| {
        LookupError::PreconditionViolation(
            "cannot resolve a season without any regular season".to_string(),
        )
    })
}

/// Locates an episode by absolute index and fetches its metadata.
///
/// With [`SeasonRequest::Infer`] the season list is fetched once and the
/// season resolved from it; an explicit season skips that step. Either way
/// the episode is then requested for `SEASON_WINDOW` consecutive season
/// numbers, in ascending order, until the provider answers.
///
/// # Errors
///
/// * `UpstreamUnavailable` - the season list could not be fetched
/// * `PreconditionViolation` - the season list holds no regular season
/// * `NotFound` - every season of the window failed
pub fn locate_and_fetch<P>(
    provider: &P,
    series_id: u64,
    season: SeasonRequest,
    absolute_episode: u32,
) -> Result<LocatedEpisode, LookupError>
where
    P: MetadataProvider + ?Sized,
{
    let start_season = match season {
        SeasonRequest::Explicit(season_number) => season_number,
        SeasonRequest::Infer => {
            let mut seasons = provider.fetch_seasons(series_id).map_err(|e| {
                LookupError::UpstreamUnavailable(format!(
                    "season list of series {series_id}: {e}"
                ))
            })?;
            seasons.sort_by_key(|season| season.season_number);

            let resolved = resolve_season(&seasons, absolute_episode)?;
            info!(series_id, absolute_episode, season = resolved, "resolved season");
            resolved
        }
    };

    fetch_in_window(provider, series_id, start_season, absolute_episode)
}

/// Requests the episode for each season of the window, first answer wins.
fn fetch_in_window<P>(
    provider: &P,
    series_id: u64,
    start_season: u32,
    episode_number: u32,
) -> Result<LocatedEpisode, LookupError>
where
    P: MetadataProvider + ?Sized,
{
    for offset in 0..SEASON_WINDOW {
        let Some(season_number) = start_season.checked_add(offset) else {
            break;
        };

        debug!(series_id, season_number, episode_number, "trying season");

        match provider.fetch_episode(series_id, season_number, episode_number) {
            Ok(metadata) => {
                return Ok(LocatedEpisode {
                    location: EpisodeLocation {
                        season_number,
                        episode_number,
                    },
                    metadata,
                });
            }
            Err(e) => {
                warn!(series_id, season_number, episode_number, error = %e, "episode attempt failed");
            }
        }
    }

    Err(LookupError::NotFound(format!(
        "episode {episode_number} of series {series_id} in seasons {start_season}..={}",
        start_season.saturating_add(SEASON_WINDOW - 1)
    )))
}
