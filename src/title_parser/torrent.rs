//! Torrent release name normalizer

use super::{NormalizedTitle, TitleNormalizer};
use regex::Regex;
use std::sync::LazyLock;

/// Release flags that never help a title search
const NOISE_TERMS: &[&str] = &[
    "multi",
    "truefrench",
    "french",
    "vostfr",
    "subfrench",
    "vff",
    "vfq",
    "vf2",
    "dual",
    "proper",
    "repack",
    "internal",
    "limited",
    "extended",
    "unrated",
    "remastered",
    "complete",
    "integrale",
];

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

static FILE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\.(mkv|mp4|avi|m4v|mov|wmv|ts|srt|nfo|torrent)$"));
static RELEASE_GROUP: LazyLock<Regex> = LazyLock::new(|| regex(r"-[A-Za-z0-9]+$"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| regex(r"[._]+"));

static SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\bS(\d{1,2}) ?E(\d{1,3})\b"));
static CROSS_EPISODE: LazyLock<Regex> = LazyLock::new(|| regex(r"\b(\d{1,2})x(\d{2,3})\b"));
static SEASON_ONLY: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(?:S|season ?)(\d{1,2})\b"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| regex(r"\b(19\d{2}|20\d{2})\b"));
static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)\b(\d{3,4}p)\b"));
static RELEASE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)\b(?:blu ?ray|brrip|bdrip|web ?dl|web ?rip|web|hdtv|dvdrip|hdrip|remux|x26[45]|h ?26[45]|hevc|xvid|aac|ac3|dts|ddp?5 1|10bit|hdr)\b",
    )
});

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| regex(&format!(r"(?i)\b(?:{})\b", NOISE_TERMS.join("|"))));
static CLEANUP: LazyLock<Regex> = LazyLock::new(|| regex(r"[\[\]()\-]"));
static COMPRESS: LazyLock<Regex> = LazyLock::new(|| regex(r" +"));

/// Patterns marking the end of the title part of a release name
fn markers() -> [&'static Regex; 6] {
    [
        &*SEASON_EPISODE,
        &*CROSS_EPISODE,
        &*SEASON_ONLY,
        &*YEAR,
        &*RESOLUTION,
        &*RELEASE_TAGS,
    ]
}

/// Normalizer for torrent release paths such as
/// `Show.Name.S01/Show.Name.S01E02.720p.HDTV.x264-GROUP.mkv`.
///
/// The last two path components are considered. The title is everything
/// before the first release tag (year, episode marker, resolution, source,
/// codec) that leaves a non-empty title; the remaining untagged words form
/// the excess.
#[derive(Debug, Clone, Copy, Default)]
pub struct TorrentParser;

impl TitleNormalizer for TorrentParser {
    fn name(&self) -> &'static str {
        "torrent_parser"
    }

    fn normalize(&self, text: &str) -> NormalizedTitle {
        let name = release_name(text);
        let spaced = SEPARATORS.replace_all(&name, " ").into_owned();

        let split = title_split(&spaced);
        let (title_part, rest) = spaced.split_at(split);

        let mut excess_part = rest.to_string();
        for marker in markers() {
            excess_part = marker.replace_all(&excess_part, " ").into_owned();
        }

        let (season, episode) = season_and_episode(&spaced);

        NormalizedTitle {
            title: clean(title_part),
            excess: clean(&excess_part),
            year: YEAR
                .captures(rest)
                .and_then(|caps| caps[1].parse().ok()),
            season,
            episode,
            resolution: RESOLUTION
                .captures(&spaced)
                .map(|caps| caps[1].to_lowercase()),
        }
    }
}

/// Joins the last two path components and drops extension and release group
fn release_name(path: &str) -> String {
    let path = path.replace("./", "");
    let components: Vec<&str> = path
        .trim()
        .split('/')
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .collect();

    let start = components.len().saturating_sub(2);
    components[start..]
        .iter()
        .map(|component| {
            let component = FILE_EXTENSION.replace(component, "");
            RELEASE_GROUP.replace(&component, "").into_owned()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset where the title part ends
///
/// Picks the earliest marker that leaves a non-empty title, so names starting
/// with a number (`2012`, `1917`) keep it as their title.
fn title_split(spaced: &str) -> usize {
    let mut starts: Vec<usize> = markers()
        .into_iter()
        .flat_map(|marker| marker.find_iter(spaced).map(|m| m.start()))
        .collect();
    starts.sort_unstable();

    starts
        .into_iter()
        .find(|&start| !clean(&spaced[..start]).is_empty())
        .unwrap_or(spaced.len())
}

fn season_and_episode(spaced: &str) -> (Option<u32>, Option<u32>) {
    let episode_caps = SEASON_EPISODE
        .captures(spaced)
        .or_else(|| CROSS_EPISODE.captures(spaced));

    if let Some(caps) = episode_caps {
        return (caps[1].parse().ok(), caps[2].parse().ok());
    }

    let season = SEASON_ONLY
        .captures(spaced)
        .and_then(|caps| caps[1].parse().ok());
    (season, None)
}

/// Removes noise terms and stray punctuation, then collapses whitespace
fn clean(text: &str) -> String {
    let text = NOISE.replace_all(text, "");
    let text = CLEANUP.replace_all(&text, "");
    COMPRESS.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> NormalizedTitle {
        TorrentParser.normalize(text)
    }

    #[test]
    fn test_release_name_keeps_last_two_components() {
        assert_eq!(
            release_name("./downloads/Heat (1995)/Heat.1995.1080p.BluRay.x264-SPARKS.mkv"),
            "Heat (1995) Heat.1995.1080p.BluRay.x264"
        );
        assert_eq!(release_name("Heat.mkv"), "Heat");
        assert_eq!(release_name("series/"), "series");
    }

    #[test]
    fn test_episode_release() {
        let title = normalize("Breaking.Bad.S02E03.720p.HDTV.x264-IMMERSE.mkv");

        assert_eq!(title.title, "Breaking Bad");
        assert_eq!(title.excess, "");
        assert_eq!(title.season, Some(2));
        assert_eq!(title.episode, Some(3));
        assert_eq!(title.resolution.as_deref(), Some("720p"));
        assert_eq!(title.year, None);
        assert_eq!(title.query_string(), "Breaking Bad");
    }

    #[test]
    fn test_excess_words_are_kept() {
        let title = normalize("The.Office.US.S01E01.Pilot.720p.WEB-DL.mkv");

        assert_eq!(title.title, "The Office US");
        assert_eq!(title.excess, "Pilot");
        assert_eq!(title.query_string(), "The Office US Pilot");
    }

    #[test]
    fn test_movie_release_with_noise() {
        let title = normalize("Heat.1995.MULTi.1080p.BluRay.x264-LOST.mkv");

        assert_eq!(title.title, "Heat");
        assert_eq!(title.excess, "");
        assert_eq!(title.year, Some(1995));
        assert_eq!(title.resolution.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_leading_year_stays_in_title() {
        let title = normalize("1917.2019.1080p.mkv");

        assert_eq!(title.title, "1917");
        assert_eq!(title.year, Some(2019));
    }

    #[test]
    fn test_season_directory() {
        let title = normalize("Dark.Season.2/Dark.S02E05.FRENCH.1080p.mkv");

        assert_eq!(title.title, "Dark");
        assert_eq!(title.season, Some(2));
        assert_eq!(title.episode, Some(5));
        assert_eq!(title.excess, "Dark");
    }

    #[test]
    fn test_plain_title() {
        let title = normalize("[Some] Movie - Title");
        assert_eq!(title.title, "Some Movie Title");
        assert_eq!(title.query_string(), "Some Movie Title");
    }
}
