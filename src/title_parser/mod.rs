//! Title normalizers
//!
//! Normalizers turn messy release names into clean search queries. They are
//! selected by name from a fixed registry.

mod torrent;

pub use torrent::TorrentParser;

use crate::LookupError;
use serde::Serialize;

/// A release name broken down into its searchable parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedTitle {
    /// Cleaned title
    pub title: String,
    /// Cleaned leftover words that did not fit a known release tag
    pub excess: String,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Vertical resolution tag such as `1080p`
    pub resolution: Option<String>,
}

impl NormalizedTitle {
    /// Query string for the search index: title followed by the excess words
    pub fn query_string(&self) -> String {
        format!("{} {}", self.title, self.excess).trim().to_string()
    }
}

/// Trait for strategies that normalize raw release text.
pub trait TitleNormalizer: Sync {
    /// Registry identifier of this normalizer
    fn name(&self) -> &'static str;

    /// Normalizes raw release text, typically a file path or release name
    fn normalize(&self, text: &str) -> NormalizedTitle;
}

/// All available normalizers, keyed by [`TitleNormalizer::name`]
static NORMALIZERS: &[&dyn TitleNormalizer] = &[&TorrentParser];

/// Identifiers of all registered normalizers
pub fn normalizer_names() -> Vec<&'static str> {
    NORMALIZERS.iter().map(|normalizer| normalizer.name()).collect()
}

/// Looks up a normalizer by identifier
///
/// # Errors
///
/// `PreconditionViolation` for an unknown identifier.
pub fn normalizer(name: &str) -> Result<&'static dyn TitleNormalizer, LookupError> {
    NORMALIZERS
        .iter()
        .copied()
        .find(|normalizer| normalizer.name() == name)
        .ok_or_else(|| {
            LookupError::PreconditionViolation(format!(
                "unknown parser '{}', available: {}",
                name,
                normalizer_names().join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(normalizer("torrent_parser").unwrap().name(), "torrent_parser");
        assert_eq!(normalizer_names(), vec!["torrent_parser"]);
    }

    #[test]
    fn test_unknown_normalizer() {
        assert!(matches!(
            normalizer("nfo_parser"),
            Err(LookupError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_query_string_joins_title_and_excess() {
        let title = NormalizedTitle {
            title: "The Office".to_string(),
            excess: "US".to_string(),
            ..Default::default()
        };
        assert_eq!(title.query_string(), "The Office US");

        let title = NormalizedTitle {
            title: "Heat".to_string(),
            ..Default::default()
        };
        assert_eq!(title.query_string(), "Heat");
    }
}
