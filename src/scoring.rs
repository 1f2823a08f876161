//! Search score aggregation
//!
//! Collapses the raw hits of a full-text search into one ranked entry per
//! title identifier.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// A single match returned by a search index query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Identifier of the matched title (an IMDb id for the title indexes)
    pub id: String,
    /// Relevance score reported by the search index
    pub score: f64,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Unique identifiers mapped to their best score, ordered by descending score.
///
/// Serializes as a JSON object whose key order is the ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedScores {
    entries: Vec<(String, f64)>,
}

impl RankedScores {
    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score for the given identifier, if it was part of the result
    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, score)| *score)
    }

    /// Iterates `(id, score)` pairs in ranking order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// Identifiers in ranking order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// The highest ranked entry
    pub fn best(&self) -> Option<(&str, f64)> {
        self.iter().next()
    }

    pub fn into_vec(self) -> Vec<(String, f64)> {
        self.entries
    }
}

impl Serialize for RankedScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, score) in &self.entries {
            map.serialize_entry(id, score)?;
        }
        map.end()
    }
}

/// Aggregates search hits into a deduplicated ranking.
///
/// Hits sharing an identifier collapse into one entry carrying the maximum
/// score seen for it; identical `(id, score)` pairs therefore count once.
/// The result is ordered by descending score. Equal scores keep ascending
/// identifier order.
///
/// # Examples
///
/// ```
/// use titlehound::{SearchHit, aggregate};
///
/// let ranked = aggregate(&[
///     SearchHit::new("tt0903747", 3.0),
///     SearchHit::new("tt0903747", 7.5),
///     SearchHit::new("tt0108778", 4.0),
/// ]);
/// assert_eq!(ranked.ids(), vec!["tt0903747", "tt0108778"]);
/// assert_eq!(ranked.get("tt0903747"), Some(7.5));
/// ```
pub fn aggregate(hits: &[SearchHit]) -> RankedScores {
    // BTreeMap enumerates ids in ascending order, which the stable sort below
    // keeps for ties.
    let mut best: BTreeMap<&str, f64> = BTreeMap::new();

    for hit in hits {
        best.entry(hit.id.as_str())
            .and_modify(|score| {
                if hit.score > *score {
                    *score = hit.score;
                }
            })
            .or_insert(hit.score);
    }

    let mut entries: Vec<(String, f64)> = best
        .into_iter()
        .map(|(id, score)| (id.to_string(), score))
        .collect();

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    RankedScores { entries }
}
