/// Elasticsearch search response types for deserialization.
///
/// Hit documents stay raw JSON; only the envelope is typed.
use serde::Deserialize;
use serde_json::Value;

/// Top-level `_search` response.
#[derive(Debug, Deserialize)]
pub(super) struct EsSearchResponse {
    pub hits: EsHits,
}

/// The `hits` envelope.
#[derive(Debug, Deserialize)]
pub(super) struct EsHits {
    /// Absent when total hit tracking is disabled
    pub total: Option<EsTotal>,
    #[serde(default)]
    pub hits: Vec<EsHit>,
}

/// Total hit count.
#[derive(Debug, Deserialize)]
pub(super) struct EsTotal {
    pub value: u64,
}

/// A single hit.
#[derive(Debug, Deserialize)]
pub(super) struct EsHit {
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source")]
    pub source: Option<Value>,
}
