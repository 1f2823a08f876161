/// Elasticsearch search index implementation.
use super::elasticsearch_types::{EsHit, EsSearchResponse};
use super::{SearchIndex, SearchIndexError, index_pattern};
use crate::TitleType;
use crate::metadata_retrieval::TitleDetails;
use crate::scoring::SearchHit;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Search index backed by an Elasticsearch cluster reached over HTTP.
pub struct ElasticsearchIndex {
    client: reqwest::blocking::Client,
    host: String,
}

impl ElasticsearchIndex {
    /// Creates a client for the cluster at `host` (e.g. `http://localhost:9200`).
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, SearchIndexError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchIndexError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        })
    }

    /// Sends a request and parses the JSON answer
    fn send_json(&self, request: reqwest::blocking::RequestBuilder) -> Result<Value, SearchIndexError> {
        let response = request
            .send()
            .map_err(|e| SearchIndexError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().unwrap_or_default();
            return Err(SearchIndexError::BackendResponse {
                status: status.as_u16(),
                details,
            });
        }

        response
            .json()
            .map_err(|e| SearchIndexError::ParseError(e.to_string()))
    }

    fn search(&self, title_type: TitleType, query: Value) -> Result<EsSearchResponse, SearchIndexError> {
        let url = format!("{}/{}/_search", self.host, index_pattern(title_type));
        debug!(%url, %query, "search request");

        let body = self.send_json(self.client.post(&url).json(&json!({ "query": query })))?;

        serde_json::from_value(body).map_err(|e| SearchIndexError::ParseError(e.to_string()))
    }
}

/// Builds the free-text title query
///
/// A non-empty year adds an optional clause, so titles from that year rank
/// higher without excluding the others.
fn title_query(query: &str, year: Option<&str>) -> Value {
    let mut bool_query = json!({
        "must": [
            { "query_string": { "query": query } }
        ]
    });

    if let Some(year) = year.filter(|year| !year.is_empty()) {
        bool_query["should"] = json!([
            { "match": { "year": year } }
        ]);
    }

    json!({ "bool": bool_query })
}

/// Builds the query selecting the primary record of an IMDb id
fn primary_record_query(imdb_id: &str) -> Value {
    json!({
        "bool": {
            "filter": [
                { "bool": { "should": [ { "match": { "imdbId": imdb_id } } ] } },
                { "match": { "source": "primary" } }
            ]
        }
    })
}

/// Converts raw hits into search hits, rejecting any hit without id or score
fn convert_hits(hits: Vec<EsHit>) -> Result<Vec<SearchHit>, SearchIndexError> {
    hits.into_iter()
        .enumerate()
        .map(|(position, hit)| {
            let id = hit
                .source
                .as_ref()
                .and_then(|source| source.get("imdbId"))
                .and_then(Value::as_str)
                .ok_or_else(|| SearchIndexError::MalformedHit {
                    position,
                    reason: "missing _source.imdbId".to_string(),
                })?;

            let score = hit.score.ok_or_else(|| SearchIndexError::MalformedHit {
                position,
                reason: "missing _score".to_string(),
            })?;

            Ok(SearchHit::new(id, score))
        })
        .collect()
}

impl SearchIndex for ElasticsearchIndex {
    fn info(&self) -> Result<Value, SearchIndexError> {
        self.send_json(self.client.get(format!("{}/", self.host)))
    }

    fn search_titles(
        &self,
        title_type: TitleType,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchIndexError> {
        let response = self.search(title_type, title_query(query, year))?;
        convert_hits(response.hits.hits)
    }

    fn primary_record(
        &self,
        title_type: TitleType,
        imdb_id: &str,
    ) -> Result<Option<TitleDetails>, SearchIndexError> {
        let response = self.search(title_type, primary_record_query(imdb_id))?;

        if response.hits.total.is_some_and(|total| total.value == 0) {
            return Ok(None);
        }

        Ok(response
            .hits
            .hits
            .into_iter()
            .next()
            .and_then(|hit| hit.source)
            .map(TitleDetails))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: Value) -> EsSearchResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_title_query_without_year() {
        assert_eq!(
            title_query("breaking bad", None),
            json!({ "bool": { "must": [ { "query_string": { "query": "breaking bad" } } ] } })
        );
        // An empty year is the same as no year
        assert_eq!(title_query("breaking bad", Some("")), title_query("breaking bad", None));
    }

    #[test]
    fn test_title_query_with_year() {
        let query = title_query("heat", Some("1995"));
        assert_eq!(query["bool"]["should"], json!([ { "match": { "year": "1995" } } ]));
        assert_eq!(query["bool"]["must"][0]["query_string"]["query"], "heat");
    }

    #[test]
    fn test_primary_record_query_filters_on_source() {
        let query = primary_record_query("tt0113277");
        let filters = query["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0]["bool"]["should"][0]["match"]["imdbId"], "tt0113277");
        assert_eq!(filters[1]["match"]["source"], "primary");
    }

    #[test]
    fn test_convert_hits() {
        let response = parse(json!({
            "hits": {
                "total": { "value": 2, "relation": "eq" },
                "hits": [
                    { "_id": "a", "_score": 12.5, "_source": { "imdbId": "tt0113277", "title": "Heat" } },
                    { "_id": "b", "_score": 3.0, "_source": { "imdbId": "tt0113277", "source": "akas" } }
                ]
            }
        }));

        assert_eq!(
            convert_hits(response.hits.hits).unwrap(),
            vec![SearchHit::new("tt0113277", 12.5), SearchHit::new("tt0113277", 3.0)]
        );
    }

    #[test]
    fn test_convert_hits_rejects_missing_id() {
        let response = parse(json!({
            "hits": {
                "hits": [
                    { "_score": 1.0, "_source": { "imdbId": "tt1" } },
                    { "_score": 1.0, "_source": { "title": "no id" } }
                ]
            }
        }));

        assert!(matches!(
            convert_hits(response.hits.hits),
            Err(SearchIndexError::MalformedHit { position: 1, .. })
        ));
    }

    #[test]
    fn test_convert_hits_rejects_missing_score() {
        let response = parse(json!({
            "hits": { "hits": [ { "_score": null, "_source": { "imdbId": "tt1" } } ] }
        }));

        assert!(matches!(
            convert_hits(response.hits.hits),
            Err(SearchIndexError::MalformedHit { position: 0, .. })
        ));
    }
}
