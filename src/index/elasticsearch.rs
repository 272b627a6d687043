//! Person index hosted in an Elasticsearch cluster.
//!
//! Each call issues exactly one HTTP request. Timeouts come from the client
//! configuration; nothing is retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{IndexError, PersonIndex};
use crate::models::{Person, PersonId};

#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    base_url: String,
    index: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Person,
}

impl ElasticsearchIndex {
    pub fn new(
        base_url: impl Into<String>,
        index: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
            client,
        })
    }

    fn document_url(&self, id: PersonId) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index, id)
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.base_url, self.index)
    }

    async fn engine_error(response: reqwest::Response) -> IndexError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        IndexError::Engine { status, body }
    }
}

/// Body of a `query_string` search, the engine's own free-text syntax.
pub fn search_body(query: &str) -> serde_json::Value {
    json!({ "query": { "query_string": { "query": query } } })
}

/// Pull the stored documents out of a search response.
pub fn parse_hits(body: &[u8]) -> Result<Vec<Person>, IndexError> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(response.hits.hits.into_iter().map(|hit| hit.source).collect())
}

#[async_trait]
impl PersonIndex for ElasticsearchIndex {
    async fn upsert(&self, person: &Person) -> Result<(), IndexError> {
        let response = self
            .client
            .put(self.document_url(person.id))
            .json(person)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::engine_error(response).await)
        }
    }

    async fn delete(&self, id: PersonId) -> Result<(), IndexError> {
        let response = self.client.delete(self.document_url(id)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::engine_error(response).await),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Person>, IndexError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.search_url())
            .json(&search_body(query))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => parse_hits(&response.bytes().await?),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("Search engine rejected query {:?}: {}", query, body);
                Ok(Vec::new())
            }
            // The index does not exist until the first document is written.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            _ => Err(Self::engine_error(response).await),
        }
    }
}
