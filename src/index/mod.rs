//! Secondary full-text index over persons.
//!
//! The index is derived from the store and may lag behind it. Every backend
//! implements [`PersonIndex`]; the service treats write failures as
//! non-fatal and only surfaces failures on [`PersonIndex::search`].

mod elasticsearch;
mod query;
mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Person, PersonId};

pub use elasticsearch::ElasticsearchIndex;
pub use query::{parse_query, QueryTerm, SearchField};
pub use sqlite::SqliteIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("sqlite index error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("search engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine returned {status}: {body}")]
    Engine { status: u16, body: String },

    #[error("could not decode search engine response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search index unavailable: {0}")]
    Unavailable(String),
}

/// A best-effort search index keyed by person id.
#[async_trait]
pub trait PersonIndex: Send + Sync {
    /// Index or re-index the full record under its id.
    async fn upsert(&self, person: &Person) -> Result<(), IndexError>;

    /// Remove a record. Removing an unknown id succeeds.
    async fn delete(&self, id: PersonId) -> Result<(), IndexError>;

    /// Free-text search. Queries with nothing to match return no results.
    async fn search(&self, query: &str) -> Result<Vec<Person>, IndexError>;
}
