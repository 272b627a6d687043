//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PERSON_REGISTRY_DB` | platform data dir, `person-registry.db` |
//! | `PERSON_REGISTRY_INDEX` | `sqlite` (or `elasticsearch`) |
//! | `PERSON_REGISTRY_INDEX_PATH` | `person-index.db` beside the store; ignored with `--memory` |
//! | `PERSON_REGISTRY_ELASTICSEARCH_URL` | `http://localhost:9200` |
//! | `PERSON_REGISTRY_ELASTICSEARCH_INDEX` | `person` |
//! | `PERSON_REGISTRY_ELASTICSEARCH_TIMEOUT_SECS` | `5` |
//! | `PERSON_REGISTRY_APP_NAME` | `personRegistryApp` |
//! | `PERSON_REGISTRY_BIND` | `127.0.0.1` |
//! | `PERSON_REGISTRY_PORT` | `8080` |

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::index::{ElasticsearchIndex, IndexError, PersonIndex, SqliteIndex};

pub const DEFAULT_APP_NAME: &str = "personRegistryApp";
pub const DEFAULT_PORT: u16 = 8080;
/// File name of the SQLite index placed beside an on-disk store.
pub const INDEX_FILE: &str = "person-index.db";
const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";
const DEFAULT_ELASTICSEARCH_INDEX: &str = "person";
const DEFAULT_ELASTICSEARCH_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Which search index backend to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBackend {
    /// FTS5 index; `None` keeps it in memory.
    Sqlite { path: Option<PathBuf> },
    Elasticsearch {
        url: String,
        index: String,
        timeout: Duration,
    },
}

impl IndexBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Elasticsearch { .. } => "elasticsearch",
        }
    }

    /// Settle where a SQLite index lives, given where the store lives.
    ///
    /// An on-disk store gets an on-disk index beside it unless a path is
    /// configured. An in-memory store (`None`) always gets an in-memory
    /// index, because its ids restart at 1 on every run.
    pub fn place_beside_store(&mut self, store: Option<&Path>) {
        let Self::Sqlite { path } = self else {
            return;
        };
        match store {
            Some(store) => {
                if path.is_none() {
                    *path = Some(store.with_file_name(INDEX_FILE));
                }
            }
            None => {
                if let Some(ignored) = path.take() {
                    tracing::warn!(
                        "Ignoring index path {} for an in-memory store",
                        ignored.display()
                    );
                }
            }
        }
    }

    pub fn connect(&self) -> Result<Arc<dyn PersonIndex>, IndexError> {
        let index: Arc<dyn PersonIndex> = match self {
            Self::Sqlite { path: Some(path) } => Arc::new(SqliteIndex::open(path)?),
            Self::Sqlite { path: None } => Arc::new(SqliteIndex::open_memory()?),
            Self::Elasticsearch {
                url,
                index,
                timeout,
            } => Arc::new(ElasticsearchIndex::new(url.clone(), index.clone(), *timeout)?),
        };
        Ok(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` resolves to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub index: IndexBackend,
    /// Prefix of the `X-{app}-alert` response headers.
    pub app_name: String,
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            index: IndexBackend::Sqlite { path: None },
            app_name: DEFAULT_APP_NAME.to_string(),
            bind: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_path = lookup("PERSON_REGISTRY_DB").map(PathBuf::from);

        let index = match lookup("PERSON_REGISTRY_INDEX").as_deref() {
            None | Some("sqlite") => IndexBackend::Sqlite {
                path: lookup("PERSON_REGISTRY_INDEX_PATH").map(PathBuf::from),
            },
            Some("elasticsearch") => IndexBackend::Elasticsearch {
                url: lookup("PERSON_REGISTRY_ELASTICSEARCH_URL")
                    .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_URL.to_string()),
                index: lookup("PERSON_REGISTRY_ELASTICSEARCH_INDEX")
                    .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_INDEX.to_string()),
                timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "PERSON_REGISTRY_ELASTICSEARCH_TIMEOUT_SECS",
                    DEFAULT_ELASTICSEARCH_TIMEOUT_SECS,
                )?),
            },
            Some(other) => {
                return Err(ConfigError::invalid(
                    "PERSON_REGISTRY_INDEX",
                    format!("unknown backend '{}', expected sqlite or elasticsearch", other),
                ))
            }
        };

        let app_name = lookup("PERSON_REGISTRY_APP_NAME").unwrap_or(defaults.app_name);
        let header_safe = app_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if app_name.is_empty() || !header_safe {
            return Err(ConfigError::invalid(
                "PERSON_REGISTRY_APP_NAME",
                "must be non-empty and contain only ASCII letters, digits, '-' or '_'",
            ));
        }

        Ok(Self {
            database_path,
            index,
            app_name,
            bind: parse_or(&lookup, "PERSON_REGISTRY_BIND", defaults.bind)?,
            port: parse_or(&lookup, "PERSON_REGISTRY_PORT", defaults.port)?,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        None => Ok(default),
    }
}
