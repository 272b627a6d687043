//! Orchestration of writes across the store and the search index.
//!
//! Every mutation runs the same three steps:
//!
//! 1. **Validate** the fields. Failure stops here; nothing is written.
//! 2. **Commit** to the store. Failure stops here; the index is not touched.
//! 3. **Propagate** to the index. Failure does *not* fail the call: the store
//!    already holds the new state, and the outcome is reported as
//!    [`IndexSync::Pending`] so the inconsistency window is observable.
//!
//! The two writes are not atomic and no step is retried. The index catches
//! up on the next successful write of the same record.

use std::sync::Arc;

use crate::db::Database;
use crate::error::PersonError;
use crate::index::{IndexError, PersonIndex};
use crate::models::*;

/// Whether a committed write reached the search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSync {
    Synced,
    /// The store holds the change but the index may not.
    Pending { reason: String },
}

impl IndexSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending { .. } => "pending",
        }
    }

    fn from_result(result: Result<(), IndexError>, action: &str, id: PersonId) -> Self {
        match result {
            Ok(()) => Self::Synced,
            Err(e) => {
                tracing::warn!("Index {} for person {} failed: {}", action, id, e);
                Self::Pending {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// A write that the store accepted, with the outcome of index propagation.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub index_sync: IndexSync,
}

/// Result of an update: records without an id are created instead.
#[derive(Debug, Clone)]
pub enum Upsert {
    Created(Person),
    Updated(Person),
}

impl Upsert {
    pub fn person(&self) -> &Person {
        match self {
            Self::Created(person) | Self::Updated(person) => person,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Clone)]
pub struct PersonService {
    db: Database,
    index: Arc<dyn PersonIndex>,
}

impl PersonService {
    pub fn new(db: Database, index: Arc<dyn PersonIndex>) -> Self {
        Self { db, index }
    }

    pub async fn create(&self, record: PersonRecord) -> Result<Committed<Person>, PersonError> {
        let fields = match record {
            PersonRecord::Unsaved(fields) => fields,
            PersonRecord::Saved(person) => return Err(PersonError::IdAlreadySet(person.id)),
        };
        fields.validate()?;

        let person = self.db.create_person(PersonRecord::Unsaved(fields))?;
        tracing::debug!("Created person {}", person.id);

        let index_sync =
            IndexSync::from_result(self.index.upsert(&person).await, "upsert", person.id);
        Ok(Committed {
            value: person,
            index_sync,
        })
    }

    /// Update a stored person, or create it when the record has no id.
    ///
    /// A previously assigned id that is no longer stored is written back
    /// under that id; an id the store never assigned is rejected.
    pub async fn update(&self, record: PersonRecord) -> Result<Committed<Upsert>, PersonError> {
        let person = match record {
            PersonRecord::Unsaved(fields) => {
                let created = self.create(PersonRecord::Unsaved(fields)).await?;
                return Ok(Committed {
                    value: Upsert::Created(created.value),
                    index_sync: created.index_sync,
                });
            }
            PersonRecord::Saved(person) => person,
        };
        person.fields.validate()?;

        let person = self.db.update_person(person)?;
        tracing::debug!("Updated person {}", person.id);

        let index_sync =
            IndexSync::from_result(self.index.upsert(&person).await, "upsert", person.id);
        Ok(Committed {
            value: Upsert::Updated(person),
            index_sync,
        })
    }

    /// Delete a person. Deleting an unknown id succeeds.
    pub async fn delete(&self, id: PersonId) -> Result<Committed<()>, PersonError> {
        let existed = self.db.delete_person(id)?;
        tracing::debug!("Deleted person {} (existed: {})", id, existed);

        let index_sync = IndexSync::from_result(self.index.delete(id).await, "delete", id);
        Ok(Committed {
            value: (),
            index_sync,
        })
    }

    pub fn find(&self, id: PersonId) -> Result<Person, PersonError> {
        self.db.get_person(id)?.ok_or(PersonError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<Person>, PersonError> {
        self.db.get_all_persons()
    }

    /// Free-text search, answered by the index alone.
    pub async fn search(&self, query: &str) -> Result<Vec<Person>, PersonError> {
        Ok(self.index.search(query).await?)
    }
}
