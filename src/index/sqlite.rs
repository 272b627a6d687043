use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::query::{parse_query, QueryTerm};
use super::{IndexError, PersonIndex};
use crate::models::{Person, PersonFields, PersonId};

const CREATE_INDEX_TABLE: &str = "CREATE VIRTUAL TABLE IF NOT EXISTS person_index USING fts5(
    person_id,
    first_name,
    last_name,
    age,
    tokenize = 'unicode61'
)";

/// Full-text index stored in its own SQLite FTS5 table.
///
/// The index lives on a separate connection from the store, so it can be
/// dropped and rebuilt without touching the authoritative data. Documents
/// are keyed by rowid, which is always the person id.
pub struct SqliteIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIndex {
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IndexError::Unavailable(format!("cannot create index dir: {}", e)))?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_memory() -> Result<Self, IndexError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, IndexError> {
        conn.execute_batch(CREATE_INDEX_TABLE)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("index lock poisoned")
    }

    pub fn upsert_person(&self, person: &Person) -> Result<(), IndexError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM person_index WHERE rowid = ?", [person.id.0])?;
        tx.execute(
            "INSERT INTO person_index (rowid, person_id, first_name, last_name, age)
             VALUES (?, ?, ?, ?, ?)",
            (
                person.id.0,
                person.id.to_string(),
                &person.fields.first_name,
                &person.fields.last_name,
                person.fields.age,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_person(&self, id: PersonId) -> Result<(), IndexError> {
        let conn = self.lock();
        conn.execute("DELETE FROM person_index WHERE rowid = ?", [id.0])?;
        Ok(())
    }

    pub fn search_persons(&self, query: &str) -> Result<Vec<Person>, IndexError> {
        let terms = parse_query(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let expression = match_expression(&terms);

        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT rowid, first_name, last_name, age FROM person_index
             WHERE person_index MATCH ? ORDER BY rank",
        )?;
        let persons = stmt
            .query_map([expression], person_from_index_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(persons)
    }

    pub fn document_count(&self) -> Result<u64, IndexError> {
        let conn = self.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM person_index", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Clone for SqliteIndex {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

#[async_trait]
impl PersonIndex for SqliteIndex {
    async fn upsert(&self, person: &Person) -> Result<(), IndexError> {
        self.upsert_person(person)
    }

    async fn delete(&self, id: PersonId) -> Result<(), IndexError> {
        self.delete_person(id)
    }

    async fn search(&self, query: &str) -> Result<Vec<Person>, IndexError> {
        self.search_persons(query)
    }
}

/// Build an FTS5 MATCH expression. Tokens are alphanumeric, so quoting them
/// is enough to keep the expression well-formed.
fn match_expression(terms: &[QueryTerm]) -> String {
    terms
        .iter()
        .map(|term| match term.field {
            Some(field) => format!("{} : \"{}\"", field.column(), term.token),
            None => format!("\"{}\"", term.token),
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn person_from_index_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let age = match row.get::<_, Value>(3)? {
        Value::Integer(age) => i32::try_from(age).ok(),
        Value::Text(age) => age.parse().ok(),
        _ => None,
    };

    Ok(Person {
        id: PersonId(row.get(0)?),
        fields: PersonFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            age,
        },
    })
}
