//! The authoritative person store, backed by SQLite.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::PersonError;
use crate::models::*;

const DATABASE_FILE: &str = "person-registry.db";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Person operations
    // ============================================================

    pub fn get_all_persons(&self) -> Result<Vec<Person>, PersonError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, first_name, last_name, age FROM persons ORDER BY id")?;

        let persons = stmt
            .query_map([], person_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(persons)
    }

    pub fn get_person(&self, id: PersonId) -> Result<Option<Person>, PersonError> {
        let conn = self.lock();
        let person = conn
            .query_row(
                "SELECT id, first_name, last_name, age FROM persons WHERE id = ?",
                [id.0],
                person_from_row,
            )
            .optional()?;

        Ok(person)
    }

    /// Insert a new person and assign its id.
    ///
    /// A record that already carries an id is a caller error and is rejected
    /// before anything is written.
    pub fn create_person(&self, record: PersonRecord) -> Result<Person, PersonError> {
        let fields = match record {
            PersonRecord::Unsaved(fields) => fields,
            PersonRecord::Saved(person) => return Err(PersonError::IdAlreadySet(person.id)),
        };
        fields.validate()?;

        let conn = self.lock();
        conn.execute(
            "INSERT INTO persons (first_name, last_name, age) VALUES (?, ?, ?)",
            (&fields.first_name, &fields.last_name, fields.age),
        )?;
        let id = PersonId(conn.last_insert_rowid());

        Ok(Person::new(id, fields))
    }

    /// Write a person under its id, inserting it if the id is unknown.
    ///
    /// Only ids at or below the `AUTOINCREMENT` sequence are accepted: a
    /// deleted person can be written back, an id never handed out cannot.
    pub fn update_person(&self, person: Person) -> Result<Person, PersonError> {
        person.fields.validate()?;

        let conn = self.lock();
        let assigned: i64 = conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'persons'",
                [],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);
        if person.id.0 <= 0 || person.id.0 > assigned {
            return Err(PersonError::IdNotAssigned(person.id));
        }

        conn.execute(
            "INSERT INTO persons (id, first_name, last_name, age) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                age = excluded.age",
            (
                person.id.0,
                &person.fields.first_name,
                &person.fields.last_name,
                person.fields.age,
            ),
        )?;

        Ok(person)
    }

    /// Remove a person. Returns whether a row existed; a missing id is not an error.
    pub fn delete_person(&self, id: PersonId) -> Result<bool, PersonError> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM persons WHERE id = ?", [id.0])?;
        Ok(rows > 0)
    }

    pub fn count_persons(&self) -> Result<u64, PersonError> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Location of the database when no path is configured.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "person-registry")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join(DATABASE_FILE))
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: PersonId(row.get(0)?),
        fields: PersonFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            age: row.get(3)?,
        },
    })
}
