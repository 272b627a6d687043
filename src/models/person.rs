use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationError};

/// Minimum number of characters in a first or last name.
pub const MIN_NAME_LENGTH: usize = 3;
/// Youngest age a person may be registered with.
pub const MIN_AGE: i32 = 18;
/// Oldest age a person may be registered with.
pub const MAX_AGE: i32 = 100;

const OBJECT_NAME: &str = "person";

/// Identifier assigned by the store on the first successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The editable fields of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonFields {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
}

impl PersonFields {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: Option<i32>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
        }
    }

    /// Check every field constraint, collecting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        self.collect_violations(&mut errors);
        ValidationError::from_field_errors(errors)
    }

    fn collect_violations(&self, errors: &mut Vec<FieldError>) {
        if let Some(code) = name_violation(&self.first_name) {
            errors.push(FieldError::new(OBJECT_NAME, "firstName", code));
        }
        if let Some(code) = name_violation(&self.last_name) {
            errors.push(FieldError::new(OBJECT_NAME, "lastName", code));
        }
        if let Some(code) = self.age.and_then(|age| age_violation(age.into())) {
            errors.push(FieldError::new(OBJECT_NAME, "age", code));
        }
    }
}

fn name_violation(name: &str) -> Option<&'static str> {
    (name.chars().count() < MIN_NAME_LENGTH).then_some("Size")
}

/// Ages are checked as `i64` so that values beyond `i32` still report the
/// bound they broke.
fn age_violation(age: i64) -> Option<&'static str> {
    if age < i64::from(MIN_AGE) {
        Some("Min")
    } else if age > i64::from(MAX_AGE) {
        Some("Max")
    } else {
        None
    }
}

/// A person that has been committed to the store.
///
/// Two persons are equal when their ids are equal, whatever their fields say.
/// Compare `fields` directly to check content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(flatten)]
    pub fields: PersonFields,
}

impl Person {
    pub fn new(id: PersonId, fields: PersonFields) -> Self {
        Self { id, fields }
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A person as submitted for a write: either never stored, or carrying the
/// id the store assigned earlier.
///
/// Has no value equality: an unsaved record has no identity to compare.
#[derive(Debug, Clone)]
pub enum PersonRecord {
    Unsaved(PersonFields),
    Saved(Person),
}

impl PersonRecord {
    pub fn id(&self) -> Option<PersonId> {
        match self {
            Self::Unsaved(_) => None,
            Self::Saved(person) => Some(person.id),
        }
    }

    pub fn fields(&self) -> &PersonFields {
        match self {
            Self::Unsaved(fields) => fields,
            Self::Saved(person) => &person.fields,
        }
    }
}

/// JSON body accepted by the write endpoints.
///
/// Every field is optional on the wire so that missing names are reported as
/// field errors instead of body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PersonId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
}

impl PersonPayload {
    /// Check presence and field constraints, producing a typed record.
    ///
    /// A missing name is reported once, as `NotNull`.
    pub fn into_record(self) -> Result<PersonRecord, ValidationError> {
        let mut errors = Vec::new();
        for (field, value) in [("firstName", &self.first_name), ("lastName", &self.last_name)] {
            let code = match value {
                None => Some("NotNull"),
                Some(name) => name_violation(name),
            };
            if let Some(code) = code {
                errors.push(FieldError::new(OBJECT_NAME, field, code));
            }
        }
        if let Some(code) = self.age.and_then(age_violation) {
            errors.push(FieldError::new(OBJECT_NAME, "age", code));
        }
        ValidationError::from_field_errors(errors)?;

        let fields = PersonFields {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            // In range once validated.
            age: self.age.and_then(|age| i32::try_from(age).ok()),
        };

        Ok(match self.id {
            Some(id) => PersonRecord::Saved(Person::new(id, fields)),
            None => PersonRecord::Unsaved(fields),
        })
    }
}

impl From<PersonFields> for PersonPayload {
    fn from(fields: PersonFields) -> Self {
        Self {
            id: None,
            first_name: Some(fields.first_name),
            last_name: Some(fields.last_name),
            age: fields.age.map(i64::from),
        }
    }
}

impl From<Person> for PersonPayload {
    fn from(person: Person) -> Self {
        Self {
            id: Some(person.id),
            ..Self::from(person.fields)
        }
    }
}
