//! Translation of free-text queries into index terms.

/// A person field that a query term can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Id,
    FirstName,
    LastName,
    Age,
}

impl SearchField {
    /// Field name as it appears in JSON and in `field:value` query terms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Age => "age",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "person_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Age => "age",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "firstName" => Some(Self::FirstName),
            "lastName" => Some(Self::LastName),
            "age" => Some(Self::Age),
            _ => None,
        }
    }
}

/// One token to match, optionally restricted to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub field: Option<SearchField>,
    pub token: String,
}

/// Split a query into alphanumeric tokens.
///
/// `field:value` restricts the tokens of `value` to that field when the field
/// is known; otherwise the whole term is treated as plain text. Punctuation
/// and query operators are dropped, so no input can produce an invalid query.
pub fn parse_query(query: &str) -> Vec<QueryTerm> {
    let mut terms = Vec::new();

    for word in query.split_whitespace() {
        let (field, text) = match word.split_once(':') {
            Some((name, value)) => match SearchField::from_str(name) {
                Some(field) => (Some(field), value),
                None => (None, word),
            },
            None => (None, word),
        };

        terms.extend(
            text.split(|c: char| !c.is_alphanumeric())
                .filter(|token| !token.is_empty())
                .map(|token| QueryTerm {
                    field,
                    token: token.to_lowercase(),
                }),
        );
    }

    terms
}
