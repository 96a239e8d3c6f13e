//! Identifier validation
//!
//! Table and column names are interpolated into generated SQL, so every name a
//! model declares is checked once when its definition boots.

use std::fmt;

use crate::query_builder::group_limit::{GROUP_LIMIT_ALIAS, GROUP_LIMIT_COUNTER};

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumeric and underscore allowed)
    InvalidCharacters(String),
    /// Name is too long (PostgreSQL limit is 63 characters)
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
    /// Name is a reserved SQL keyword or an identifier used by generated queries
    ReservedKeyword(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => write!(
                f,
                "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed",
                name
            ),
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => write!(
                f,
                "Name '{}' is too long: {} characters (max {})",
                name, length, max_length
            ),
            ValidationError::Empty => write!(f, "Name cannot be empty"),
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
            ValidationError::ReservedKeyword(name) => {
                write!(f, "Name '{}' is reserved", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A table or column name that is safe to interpolate into SQL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedIdentifier(String);

impl ValidatedIdentifier {
    /// PostgreSQL identifier length limit
    pub const MAX_LENGTH: usize = 63;

    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let first = name.chars().next().ok_or(ValidationError::Empty)?;

        if name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                name: name.to_string(),
                length: name.len(),
                max_length: Self::MAX_LENGTH,
            });
        }

        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(ValidationError::InvalidStartCharacter(name.to_string()));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        if Self::is_reserved(name) {
            return Err(ValidationError::ReservedKeyword(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_reserved(name: &str) -> bool {
        // Keywords that cannot appear unquoted as a table or column name,
        // plus the aliases the grouped select renders.
        const RESERVED: &[&str] = &[
            "ALL", "AND", "ANY", "AS", "ASC", "BOTH", "CASE", "CHECK", "COLUMN", "CONSTRAINT",
            "CREATE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DO", "ELSE", "END", "EXCEPT",
            "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN",
            "INSERT", "INTO", "IS", "JOIN", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR",
            "ORDER", "PRIMARY", "REFERENCES", "RETURNING", "SELECT", "TABLE", "THEN", "TO",
            "TRUE", "UNION", "UNIQUE", "UPDATE", "USER", "USING", "WHEN", "WHERE", "WINDOW",
            "WITH",
        ];

        let upper = name.to_ascii_uppercase();
        RESERVED.contains(&upper.as_str())
            || name.eq_ignore_ascii_case(GROUP_LIMIT_ALIAS)
            || name.eq_ignore_ascii_case(GROUP_LIMIT_COUNTER)
    }
}

impl fmt::Display for ValidatedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
