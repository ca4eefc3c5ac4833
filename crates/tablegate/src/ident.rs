//! SQL identifier validation.
//!
//! Column and table names cannot be bound as parameters, so the compiler
//! writes them into the SQL text verbatim. Anything that reaches the compiler
//! has to pass [`Ident::parse`] first.
//!
//! Accepted form: one or more `.`-separated parts, each matching
//! `[A-Za-z_][A-Za-z0-9_$]*`. Quoted identifiers are not accepted: client
//! supplied names never need them.

use crate::error::{GateError, GateResult};
use std::fmt;

/// A validated, possibly dotted, SQL identifier (`users`, `public.users`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    /// Validate `s` as an identifier.
    pub fn parse(s: &str) -> GateResult<Self> {
        if s.is_empty() {
            return Err(GateError::validation("Identifier cannot be empty"));
        }

        for part in s.split('.') {
            let mut chars = part.chars();
            let Some(first) = chars.next() else {
                return Err(GateError::validation(format!(
                    "Empty identifier segment in '{s}'"
                )));
            };
            if first != '_' && !first.is_ascii_alphabetic() {
                return Err(GateError::validation(format!(
                    "Invalid identifier start character: '{first}'"
                )));
            }
            if let Some(c) = chars.find(|&c| c != '_' && c != '$' && !c.is_ascii_alphanumeric()) {
                return Err(GateError::validation(format!(
                    "Invalid character in identifier: '{c}'"
                )));
            }
        }

        Ok(Self(s.to_string()))
    }

    /// The identifier as written in SQL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `s` may be written into SQL text as a column or table name.
pub fn is_valid_ident(s: &str) -> bool {
    Ident::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        assert_eq!(Ident::parse("users").unwrap().as_str(), "users");
    }

    #[test]
    fn ident_dotted() {
        assert_eq!(Ident::parse("public.users").unwrap().to_string(), "public.users");
    }

    #[test]
    fn ident_with_dollar_and_underscore() {
        assert!(is_valid_ident("_my_var$1"));
        assert!(is_valid_ident("analyst_recommendations"));
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
    }

    #[test]
    fn ident_rejects_start_digit() {
        assert!(!is_valid_ident("1table"));
    }

    #[test]
    fn ident_rejects_injection_attempts() {
        assert!(!is_valid_ident("name; DROP TABLE users"));
        assert!(!is_valid_ident("name = name OR 1=1 --"));
        assert!(!is_valid_ident("my table"));
        assert!(!is_valid_ident("\"quoted\""));
        assert!(!is_valid_ident("a(b)"));
    }

    #[test]
    fn ident_rejects_bad_dots() {
        assert!(!is_valid_ident("schema..table"));
        assert!(!is_valid_ident("schema."));
        assert!(!is_valid_ident(".table"));
    }

    #[test]
    fn ident_error_names_character() {
        let err = Ident::parse("na-me").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Invalid character in identifier: '-'");
    }
}
