//! SQL identifier checks.
//!
//! Table and column names are spliced into statement text unquoted, so every name
//! that reaches the SQL generator must be a plain identifier.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result, SchemaErrorKind};

fn identifier_regex() -> Option<&'static Regex> {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

/// Check whether `name` can be used as an unquoted identifier.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_some_and(|re| re.is_match(name))
}

/// Validate `name`, reporting failures against `table`.
pub fn validate_identifier(table: &str, name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::schema(
            SchemaErrorKind::InvalidIdentifier,
            table,
            format!("`{}` is not a valid SQL identifier", name),
        ))
    }
}
