//! Schema bootstrap DDL.
//!
//! MySQL cannot bind identifiers as parameters, so the database name is
//! validated before it is interpolated.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ValidationError;

/// Default database name when `DATABASE` is unset.
pub const DEFAULT_DATABASE: &str = "guestbook";

/// Unquoted MySQL identifier, max 64 characters.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,64}$").expect("invalid identifier regex"));

/// Validated database name, safe to splice into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "database name" });
        }

        if !IDENT_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "database name",
                reason: "only alphanumeric and '_' allowed, max 64 characters",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DatabaseName {
    fn default() -> Self {
        Self(DEFAULT_DATABASE.to_owned())
    }
}

impl std::fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Multi-statement DDL creating the database and the `guestbook` table if
/// absent, then selecting the database for the session.
///
/// Every statement is idempotent; running it twice leaves the schema as
/// running it once.
pub fn bootstrap_sql(database: &DatabaseName) -> String {
    format!(
        r#"CREATE DATABASE IF NOT EXISTS `{db}`;
CREATE TABLE IF NOT EXISTS `{db}`.`guestbook` (
    `id` INT NOT NULL AUTO_INCREMENT,
    `name` VARCHAR(32) NOT NULL,
    `message` TEXT NULL,
    `date` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (`id`));
USE `{db}`;"#,
        db = database.as_str()
    )
}
