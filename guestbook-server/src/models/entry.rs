//! Guestbook entry and validated insert input.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ValidationError;

/// Maximum length of a name, matching the `VARCHAR(32)` column.
pub const MAX_NAME_CHARS: usize = 32;

/// Maximum length of a message in bytes, matching MySQL `TEXT`.
pub const MAX_MESSAGE_BYTES: usize = 65_535;

/// A persisted guestbook row.
///
/// `id` and `date` are assigned by the storage engine and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestbookEntry {
    pub id: i64,
    pub name: String,
    pub message: Option<String>,
    pub date: DateTime<Utc>,
}

/// Storage engine acknowledgement for an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertReceipt {
    /// Auto-increment id generated for the new row
    pub id: u64,
    pub affected_rows: u64,
}

/// Validated entry author name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryName(String);

impl EntryName {
    /// Create a new name.
    ///
    /// # Rules
    /// - Not empty or whitespace-only
    /// - Max 32 characters (not bytes, the column is character-counted)
    ///
    /// # Example
    /// ```
    /// use guestbook_server::models::EntryName;
    ///
    /// assert!(EntryName::new("Alice").is_ok());
    /// assert!(EntryName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        if trimmed.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
                unit: "characters",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated entry message. Empty messages are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryMessage(String);

impl EntryMessage {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.len() > MAX_MESSAGE_BYTES {
            return Err(ValidationError::TooLong {
                field: "message",
                max: MAX_MESSAGE_BYTES,
                unit: "bytes",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
