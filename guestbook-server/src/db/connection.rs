//! Connection seams used by the connection manager.
//!
//! The manager is generic over a [`Connector`] so the lifecycle logic does
//! not depend on a live MySQL server.

use async_trait::async_trait;

use super::schema::DatabaseName;
use super::DbError;
use crate::models::{EntryMessage, EntryName, GuestbookEntry, InsertReceipt};

/// Opens new connections to the guestbook store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: EntryConnection;

    /// Open one connection. Errors are reported as [`DbError::Connect`].
    async fn connect(&self) -> Result<Self::Connection, DbError>;
}

/// One open connection to the guestbook store.
#[async_trait]
pub trait EntryConnection: Send + 'static {
    /// Create database and table if absent and select the database.
    async fn bootstrap_schema(&mut self, database: &DatabaseName) -> Result<(), DbError>;

    /// All entries, newest first.
    async fn list_entries(&mut self) -> Result<Vec<GuestbookEntry>, DbError>;

    /// Insert one entry with bound parameters.
    async fn insert_entry(
        &mut self,
        name: &EntryName,
        message: &EntryMessage,
    ) -> Result<InsertReceipt, DbError>;

    /// Liveness check.
    async fn ping(&mut self) -> Result<(), DbError>;
}
