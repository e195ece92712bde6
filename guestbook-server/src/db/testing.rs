//! In-memory connector for exercising the connection manager without MySQL.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};

use super::connection::{Connector, EntryConnection};
use super::schema::DatabaseName;
use super::DbError;
use crate::models::{EntryMessage, EntryName, GuestbookEntry, InsertReceipt};

/// Error injected into the next operation on the current connection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Transport-level failure of the given kind
    Io(io::ErrorKind),
    /// Malformed packet, a non-recoverable connection error
    Protocol,
    /// Statement failed but the connection is fine
    Statement,
}

impl Fault {
    fn into_error(self) -> sqlx::Error {
        match self {
            Self::Io(kind) => sqlx::Error::Io(io::Error::new(kind, "injected")),
            Self::Protocol => sqlx::Error::Protocol("injected".into()),
            Self::Statement => sqlx::Error::ColumnNotFound("injected".into()),
        }
    }
}

#[derive(Default)]
struct State {
    rows: Vec<GuestbookEntry>,
    next_id: i64,
    schema: Option<String>,
    connect_failures: u32,
    bootstrap_failures: u32,
    connect_attempts: u32,
    bootstrap_calls: u32,
    pending_fault: Option<Fault>,
}

/// Shared storage behind every fake connection.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connector(&self) -> FakeConnector {
        FakeConnector {
            backend: self.clone(),
        }
    }

    pub(crate) fn fail_connects(&self, n: u32) {
        self.lock().connect_failures = n;
    }

    pub(crate) fn fail_bootstraps(&self, n: u32) {
        self.lock().bootstrap_failures = n;
    }

    pub(crate) fn inject(&self, fault: Fault) {
        self.lock().pending_fault = Some(fault);
    }

    pub(crate) fn connect_attempts(&self) -> u32 {
        self.lock().connect_attempts
    }

    pub(crate) fn bootstrap_calls(&self) -> u32 {
        self.lock().bootstrap_calls
    }

    pub(crate) fn schema_exists(&self) -> bool {
        self.lock().schema.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake backend poisoned")
    }

    fn take_fault(&self) -> Result<(), sqlx::Error> {
        match self.lock().pending_fault.take() {
            Some(fault) => Err(fault.into_error()),
            None => Ok(()),
        }
    }
}

pub(crate) struct FakeConnector {
    backend: FakeBackend,
}

#[async_trait]
impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<FakeConnection, DbError> {
        let mut state = self.backend.lock();
        state.connect_attempts += 1;
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(DbError::Connect(sqlx::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused",
            ))));
        }
        Ok(FakeConnection {
            backend: self.backend.clone(),
        })
    }
}

pub(crate) struct FakeConnection {
    backend: FakeBackend,
}

#[async_trait]
impl EntryConnection for FakeConnection {
    async fn bootstrap_schema(&mut self, database: &DatabaseName) -> Result<(), DbError> {
        let mut state = self.backend.lock();
        state.bootstrap_calls += 1;
        if state.bootstrap_failures > 0 {
            state.bootstrap_failures -= 1;
            return Err(DbError::Schema(sqlx::Error::Protocol(
                "access denied for CREATE".into(),
            )));
        }
        state.schema = Some(database.as_str().to_owned());
        Ok(())
    }

    async fn list_entries(&mut self) -> Result<Vec<GuestbookEntry>, DbError> {
        self.backend.take_fault().map_err(DbError::Query)?;
        let mut rows = self.backend.lock().rows.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert_entry(
        &mut self,
        name: &EntryName,
        message: &EntryMessage,
    ) -> Result<InsertReceipt, DbError> {
        self.backend.take_fault().map_err(DbError::Query)?;
        let mut state = self.backend.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(GuestbookEntry {
            id,
            name: name.as_str().to_owned(),
            message: Some(message.as_str().to_owned()),
            // TIMESTAMP keeps whole seconds
            date: Utc::now().trunc_subsecs(0),
        });
        Ok(InsertReceipt {
            id: id as u64,
            affected_rows: 1,
        })
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        self.backend.take_fault().map_err(DbError::Query)
    }
}
