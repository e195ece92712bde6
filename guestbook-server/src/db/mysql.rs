//! MySQL implementation of the connection seams.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor, Row};

use super::connection::{Connector, EntryConnection};
use super::schema::{bootstrap_sql, DatabaseName};
use super::DbError;
use crate::credentials::DbCredentials;
use crate::models::{EntryMessage, EntryName, GuestbookEntry, InsertReceipt};

/// Opens single MySQL connections from resolved credentials.
///
/// No default database is set on connect; the schema bootstrap creates it
/// and issues `USE`, so a fresh server works without manual setup.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    options: MySqlConnectOptions,
}

impl MySqlConnector {
    pub fn new(credentials: &DbCredentials) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(&credentials.password);

        Self { options }
    }

    pub fn with_options(options: MySqlConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Connection = MySqlConnection;

    async fn connect(&self) -> Result<MySqlConnection, DbError> {
        MySqlConnection::connect_with(&self.options)
            .await
            .map_err(DbError::Connect)
    }
}

#[async_trait]
impl EntryConnection for MySqlConnection {
    async fn bootstrap_schema(&mut self, database: &DatabaseName) -> Result<(), DbError> {
        // raw_sql uses the text protocol, which accepts several statements
        let sql = bootstrap_sql(database);
        Executor::execute(&mut *self, sqlx::raw_sql(&sql))
            .await
            .map_err(DbError::Schema)?;
        Ok(())
    }

    async fn list_entries(&mut self) -> Result<Vec<GuestbookEntry>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, message, date
            FROM guestbook
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&mut *self)
        .await
        .map_err(DbError::Query)?;

        rows.into_iter()
            .map(|r| -> Result<GuestbookEntry, sqlx::Error> {
                Ok(GuestbookEntry {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    message: r.try_get("message")?,
                    date: r.try_get("date")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::Query)
    }

    async fn insert_entry(
        &mut self,
        name: &EntryName,
        message: &EntryMessage,
    ) -> Result<InsertReceipt, DbError> {
        let result = sqlx::query("INSERT INTO guestbook (name, message) VALUES (?, ?)")
            .bind(name.as_str())
            .bind(message.as_str())
            .execute(&mut *self)
            .await
            .map_err(DbError::Query)?;

        Ok(InsertReceipt {
            id: result.last_insert_id(),
            affected_rows: result.rows_affected(),
        })
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        Connection::ping(self).await.map_err(DbError::Query)
    }
}
