//! Database layer - supervised connection and guestbook queries
//!
//! # Design Principles
//!
//! - One connection, owned by one supervisor task - no Arc<Mutex<Connection>>
//! - Schema bootstrap is on the readiness path; nothing is served before it
//! - Values are always bound, identifiers are validated
//! - Dropped transports reconnect; other connection failures stop the service

pub mod connection;
pub mod error;
pub mod manager;
pub mod mysql;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connector, EntryConnection};
pub use error::{classify, ConnectionFault, DbError};
pub use manager::{ConnectionManager, ConnectionState, ManagerConfig, Supervisor};
pub use mysql::MySqlConnector;
pub use schema::{bootstrap_sql, DatabaseName};
