//! guestbook-server: backend for the guestbook demo application
//!
//! Resolves database credentials from a secret store at startup, keeps one
//! supervised MySQL connection alive (reconnecting when the transport
//! drops), and serves guestbook entries over HTTP.

pub mod config;
pub mod credentials;
pub mod db;
pub mod http;
pub mod models;
pub mod secrets;
pub mod startup;
pub mod state;

pub use config::{ConfigError, GuestbookConfig};
pub use db::{ConnectionManager, ConnectionState, DbError};
pub use startup::{start, StartupError};
pub use state::AppState;
