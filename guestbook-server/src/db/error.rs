//! Database error type and connection fault classification.

use std::io;

use sqlx::mysql::MySqlDatabaseError;

/// MySQL client error: server has gone away.
const CR_SERVER_GONE_ERROR: u16 = 2006;
/// MySQL client error: lost connection to server during query.
const CR_SERVER_LOST: u16 = 2013;
/// Server closed the connection for inactivity (MySQL 8.0.24+).
const ER_CLIENT_INTERACTION_TIMEOUT: u16 = 4031;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Opening the connection failed (retried by the manager)
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// Schema bootstrap failed (retried by the manager)
    #[error("schema bootstrap failed: {0}")]
    Schema(#[source] sqlx::Error),

    /// A read or write failed; returned to the caller, never retried
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// The established connection failed in a way that is not a dropped
    /// transport; the manager stops
    #[error("unrecoverable connection error: {0}")]
    ConnectionFatal(#[source] sqlx::Error),

    /// The connection manager is no longer running
    #[error("connection manager is not running")]
    Unavailable,
}

impl DbError {
    /// Underlying driver error, if any.
    pub fn sqlx(&self) -> Option<&sqlx::Error> {
        match self {
            Self::Connect(e) | Self::Schema(e) | Self::Query(e) | Self::ConnectionFatal(e) => {
                Some(e)
            }
            Self::Unavailable => None,
        }
    }

    /// Fault class of the underlying driver error.
    pub fn fault(&self) -> Option<ConnectionFault> {
        self.sqlx().and_then(classify)
    }
}

/// How a driver error affects the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFault {
    /// Transport dropped; recoverable by reconnecting
    Lost,
    /// Connection-level failure with no recovery path
    Fatal,
}

/// Classify a driver error.
///
/// Returns `None` for statement-level errors (bad SQL, decode failures,
/// constraint violations) that leave the connection usable.
pub fn classify(err: &sqlx::Error) -> Option<ConnectionFault> {
    match err {
        sqlx::Error::Io(e) if is_lost_io(e.kind()) => Some(ConnectionFault::Lost),
        sqlx::Error::Io(_) => Some(ConnectionFault::Fatal),
        sqlx::Error::Database(db) => {
            let number = db.try_downcast_ref::<MySqlDatabaseError>()?.number();
            matches!(
                number,
                CR_SERVER_GONE_ERROR | CR_SERVER_LOST | ER_CLIENT_INTERACTION_TIMEOUT
            )
            .then_some(ConnectionFault::Lost)
        }
        sqlx::Error::Protocol(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => Some(ConnectionFault::Fatal),
        _ => None,
    }
}

fn is_lost_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err(kind: io::ErrorKind) -> sqlx::Error {
        sqlx::Error::Io(io::Error::new(kind, "test"))
    }

    #[test]
    fn dropped_transport_is_lost() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::NotConnected,
        ] {
            assert_eq!(classify(&io_err(kind)), Some(ConnectionFault::Lost), "{kind:?}");
        }
    }

    #[test]
    fn other_connection_errors_are_fatal() {
        assert_eq!(
            classify(&io_err(io::ErrorKind::PermissionDenied)),
            Some(ConnectionFault::Fatal)
        );
        assert_eq!(
            classify(&sqlx::Error::Protocol("bad packet".into())),
            Some(ConnectionFault::Fatal)
        );
        assert_eq!(classify(&sqlx::Error::WorkerCrashed), Some(ConnectionFault::Fatal));
    }

    #[test]
    fn statement_errors_keep_connection() {
        assert_eq!(classify(&sqlx::Error::RowNotFound), None);
        assert_eq!(classify(&sqlx::Error::ColumnNotFound("date".into())), None);
    }

    #[test]
    fn db_error_exposes_fault() {
        let err = DbError::Query(io_err(io::ErrorKind::BrokenPipe));
        assert_eq!(err.fault(), Some(ConnectionFault::Lost));
        assert_eq!(DbError::Unavailable.fault(), None);
    }
}
