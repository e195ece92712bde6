//! Connection lifecycle manager.
//!
//! A single supervisor task owns the database connection. Request handlers
//! hold a cloneable [`ConnectionManager`] and send commands to the
//! supervisor, which serves them one at a time on the live connection.
//! While the supervisor is (re)connecting, commands wait in the channel, so
//! no caller can observe a connection that is being replaced.
//!
//! Lifecycle:
//! 1. Open a connection and bootstrap the schema. Either failing is logged,
//!    followed by a fixed `retry_interval` sleep and a fresh attempt, with
//!    no attempt limit. Retrying stops once every handle is dropped.
//! 2. Serve commands. Every query error is returned to its caller. If the
//!    error shows the transport was dropped, go back to 1; if it is any
//!    other connection-level error, stop with [`DbError::ConnectionFatal`].
//! 3. Between commands, ping every `heartbeat_interval` to notice drops
//!    while idle.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::connection::{Connector, EntryConnection};
use super::error::ConnectionFault;
use super::schema::DatabaseName;
use super::DbError;
use crate::models::{EntryMessage, EntryName, GuestbookEntry, InsertReceipt};

/// Fixed delay between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

/// Idle liveness ping period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Commands that may wait for a connection before backpressure applies.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Manager tuning.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub database: DatabaseName,
    pub retry_interval: Duration,
    pub heartbeat_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseName::default(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Published connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First connection not yet established
    Connecting,
    /// Connected with schema in place
    Ready,
    /// Transport dropped, re-establishing
    Reconnecting,
    /// Supervisor stopped
    Stopped,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Reconnecting => "reconnecting",
            Self::Stopped => "stopped",
        }
    }
}

enum Command {
    List {
        reply: oneshot::Sender<Result<Vec<GuestbookEntry>, DbError>>,
    },
    Add {
        name: EntryName,
        message: EntryMessage,
        reply: oneshot::Sender<Result<InsertReceipt, DbError>>,
    },
}

/// Handle to the connection supervisor.
///
/// Cheap to clone. When every handle is dropped the supervisor finishes
/// its current command, or abandons its current retry, and exits.
#[derive(Clone)]
pub struct ConnectionManager {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
}

/// Running supervisor task.
///
/// Resolves to `Ok(())` after a clean shutdown or to
/// [`DbError::ConnectionFatal`] when the connection failed unrecoverably.
pub type Supervisor = JoinHandle<Result<(), DbError>>;

impl ConnectionManager {
    /// Spawn the supervisor task and return a handle to it.
    pub fn spawn<C: Connector>(connector: C, config: ManagerConfig) -> (Self, Supervisor) {
        let (commands, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);

        let task = SupervisorTask {
            connector,
            config,
            commands: rx,
            state: state_tx,
        };
        let handle = tokio::spawn(task.run());

        (Self { commands, state }, handle)
    }

    /// All entries, newest first.
    pub async fn list_entries(&self) -> Result<Vec<GuestbookEntry>, DbError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::List { reply }).await?;
        rx.await.map_err(|_| DbError::Unavailable)?
    }

    /// Insert one entry.
    pub async fn add_entry(
        &self,
        name: EntryName,
        message: EntryMessage,
    ) -> Result<InsertReceipt, DbError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Add {
            name,
            message,
            reply,
        })
        .await?;
        rx.await.map_err(|_| DbError::Unavailable)?
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait until the connection is ready.
    ///
    /// Returns [`DbError::Unavailable`] if the supervisor stops first.
    pub async fn wait_ready(&self) -> Result<(), DbError> {
        let mut state = self.state.clone();
        let observed = state
            .wait_for(|s| matches!(s, ConnectionState::Ready | ConnectionState::Stopped))
            .await
            .map_err(|_| DbError::Unavailable)?;

        match *observed {
            ConnectionState::Ready => Ok(()),
            _ => Err(DbError::Unavailable),
        }
    }

    async fn send(&self, command: Command) -> Result<(), DbError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DbError::Unavailable)
    }
}

/// Why the serve loop returned.
enum Outcome {
    /// Every handle dropped
    Shutdown,
    /// Transport dropped, reconnect
    Lost,
    /// Unrecoverable connection error
    Fatal(DbError),
}

struct SupervisorTask<C: Connector> {
    connector: C,
    config: ManagerConfig,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<ConnectionState>,
}

impl<C: Connector> SupervisorTask<C> {
    async fn run(mut self) -> Result<(), DbError> {
        let result = self.supervise().await;
        self.state.send_replace(ConnectionState::Stopped);
        result
    }

    async fn supervise(&mut self) -> Result<(), DbError> {
        loop {
            let Some(mut conn) = self.establish().await else {
                info!("All handles dropped before the database was reachable");
                return Ok(());
            };
            self.state.send_replace(ConnectionState::Ready);

            match self.serve(&mut conn).await {
                Outcome::Shutdown => {
                    info!("All handles dropped, closing database connection");
                    return Ok(());
                }
                Outcome::Lost => {
                    warn!("Database connection lost, reconnecting");
                    self.state.send_replace(ConnectionState::Reconnecting);
                }
                Outcome::Fatal(err) => {
                    error!(error = %err, "Unrecoverable database connection error");
                    return Err(err);
                }
            }
        }
    }

    /// Open a connection and bootstrap the schema, retrying forever.
    ///
    /// Returns `None` once every handle is dropped, since no one is left
    /// to serve.
    async fn establish(&self) -> Option<C::Connection> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.try_establish().await {
                Ok(conn) => {
                    info!(
                        attempt,
                        database = %self.config.database,
                        "Connected to database, schema ready"
                    );
                    return Some(conn);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        error = %err,
                        retry_ms = self.config.retry_interval.as_millis() as u64,
                        "Database not ready, retrying"
                    );
                    tokio::select! {
                        _ = sleep(self.config.retry_interval) => {}
                        _ = self.state.closed() => return None,
                    }
                }
            }
        }
    }

    async fn try_establish(&self) -> Result<C::Connection, DbError> {
        let mut conn = self.connector.connect().await?;
        debug!(database = %self.config.database, "Bootstrapping schema");
        conn.bootstrap_schema(&self.config.database).await?;
        Ok(conn)
    }

    async fn serve(&mut self, conn: &mut C::Connection) -> Outcome {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return Outcome::Shutdown;
                    };
                    if let Some(outcome) = execute(conn, command).await {
                        return outcome;
                    }
                    heartbeat.reset();
                }
                _ = heartbeat.tick() => {
                    if let Err(err) = conn.ping().await {
                        debug!(error = %err, "Heartbeat failed");
                        return match err.fault() {
                            Some(ConnectionFault::Lost) => Outcome::Lost,
                            _ => Outcome::Fatal(fatal(err)),
                        };
                    }
                }
            }
        }
    }
}

/// Run one command and reply. Returns an outcome when the connection can
/// no longer be used.
async fn execute<T: EntryConnection>(conn: &mut T, command: Command) -> Option<Outcome> {
    match command {
        Command::List { reply } => settle(conn.list_entries().await, reply),
        Command::Add {
            name,
            message,
            reply,
        } => settle(conn.insert_entry(&name, &message).await, reply),
    }
}

/// Deliver a result to its caller and decide whether the connection
/// survives it.
///
/// On a fatal fault the caller gets [`DbError::Unavailable`] and the
/// supervisor keeps the driver error as its exit reason.
fn settle<T>(
    result: Result<T, DbError>,
    reply: oneshot::Sender<Result<T, DbError>>,
) -> Option<Outcome> {
    let fault = result.as_ref().err().and_then(DbError::fault);

    // Receiver may have gone away; the outcome still applies
    match (fault, result) {
        (Some(ConnectionFault::Fatal), Err(err)) => {
            let _ = reply.send(Err(DbError::Unavailable));
            Some(Outcome::Fatal(fatal(err)))
        }
        (Some(ConnectionFault::Lost), result) => {
            let _ = reply.send(result);
            Some(Outcome::Lost)
        }
        (_, result) => {
            let _ = reply.send(result);
            None
        }
    }
}

fn fatal(err: DbError) -> DbError {
    match err {
        DbError::Query(e) | DbError::Connect(e) | DbError::Schema(e) => DbError::ConnectionFatal(e),
        other => other,
    }
}
