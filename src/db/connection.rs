//! SQLite connection management
//!
//! A `Database` keeps at most one idle connection. Callers check it out with
//! `connect()`; the returned guard puts it back when dropped.

use crate::config;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// SQLite busy handler wait before a locked database is reported.
    pub busy_timeout: Duration,
    /// Run `SELECT 1` on an idle connection before handing it out.
    pub pre_ping: bool,
    /// Maximum age of a connection that may be reused.
    pub recycle: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            busy_timeout: config::CONNECT_TIMEOUT,
            pre_ping: config::POOL_PRE_PING,
            recycle: config::POOL_RECYCLE,
        }
    }
}

struct IdleConnection {
    conn: Connection,
    opened_at: Instant,
}

pub struct Database {
    path: PathBuf,
    settings: ConnectionSettings,
    idle: Mutex<Option<IdleConnection>>,
}

impl Database {
    /// Create a handle for the database at `path`. No file is touched until
    /// the first `connect()`.
    pub fn new(path: impl AsRef<Path>, settings: ConnectionSettings) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            settings,
            idle: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Check out a connection, reusing the idle one when it is young enough
    /// and answers the health check.
    pub fn connect(&self) -> rusqlite::Result<PooledConnection<'_>> {
        let idle = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(idle) = idle {
            if idle.opened_at.elapsed() >= self.settings.recycle {
                debug!(
                    "Recycling connection to {} after {:?}",
                    self.path.display(),
                    idle.opened_at.elapsed()
                );
            } else if self.settings.pre_ping && !Self::ping(&idle.conn) {
                debug!("Discarding connection to {} that failed pre-ping", self.path.display());
            } else {
                return Ok(PooledConnection {
                    db: self,
                    conn: Some(idle.conn),
                    opened_at: idle.opened_at,
                });
            }
        }

        let conn = self.open()?;
        Ok(PooledConnection {
            db: self,
            conn: Some(conn),
            opened_at: Instant::now(),
        })
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.settings.busy_timeout)?;
        debug!("Opened connection to {}", self.path.display());
        Ok(conn)
    }

    fn ping(conn: &Connection) -> bool {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
    }

    fn release(&self, conn: Connection, opened_at: Instant) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        *idle = Some(IdleConnection { conn, opened_at });
    }
}

/// A checked-out connection. Dropping it returns the connection to its `Database`.
pub struct PooledConnection<'a> {
    db: &'a Database,
    conn: Option<Connection>,
    opened_at: Instant,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.db.release(conn, self.opened_at);
        }
    }
}
