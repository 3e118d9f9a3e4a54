use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::ServerError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

/// Handle to the document database. Cheap to clone; every thread that touches
/// it opens its own connection on first use.
#[derive(Debug, Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ServerError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| ServerError::DbError(format!("Open DB failed: {e}")))?;
                    conn.busy_timeout(BUSY_TIMEOUT)
                        .map_err(|e| ServerError::DbError(format!("Busy timeout failed: {e}")))?;
                    slots.insert(self.path.clone(), conn);
                }
                let conn = slots.get_mut(&self.path).ok_or(ServerError::InternalError)?;
                f(conn)
            })
            .map_err(|_| ServerError::InternalError)?
    }
}

/// Apply the document schema. Safe to run on every start.
pub fn init_db(db: &Database) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| ServerError::DbError(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    tracing::info!(path = db.path(), "database initialized");
    Ok(())
}
