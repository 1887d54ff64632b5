use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Handle on the SQLite file backing the seen-listings log.
///
/// The connection is opened lazily so that a corrupt file is only noticed
/// when the log is actually read.
pub struct Database {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops the open connection; the next `with_conn` reopens the file.
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Provides a mutable connection to the closure, opening it on first use.
    pub fn with_conn<F, T>(&mut self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&mut Connection) -> Result<T, PipelineError>,
    {
        if self.conn.is_none() {
            let conn = Connection::open(&self.path)
                .map_err(|e| PipelineError::Store(format!("Open DB failed: {e}")))?;
            self.conn = Some(conn);
        }

        match self.conn.as_mut() {
            Some(conn) => f(conn),
            None => Err(PipelineError::Store("connection unavailable".into())),
        }
    }
}

/// Applies the bundled schema. Idempotent.
pub fn init_db(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
