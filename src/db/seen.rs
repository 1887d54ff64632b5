use crate::db::connection::{init_db, Database};
use crate::domain::SeenListingsLog;
use crate::errors::PipelineError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use std::path::PathBuf;

/// Durable home of the seen-listings log.
///
/// Read once at run start, written once at run end. Writes are a superset:
/// nothing already stored is dropped or re-stamped.
pub trait SeenStore {
    /// Fails with `PipelineError::DuplicateState` when the stored log cannot
    /// be read.
    fn load(&mut self) -> Result<SeenListingsLog, PipelineError>;

    /// Stores every entry of `log` not stored yet. Returns how many were added.
    fn persist(&mut self, log: &SeenListingsLog) -> Result<usize, PipelineError>;

    /// Deletes entries logged before `cutoff`. Only called on operator request.
    fn prune_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, PipelineError>;

    /// Sets unreadable state aside and starts an empty log in its place.
    /// Called before persisting after `load` failed with `DuplicateState`.
    fn reset(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError>;
}

pub struct SqliteSeenStore {
    db: Database,
}

impl SqliteSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            db: Database::new(path),
        }
    }

    /// Where an unreadable store file is moved by `reset`.
    pub fn quarantine_path(&self, at: DateTime<Utc>) -> PathBuf {
        let mut name = self.db.path().as_os_str().to_owned();
        name.push(format!(".corrupt-{}", at.format("%Y%m%d_%H%M%S")));
        PathBuf::from(name)
    }
}

fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl SeenStore for SqliteSeenStore {
    fn load(&mut self) -> Result<SeenListingsLog, PipelineError> {
        let corrupt = |e: rusqlite::Error| PipelineError::DuplicateState(e.to_string());

        self.db
            .with_conn(|conn| {
                init_db(conn).map_err(corrupt)?;

                let mut stmt = conn
                    .prepare("SELECT id, first_seen_at FROM seen_listings")
                    .map_err(corrupt)?;

                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })
                    .map_err(corrupt)?;

                let mut entries = Vec::new();
                for r in rows {
                    let (id, raw_at) = r.map_err(corrupt)?;
                    let at = DateTime::parse_from_rfc3339(&raw_at)
                        .map_err(|e| {
                            PipelineError::DuplicateState(format!(
                                "bad timestamp '{raw_at}' for {id}: {e}"
                            ))
                        })?
                        .with_timezone(&Utc);
                    entries.push((id, at));
                }

                Ok(SeenListingsLog::from_entries(entries))
            })
            .map_err(|e| match e {
                PipelineError::Store(msg) => PipelineError::DuplicateState(msg),
                other => other,
            })
    }

    fn persist(&mut self, log: &SeenListingsLog) -> Result<usize, PipelineError> {
        let store_err = |e: rusqlite::Error| PipelineError::Store(e.to_string());

        self.db.with_conn(|conn| {
            init_db(conn).map_err(store_err)?;

            let tx = conn.transaction().map_err(store_err)?;
            let mut added = 0;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT OR IGNORE INTO seen_listings (id, first_seen_at) VALUES (?1, ?2)",
                    )
                    .map_err(store_err)?;

                for (id, at) in log.iter() {
                    added += stmt.execute(params![id, to_db_time(at)]).map_err(store_err)?;
                }
            }
            tx.commit().map_err(store_err)?;

            Ok(added)
        })
    }

    fn prune_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, PipelineError> {
        let store_err = |e: rusqlite::Error| PipelineError::Store(e.to_string());

        self.db.with_conn(|conn| {
            init_db(conn).map_err(store_err)?;
            conn.execute(
                "DELETE FROM seen_listings WHERE first_seen_at < ?1",
                params![to_db_time(cutoff)],
            )
            .map_err(store_err)
        })
    }

    fn reset(&mut self, at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.db.close();

        let path = self.db.path().to_path_buf();
        if path.exists() {
            let aside = self.quarantine_path(at);
            std::fs::rename(&path, &aside).map_err(|e| {
                PipelineError::Store(format!(
                    "Failed to move {} to {}: {e}",
                    path.display(),
                    aside.display()
                ))
            })?;
            tracing::warn!(
                from = %path.display(),
                to = %aside.display(),
                "unreadable seen log moved aside"
            );
        }
        Ok(())
    }
}

/// In-memory store for pipeline tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    pub log: SeenListingsLog,
    pub persist_calls: usize,
}

#[cfg(test)]
impl MemorySeenStore {
    pub fn with_log(log: SeenListingsLog) -> Self {
        Self {
            log,
            persist_calls: 0,
        }
    }
}

#[cfg(test)]
impl SeenStore for MemorySeenStore {
    fn load(&mut self) -> Result<SeenListingsLog, PipelineError> {
        Ok(self.log.clone())
    }

    fn persist(&mut self, log: &SeenListingsLog) -> Result<usize, PipelineError> {
        self.persist_calls += 1;
        let mut added = 0;
        for (id, at) in log.iter() {
            if self.log.record(id.to_string(), at) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn prune_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, PipelineError> {
        Ok(self.log.prune_before(cutoff))
    }

    fn reset(&mut self, _at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.log = SeenListingsLog::new();
        Ok(())
    }
}
