use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::StorageOptions;
use crate::note::{format_timestamp, parse_timestamp, Note};

#[cfg(test)]
pub(crate) mod memory;
mod schema;

pub use schema::SCHEMA_VERSION;
use schema::SchemaState;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or provisioned.
    #[error("opening note store {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    /// A read-all or clear-and-insert sweep failed part-way.
    #[error("note store sweep failed while {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Durable mirror of the note collection. Implementations replace their whole
/// contents on every save; there is no incremental patching.
pub trait NoteStore {
    fn load_all(&self) -> Result<Vec<Note>, StoreError>;
    fn replace_all(&self, notes: &[Note]) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    /// Opening is deferred to the first load or save so that open failures
    /// surface through the synchronizer.
    pub fn new(options: &StorageOptions) -> Self {
        Self {
            db_path: Arc::new(options.database_path.clone()),
            options: Arc::new(options.clone()),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn connect(&self) -> Result<Connection, StoreError> {
        let path = self.db_path.as_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.open_error(err))?;
        }
        let conn = Connection::open(path).map_err(|err| self.open_error(err))?;
        prepare_connection(&conn, &self.options).map_err(|err| self.open_error(err))?;
        match schema::apply(&conn).map_err(|err| self.open_error(err))? {
            SchemaState::Provisioned => {
                tracing::info!(path = %path.display(), "provisioned note store");
            }
            SchemaState::Current => {}
            SchemaState::Unsupported(version) => {
                return Err(self.open_error(format!(
                    "unsupported schema version {version} (expected {SCHEMA_VERSION})"
                )));
            }
        }
        Ok(conn)
    }

    fn open_error(&self, err: impl Into<BoxError>) -> StoreError {
        StoreError::Open {
            path: self.db_path.to_path_buf(),
            source: err.into(),
        }
    }
}

impl NoteStore for StorageHandle {
    fn load_all(&self) -> Result<Vec<Note>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, content, created_at, updated_at
                 FROM notes
                 ORDER BY id",
            )
            .map_err(sweep_error("preparing note query"))?;
        let notes = stmt
            .query_map([], note_from_row)
            .map_err(sweep_error("reading notes"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sweep_error("reading notes"))?;
        Ok(notes)
    }

    fn replace_all(&self, notes: &[Note]) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(sweep_error("starting sweep"))?;
        tx.execute("DELETE FROM notes", [])
            .map_err(sweep_error("clearing notes"))?;
        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO notes (id, title, content, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(sweep_error("preparing insert"))?;
            for note in notes {
                insert
                    .execute(params![
                        note.id,
                        note.title,
                        note.content,
                        format_timestamp(note.created_at),
                        format_timestamp(note.updated_at),
                    ])
                    .map_err(sweep_error("inserting note"))?;
            }
        }
        tx.commit().map_err(sweep_error("committing sweep"))?;
        tracing::debug!(count = notes.len(), "note store sweep committed");
        Ok(())
    }
}

fn sweep_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Write { operation, source }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let id: i64 = row.get(0)?;
    let created_at = timestamp_column(row, 3)?;
    let mut updated_at = timestamp_column(row, 4)?;
    if updated_at < created_at {
        tracing::warn!(note_id = id, "updated_at precedes created_at, clamping");
        updated_at = created_at;
    }
    Ok(Note {
        id,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at,
        updated_at,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn prepare_connection(conn: &Connection, options: &StorageOptions) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        options.wal_autocheckpoint.to_string(),
    )?;
    Ok(())
}
