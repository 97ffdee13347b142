use rusqlite::Connection;

/// The only layout ever defined for the note store.
pub const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Provisioned,
    Current,
    Unsupported(i64),
}

pub fn apply(conn: &Connection) -> rusqlite::Result<SchemaState> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Ok(SchemaState::Unsupported(version));
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    if version == SCHEMA_VERSION {
        return Ok(SchemaState::Current);
    }
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(SchemaState::Provisioned)
}
