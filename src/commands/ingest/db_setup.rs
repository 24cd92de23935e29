use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::util::{ensure_directory, now_utc_string};

pub(crate) const DB_SCHEMA_VERSION: &str = "1.0.0";

/// Poster tables in drop order: children before their parent.
pub(crate) const POSTER_TABLES: [&str; 4] =
    ["poster_figure", "poster_table", "poster_blocks", "poster_info"];

const CREATE_POSTER_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS metadata (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS poster_info (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      poster_id TEXT UNIQUE,
      title TEXT,
      authors TEXT NOT NULL DEFAULT '[]',
      source_url TEXT,
      page_url TEXT,
      text_content TEXT,
      local_path_md TEXT,
      local_path_json TEXT
    );

    CREATE TABLE IF NOT EXISTS poster_blocks (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      poster_id INTEGER NOT NULL,
      block_label TEXT,
      block_content TEXT,
      block_bbox TEXT,
      FOREIGN KEY(poster_id) REFERENCES poster_info(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS poster_figure (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      poster_id INTEGER NOT NULL,
      figure_path TEXT NOT NULL,
      FOREIGN KEY(poster_id) REFERENCES poster_info(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS poster_table (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      poster_id INTEGER NOT NULL,
      table_markdown TEXT NOT NULL,
      FOREIGN KEY(poster_id) REFERENCES poster_info(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_poster_blocks_poster ON poster_blocks(poster_id);
    CREATE INDEX IF NOT EXISTS idx_poster_figure_poster ON poster_figure(poster_id);
    CREATE INDEX IF NOT EXISTS idx_poster_table_poster ON poster_table(poster_id);
";

pub(crate) fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

pub(crate) fn open_store_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    enable_foreign_keys(connection)
}

pub(crate) fn enable_foreign_keys(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to set foreign_keys=ON")
}

pub(crate) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(CREATE_POSTER_TABLES_SQL)
        .context("failed to create poster tables")?;
    record_schema_metadata(connection)
}

pub(crate) fn reset_schema(connection: &mut Connection) -> Result<()> {
    let tx = connection
        .transaction()
        .context("failed to open schema reset transaction")?;

    for table in POSTER_TABLES {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
            .with_context(|| format!("failed to drop table {table}"))?;
    }
    ensure_schema(&tx)?;

    tx.commit().context("failed to commit schema reset")?;
    info!(tables = POSTER_TABLES.len(), "poster tables reset");
    Ok(())
}

fn record_schema_metadata(connection: &Connection) -> Result<()> {
    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
