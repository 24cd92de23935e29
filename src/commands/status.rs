use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::ingest::{POSTER_TABLES, count_rows, open_store_read_only};
use crate::util::resolve_db_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CountBucket {
    pub value: i64,
    pub posters: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct StoreStatus {
    pub db_schema_version: Option<String>,
    pub db_updated_at: Option<String>,
    pub table_counts: Vec<(String, i64)>,
    pub by_author_count: Vec<CountBucket>,
    pub by_table_count: Vec<CountBucket>,
    pub by_figure_count: Vec<CountBucket>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = open_store_read_only(&db_path)?;
    let status = collect_status(&connection)?;

    info!(
        path = %db_path.display(),
        schema_version = %status.db_schema_version.clone().unwrap_or_default(),
        updated_at = %status.db_updated_at.clone().unwrap_or_default(),
        "database status"
    );
    for (table, rows) in &status.table_counts {
        info!(table = %table, rows, "table rows");
    }
    log_buckets("authors", &status.by_author_count);
    log_buckets("tables", &status.by_table_count);
    log_buckets("figures", &status.by_figure_count);

    Ok(())
}

fn log_buckets(dimension: &str, buckets: &[CountBucket]) {
    for bucket in buckets {
        info!(
            dimension,
            count = bucket.value,
            posters = bucket.posters,
            "poster distribution"
        );
    }
}

pub(crate) fn collect_status(connection: &Connection) -> Result<StoreStatus> {
    let mut table_counts = Vec::with_capacity(POSTER_TABLES.len());
    for table in POSTER_TABLES.iter().rev() {
        let rows = count_rows(connection, &format!("SELECT COUNT(*) FROM {table}"))
            .with_context(|| format!("failed to count rows in {table}"))?;
        table_counts.push((table.to_string(), rows));
    }

    Ok(StoreStatus {
        db_schema_version: metadata_value(connection, "db_schema_version")?,
        db_updated_at: metadata_value(connection, "db_updated_at")?,
        table_counts,
        by_author_count: query_buckets(
            connection,
            "
            SELECT json_array_length(authors) AS author_count, COUNT(*)
            FROM poster_info
            GROUP BY author_count
            ORDER BY author_count
            ",
        )?,
        by_table_count: child_count_buckets(connection, "poster_table")?,
        by_figure_count: child_count_buckets(connection, "poster_figure")?,
    })
}

fn metadata_value(connection: &Connection, key: &str) -> Result<Option<String>> {
    let value = connection
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read metadata key {key}"))?;
    Ok(value)
}

fn child_count_buckets(connection: &Connection, table: &str) -> Result<Vec<CountBucket>> {
    let sql = format!(
        "
        SELECT child_count, COUNT(*)
        FROM (
          SELECT p.id, COUNT(c.id) AS child_count
          FROM poster_info p
          LEFT JOIN {table} c ON c.poster_id = p.id
          GROUP BY p.id
        )
        GROUP BY child_count
        ORDER BY child_count
        "
    );
    query_buckets(connection, &sql)
}

fn query_buckets(connection: &Connection, sql: &str) -> Result<Vec<CountBucket>> {
    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map([], |row| {
        Ok(CountBucket {
            value: row.get(0)?,
            posters: row.get(1)?,
        })
    })?;

    let mut buckets = Vec::new();
    for row in rows {
        buckets.push(row?);
    }
    Ok(buckets)
}
