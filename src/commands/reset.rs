use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ResetArgs;
use crate::commands::ingest::{open_store, reset_schema};
use crate::util::resolve_db_path;

pub fn run(args: ResetArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());

    warn!(path = %db_path.display(), "resetting poster schema; all stored posters will be removed");
    let mut connection = open_store(&db_path)?;
    reset_schema(&mut connection)?;
    info!(path = %db_path.display(), "schema reset completed");

    Ok(())
}
