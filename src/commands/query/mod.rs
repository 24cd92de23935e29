mod detail;
mod output;
mod search;
#[cfg(test)]
mod tests;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::{SearchArgs, ShowArgs};
use crate::commands::ingest::open_store_read_only;
use crate::util::resolve_db_path;

use detail::load_poster_detail;
use search::{SearchFilter, search_posters};

pub fn run_search(args: SearchArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let connection = open_store_read_only(&db_path)?;
    let filter = SearchFilter {
        query: args.query.clone(),
        author: args.author.clone(),
        page: args.page,
        page_size: args.page_size,
    };
    let page = search_posters(&connection, &filter)?;
    info!(
        total = page.total,
        page = page.page,
        returned = page.items.len(),
        "search completed"
    );

    if args.json {
        output::emit_json(&page)
    } else {
        output::emit_search_text(&filter, &page)
    }
}

pub fn run_show(args: ShowArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let connection = open_store_read_only(&db_path)?;
    let Some(detail) = load_poster_detail(&connection, args.id)? else {
        bail!("poster not found: id={}", args.id);
    };

    if args.json {
        output::emit_json(&detail)
    } else {
        output::emit_detail_text(&detail)
    }
}
