use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::{debug, warn};

use crate::cli::DuplicatePolicy;
use crate::model::StructuralBlock;

#[derive(Debug, Clone, Default)]
pub(crate) struct PosterDraft {
    pub poster_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub source_url: Option<String>,
    pub page_url: Option<String>,
    pub text_content: String,
    pub local_path_md: Option<String>,
    pub local_path_json: Option<String>,
    pub blocks: Vec<StructuralBlock>,
    pub figures: Vec<String>,
    pub tables: Vec<String>,
}

pub(crate) fn persist_poster(
    connection: &mut Connection,
    draft: &PosterDraft,
    on_duplicate: DuplicatePolicy,
) -> Result<i64> {
    let tx = connection
        .transaction()
        .context("failed to open poster transaction")?;

    match write_poster_rows(&tx, draft, on_duplicate) {
        Ok(poster_db_id) => {
            tx.commit().context("failed to commit poster transaction")?;
            Ok(poster_db_id)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "poster transaction rollback failed");
            }
            Err(err)
        }
    }
}

fn write_poster_rows(
    connection: &Connection,
    draft: &PosterDraft,
    on_duplicate: DuplicatePolicy,
) -> Result<i64> {
    if let (DuplicatePolicy::Replace, Some(poster_id)) = (on_duplicate, draft.poster_id.as_deref())
    {
        let replaced = connection
            .execute("DELETE FROM poster_info WHERE poster_id = ?1", [poster_id])
            .context("failed to delete existing poster_info row")?;
        if replaced > 0 {
            debug!(poster_id, "replacing stored poster");
        }
    }

    let authors_json =
        serde_json::to_string(&draft.authors).context("failed to serialize authors")?;
    connection
        .execute(
            "
            INSERT INTO poster_info(
              poster_id, title, authors, source_url, page_url, text_content,
              local_path_md, local_path_json
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                draft.poster_id,
                draft.title,
                authors_json,
                draft.source_url,
                draft.page_url,
                draft.text_content,
                draft.local_path_md,
                draft.local_path_json,
            ],
        )
        .context("failed to insert poster_info row")?;
    let poster_db_id = connection.last_insert_rowid();

    {
        let mut statement = connection.prepare(
            "
            INSERT INTO poster_blocks(poster_id, block_label, block_content, block_bbox)
            VALUES(?1, ?2, ?3, ?4)
            ",
        )?;
        for block in &draft.blocks {
            let bbox_json = block
                .block_bbox
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .context("failed to serialize block bbox")?;
            statement
                .execute(params![
                    poster_db_id,
                    block.block_label,
                    block.block_content,
                    bbox_json
                ])
                .context("failed to insert poster_blocks row")?;
        }
    }

    {
        let mut statement =
            connection.prepare("INSERT INTO poster_figure(poster_id, figure_path) VALUES(?1, ?2)")?;
        for figure in &draft.figures {
            statement
                .execute(params![poster_db_id, figure])
                .context("failed to insert poster_figure row")?;
        }
    }

    {
        let mut statement = connection
            .prepare("INSERT INTO poster_table(poster_id, table_markdown) VALUES(?1, ?2)")?;
        for table in &draft.tables {
            statement
                .execute(params![poster_db_id, table])
                .context("failed to insert poster_table row")?;
        }
    }

    Ok(poster_db_id)
}
