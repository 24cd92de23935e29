use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BlockDetail {
    pub id: i64,
    pub block_label: Option<String>,
    pub block_content: Option<String>,
    pub block_bbox: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PosterDetail {
    pub id: i64,
    pub poster_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub source_url: Option<String>,
    pub page_url: Option<String>,
    pub text_content: Option<String>,
    pub local_path_md: Option<String>,
    pub local_path_json: Option<String>,
    pub blocks: Vec<BlockDetail>,
    pub figures: Vec<String>,
    pub tables: Vec<String>,
}

pub fn load_poster_detail(connection: &Connection, id: i64) -> Result<Option<PosterDetail>> {
    let row = connection
        .query_row(
            "SELECT id, poster_id, title, authors, source_url, page_url, text_content,
                    local_path_md, local_path_json
             FROM poster_info
             WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            },
        )
        .optional()
        .with_context(|| format!("failed to load poster id={id}"))?;

    let Some((
        id,
        poster_id,
        title,
        authors_json,
        source_url,
        page_url,
        text_content,
        local_path_md,
        local_path_json,
    )) = row
    else {
        return Ok(None);
    };

    let authors = serde_json::from_str::<Vec<String>>(&authors_json)
        .with_context(|| format!("invalid authors JSON for poster id={id}"))?;

    Ok(Some(PosterDetail {
        id,
        poster_id,
        title,
        authors,
        source_url,
        page_url,
        text_content,
        local_path_md,
        local_path_json,
        blocks: load_blocks(connection, id)?,
        figures: load_strings(
            connection,
            "SELECT figure_path FROM poster_figure WHERE poster_id = ?1 ORDER BY id",
            id,
        )?,
        tables: load_strings(
            connection,
            "SELECT table_markdown FROM poster_table WHERE poster_id = ?1 ORDER BY id",
            id,
        )?,
    }))
}

fn load_blocks(connection: &Connection, poster_db_id: i64) -> Result<Vec<BlockDetail>> {
    let mut statement = connection.prepare(
        "SELECT id, block_label, block_content, block_bbox
         FROM poster_blocks
         WHERE poster_id = ?1
         ORDER BY id",
    )?;
    let rows = statement.query_map(params![poster_db_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut blocks = Vec::new();
    for row in rows {
        let (id, block_label, block_content, bbox_json) = row?;
        let block_bbox = bbox_json
            .map(|raw| {
                serde_json::from_str::<serde_json::Value>(&raw)
                    .with_context(|| format!("invalid block_bbox JSON for block id={id}"))
            })
            .transpose()?;
        blocks.push(BlockDetail {
            id,
            block_label,
            block_content,
            block_bbox,
        });
    }
    Ok(blocks)
}

fn load_strings(connection: &Connection, sql: &str, poster_db_id: i64) -> Result<Vec<String>> {
    let mut statement = connection.prepare(sql)?;
    let values = statement
        .query_map(params![poster_db_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values)
}
