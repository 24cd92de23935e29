use anyhow::{Context, Result};
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

pub(crate) const SNIPPET_CHARS: usize = 260;

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub query: Option<String>,
    pub author: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchItem {
    pub id: i64,
    pub poster_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub source_url: Option<String>,
    pub page_url: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<SearchItem>,
}

pub fn search_posters(connection: &Connection, filter: &SearchFilter) -> Result<SearchPage> {
    let page = filter.page.max(1);
    let page_size = filter.page_size.clamp(1, 100);

    let mut clauses = Vec::new();
    let mut values: Vec<String> = Vec::new();
    if let Some(query) = non_blank(filter.query.as_deref()) {
        clauses.push(
            "(title LIKE ? ESCAPE '\\' OR authors LIKE ? ESCAPE '\\' OR text_content LIKE ? ESCAPE '\\')",
        );
        let pattern = like_pattern(query);
        values.extend([pattern.clone(), pattern.clone(), pattern]);
    }
    if let Some(author) = non_blank(filter.author.as_deref()) {
        clauses.push("authors LIKE ? ESCAPE '\\'");
        values.push(like_pattern(author));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = connection
        .query_row(
            &format!("SELECT COUNT(*) FROM poster_info{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )
        .context("failed to count search matches")?;

    let offset = i64::from(page - 1) * i64::from(page_size);
    let mut statement = connection.prepare(&format!(
        "SELECT id, poster_id, title, authors, source_url, page_url, text_content
         FROM poster_info{where_sql}
         ORDER BY id
         LIMIT {page_size} OFFSET {offset}"
    ))?;
    let rows = statement.query_map(params_from_iter(values.iter()), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, poster_id, title, authors_json, source_url, page_url, text_content) = row?;
        let authors = serde_json::from_str::<Vec<String>>(&authors_json)
            .with_context(|| format!("invalid authors JSON for poster id={id}"))?;
        items.push(SearchItem {
            id,
            poster_id,
            title,
            authors,
            source_url,
            page_url,
            snippet: snippet(text_content.as_deref().unwrap_or_default()),
        });
    }

    Ok(SearchPage {
        total,
        page,
        page_size,
        items,
    })
}

pub(crate) fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
