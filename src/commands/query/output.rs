use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use super::detail::PosterDetail;
use super::search::{SearchFilter, SearchPage};

pub(super) fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value)
        .context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn emit_search_text(filter: &SearchFilter, page: &SearchPage) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Search: query={} author={}",
        filter.query.as_deref().unwrap_or("-"),
        filter.author.as_deref().unwrap_or("-"),
    )?;
    writeln!(
        output,
        "Matches: {} (page {} of size {}, showing {})",
        page.total,
        page.page,
        page.page_size,
        page.items.len()
    )?;

    for item in &page.items {
        writeln!(
            output,
            "[{}] {} | {}",
            item.id,
            item.poster_id.as_deref().unwrap_or("-"),
            item.title.as_deref().unwrap_or("(untitled)")
        )?;
        if !item.authors.is_empty() {
            writeln!(output, "\tauthors: {}", item.authors.join("; "))?;
        }
        if let Some(url) = &item.page_url {
            writeln!(output, "\tpage_url: {url}")?;
        }
        if !item.snippet.is_empty() {
            writeln!(output, "\t{}", item.snippet)?;
        }
    }

    output.flush()?;
    Ok(())
}

pub(super) fn emit_detail_text(detail: &PosterDetail) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Poster {} ({})",
        detail.id,
        detail.poster_id.as_deref().unwrap_or("-")
    )?;
    writeln!(output, "Title: {}", detail.title.as_deref().unwrap_or("(untitled)"))?;
    writeln!(output, "Authors: {}", detail.authors.join("; "))?;
    if let Some(url) = &detail.source_url {
        writeln!(output, "Source: {url}")?;
    }
    if let Some(url) = &detail.page_url {
        writeln!(output, "Page: {url}")?;
    }
    if let Some(path) = &detail.local_path_md {
        writeln!(output, "Markup: {path}")?;
    }
    if let Some(path) = &detail.local_path_json {
        writeln!(output, "Blocks: {path}")?;
    }

    writeln!(output, "Blocks ({}):", detail.blocks.len())?;
    for block in &detail.blocks {
        let bbox = block
            .block_bbox
            .as_ref()
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            output,
            "\t[{}] {} {}: {}",
            block.id,
            block.block_label.as_deref().unwrap_or("-"),
            bbox,
            block.block_content.as_deref().unwrap_or_default()
        )?;
    }

    writeln!(output, "Figures ({}):", detail.figures.len())?;
    for figure in &detail.figures {
        writeln!(output, "\t{figure}")?;
    }

    writeln!(output, "Tables ({}):", detail.tables.len())?;
    for table in &detail.tables {
        writeln!(output, "{table}")?;
    }

    if let Some(text) = &detail.text_content {
        writeln!(output, "Text:")?;
        writeln!(output, "{text}")?;
    }

    output.flush()?;
    Ok(())
}
