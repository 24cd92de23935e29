use anyhow::Result;

use super::tokenizer::{MarkupEvent, Tokenizer};

const SOFT_BREAK: &str = "  \n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl AlignedTable {
    pub fn from_rows(mut parsed: Vec<Vec<String>>) -> Option<Self> {
        if parsed.is_empty() {
            return None;
        }

        let header = parsed.remove(0);
        let col_count = header.len();
        let rows = parsed
            .into_iter()
            .map(|mut row| {
                row.resize(col_count, String::new());
                row
            })
            .collect::<Vec<Vec<String>>>();

        let widths = (0..col_count)
            .map(|index| {
                std::iter::once(&header[index])
                    .chain(rows.iter().map(|row| &row[index]))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        Some(Self {
            header,
            rows,
            widths,
        })
    }

    #[cfg(test)]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.render_row(&self.header));
        lines.push(format!(
            "|{}|",
            self.widths
                .iter()
                .map(|width| format!(" {} ", "-".repeat(*width)))
                .collect::<Vec<String>>()
                .join("|")
        ));
        for row in &self.rows {
            lines.push(self.render_row(row));
        }

        lines.join("\n")
    }

    fn render_row(&self, cells: &[String]) -> String {
        let body = cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, width)| format!(" {cell:<width$} ", width = *width))
            .collect::<Vec<String>>()
            .join("|");
        format!("|{body}|")
    }
}

#[derive(Debug)]
pub struct TableConverter {
    tokenizer: Tokenizer,
}

impl TableConverter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new()?,
        })
    }

    pub fn to_table(&self, fragment: &str) -> String {
        convert_table(&self.tokenizer.tokenize(fragment))
            .map(|table| table.render())
            .unwrap_or_default()
    }
}

pub(super) fn convert_table(events: &[MarkupEvent<'_>]) -> Option<AlignedTable> {
    AlignedTable::from_rows(parse_table_rows(events))
}

/// Collects `tr` rows and their `td`/`th` cells. A row or cell is only kept
/// once its closing tag is seen; a nested open tag extends the current one.
fn parse_table_rows(events: &[MarkupEvent<'_>]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<String> = None;

    for event in events {
        match event {
            MarkupEvent::Open { name, .. } if name == "tr" => {
                if row.is_none() {
                    row = Some(Vec::new());
                }
            }
            MarkupEvent::Close { name } if name == "tr" => {
                cell = None;
                if let Some(cells) = row.take()
                    && !cells.is_empty()
                {
                    rows.push(cells);
                }
            }
            MarkupEvent::Open { name, .. } if is_cell_tag(name) => {
                if row.is_some() && cell.is_none() {
                    cell = Some(String::new());
                }
            }
            MarkupEvent::Close { name } if is_cell_tag(name) => {
                if let (Some(cells), Some(content)) = (row.as_mut(), cell.take()) {
                    cells.push(content.trim().to_string());
                }
            }
            MarkupEvent::Open { name, .. } if name == "br" => {
                if let Some(content) = cell.as_mut() {
                    content.push_str(SOFT_BREAK);
                }
            }
            MarkupEvent::Text(text) => {
                if let Some(content) = cell.as_mut() {
                    content.push_str(text);
                }
            }
            _ => {}
        }
    }

    rows
}

fn is_cell_tag(name: &str) -> bool {
    name == "td" || name == "th"
}
