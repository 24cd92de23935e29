use anyhow::Result;

use super::normalize::TextNormalizer;
use super::table::TableConverter;
use super::tokenizer::{MarkupEvent, Tokenizer};
use crate::model::ParsedDocument;

#[derive(Debug)]
pub struct MarkupSplitter {
    tokenizer: Tokenizer,
    tables: TableConverter,
    normalizer: TextNormalizer,
}

impl MarkupSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new()?,
            tables: TableConverter::new()?,
            normalizer: TextNormalizer::new()?,
        })
    }

    pub fn split(&self, markup: &str) -> ParsedDocument {
        let events = self.tokenizer.tokenize_spanned(markup);

        // Figures come first so images nested inside tables are still seen.
        let figure_references = events
            .iter()
            .map(|(_, event)| event)
            .filter(|event| event.is_open("img"))
            .filter_map(|event| event.attr("src"))
            .filter(|src| !src.is_empty())
            .map(str::to_string)
            .collect::<Vec<String>>();

        let mut tables = Vec::new();
        let mut raw = String::with_capacity(markup.len());
        let mut index = 0;

        while index < events.len() {
            match &events[index] {
                (span, event) if event.is_open("table") => {
                    let close = events[index + 1..]
                        .iter()
                        .position(|(_, candidate)| candidate.is_close("table"))
                        .map(|offset| index + 1 + offset);

                    if let Some(end) = close {
                        let fragment = &markup[span.start..events[end].0.end];
                        let table = self.tables.to_table(fragment);
                        if !table.is_empty() {
                            tables.push(table);
                        }
                        index = end + 1;
                        continue;
                    }
                }
                (_, MarkupEvent::Text(text)) => raw.push_str(text),
                _ => {}
            }
            index += 1;
        }

        let raw_text = raw.trim().to_string();
        let cleaned_text = self.normalizer.clean(&raw_text);

        ParsedDocument {
            raw_text,
            cleaned_text,
            figure_references,
            tables,
        }
    }
}
