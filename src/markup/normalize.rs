use anyhow::{Context, Result};
use regex::Regex;

use super::tokenizer::TAG_PATTERN;

/// Stage order is fixed: tags, whitespace, table pipes, border runs, then
/// whitespace again, since each removal can expose runs of spaces.
#[derive(Debug)]
pub struct TextNormalizer {
    tag: Regex,
    whitespace: Regex,
    pipes: Regex,
    border: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: Regex::new(TAG_PATTERN).context("failed to compile tag regex")?,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            pipes: Regex::new(r"\|+").context("failed to compile pipe regex")?,
            border: Regex::new(r"[+=-]{5,}").context("failed to compile border regex")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let text = self.tag.replace_all(text, "");
        let text = self.whitespace.replace_all(&text, " ");
        let text = self.pipes.replace_all(&text, " ");
        let text = self.border.replace_all(&text, "");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().to_string()
    }
}
