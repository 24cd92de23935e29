mod matcher;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::model::{AuthorField, SourceMetadataRecord};

pub use matcher::{MetadataMatcher, UnitKey};

pub fn load_metadata(path: &Path) -> Result<Vec<SourceMetadataRecord>> {
    if !path.is_file() {
        bail!("metadata file not found: {}", path.display());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<SourceMetadataRecord> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(records)
}

#[derive(Debug)]
pub struct AuthorSplitter {
    delimiters: Regex,
}

impl AuthorSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            delimiters: Regex::new(r",|;|/|·|\band\b")
                .context("failed to compile author delimiter regex")?,
        })
    }

    pub fn split(&self, authors: Option<&AuthorField>) -> Vec<String> {
        match authors {
            None => Vec::new(),
            Some(AuthorField::List(names)) => names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            Some(AuthorField::Text(text)) => self
                .delimiters
                .split(text)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
