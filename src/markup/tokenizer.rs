use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;

pub(crate) const TAG_PATTERN: &str = r"<[^>]+>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent<'a> {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close {
        name: String,
    },
    Other(&'a str),
    Text(&'a str),
}

impl MarkupEvent<'_> {
    pub fn is_open(&self, tag: &str) -> bool {
        matches!(self, MarkupEvent::Open { name, .. } if name == tag)
    }

    pub fn is_close(&self, tag: &str) -> bool {
        matches!(self, MarkupEvent::Close { name } if name == tag)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            MarkupEvent::Open { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Tokenizer {
    tag: Regex,
    tag_name: Regex,
    attribute: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: Regex::new(TAG_PATTERN).context("failed to compile tag regex")?,
            tag_name: Regex::new(r"^<(/)?([A-Za-z][A-Za-z0-9:-]*)")
                .context("failed to compile tag name regex")?,
            attribute: Regex::new(
                r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
            )
            .context("failed to compile attribute regex")?,
        })
    }

    pub fn tokenize<'a>(&self, input: &'a str) -> Vec<MarkupEvent<'a>> {
        self.tokenize_spanned(input)
            .into_iter()
            .map(|(_, event)| event)
            .collect()
    }

    pub fn tokenize_spanned<'a>(&self, input: &'a str) -> Vec<(Range<usize>, MarkupEvent<'a>)> {
        let mut events = Vec::new();
        let mut cursor = 0;

        for tag in self.tag.find_iter(input) {
            if tag.start() > cursor {
                events.push((
                    cursor..tag.start(),
                    MarkupEvent::Text(&input[cursor..tag.start()]),
                ));
            }
            events.push((tag.range(), self.classify(tag.as_str())));
            cursor = tag.end();
        }

        if cursor < input.len() {
            events.push((cursor..input.len(), MarkupEvent::Text(&input[cursor..])));
        }

        events
    }

    fn classify<'a>(&self, raw: &'a str) -> MarkupEvent<'a> {
        let Some(captures) = self.tag_name.captures(raw) else {
            return MarkupEvent::Other(raw);
        };

        let name = captures
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        if captures.get(1).is_some() {
            return MarkupEvent::Close { name };
        }

        let attrs = self
            .attribute
            .captures_iter(raw)
            .filter_map(|attr| {
                let key = attr.get(1)?.as_str().to_ascii_lowercase();
                let value = attr.get(2).or_else(|| attr.get(3))?.as_str().to_string();
                Some((key, value))
            })
            .collect();

        MarkupEvent::Open { name, attrs }
    }
}
