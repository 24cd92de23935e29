use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::cli::{FigureSource, UnitLayout};
use crate::model::{BlockDocument, ExtractionUnit, StructuralBlock};
use crate::util::sha256_bytes;

pub(crate) const MARKUP_FILENAME: &str = "result.md";
pub(crate) const BLOCKS_FILENAME: &str = "result.json";
pub(crate) const IMAGE_DIRNAME: &str = "imgs";

const FIGURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct UnitSource {
    pub unit_id: String,
    pub candidate_filename: Option<String>,
    pub markup_path: PathBuf,
    pub blocks_path: PathBuf,
    pub image_dir: Option<PathBuf>,
}

impl UnitSource {
    pub fn folder(input_root: &Path, unit_id: &str) -> Self {
        let root = input_root.join(unit_id);
        Self {
            unit_id: unit_id.to_string(),
            candidate_filename: None,
            markup_path: root.join(MARKUP_FILENAME),
            blocks_path: root.join(BLOCKS_FILENAME),
            image_dir: Some(root.join(IMAGE_DIRNAME)),
        }
    }

    pub fn flat(input_root: &Path, stem: &str) -> Self {
        Self {
            unit_id: stem.to_string(),
            candidate_filename: Some(format!("{stem}.png")),
            markup_path: input_root.join(format!("{stem}.md")),
            blocks_path: input_root.join(format!("{stem}.json")),
            image_dir: None,
        }
    }

    pub fn missing_artifacts(&self) -> Vec<String> {
        if self.markup_path.is_file() {
            Vec::new()
        } else {
            vec![self.markup_path.display().to_string()]
        }
    }
}

pub fn discover_units(input_root: &Path, layout: UnitLayout) -> Result<Vec<UnitSource>> {
    let entries = fs::read_dir(input_root)
        .with_context(|| format!("failed to read {}", input_root.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_root.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

        let name = match layout {
            UnitLayout::Folders if file_type.is_dir() => path.file_name(),
            UnitLayout::Flat if file_type.is_file() && has_extension(&path, &["md"]) => {
                path.file_stem()
            }
            _ => continue,
        };

        match name.and_then(|value| value.to_str()) {
            Some(name) => names.push(name.to_string()),
            None => warn!(path = %path.display(), "skipping unit with non UTF-8 name"),
        }
    }

    names.sort();

    Ok(names
        .iter()
        .map(|name| match layout {
            UnitLayout::Folders => UnitSource::folder(input_root, name),
            UnitLayout::Flat => UnitSource::flat(input_root, name),
        })
        .collect())
}

pub fn load_unit(source: &UnitSource, figure_source: FigureSource) -> Result<ExtractionUnit> {
    let raw = fs::read(&source.markup_path)
        .with_context(|| format!("failed to read {}", source.markup_path.display()))?;
    let markup_sha256 = sha256_bytes(&raw);
    let markup = String::from_utf8(raw)
        .with_context(|| format!("markup is not valid UTF-8: {}", source.markup_path.display()))?;

    let (blocks, blocks_path) = if source.blocks_path.is_file() {
        (
            read_blocks(&source.blocks_path)?,
            Some(source.blocks_path.clone()),
        )
    } else {
        (Vec::new(), None)
    };

    let figure_files = match (figure_source, source.image_dir.as_deref()) {
        (FigureSource::Directory, Some(dir)) if dir.is_dir() => list_figure_files(dir)?,
        _ => Vec::new(),
    };

    Ok(ExtractionUnit {
        unit_id: source.unit_id.clone(),
        candidate_filename: source.candidate_filename.clone(),
        markup,
        markup_path: source.markup_path.clone(),
        blocks,
        blocks_path,
        figure_files,
        markup_sha256,
    })
}

fn read_blocks(path: &Path) -> Result<Vec<StructuralBlock>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: BlockDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse block list {}", path.display()))?;
    Ok(document.into_blocks())
}

pub fn list_figure_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut figures = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, &FIGURE_EXTENSIONS) {
            figures.push(path);
        }
    }

    figures.sort();
    Ok(figures)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}
