use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorField {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMetadataRecord {
    #[serde(default, deserialize_with = "deserialize_poster_id")]
    pub poster_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<AuthorField>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default, alias = "local_png_path")]
    pub local_image_path: Option<String>,
}

fn deserialize_poster_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPosterId {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = Option::<RawPosterId>::deserialize(deserializer)?;
    Ok(raw
        .map(|value| match value {
            RawPosterId::Text(text) => text.trim().to_string(),
            RawPosterId::Number(number) => number.to_string(),
        })
        .filter(|value| !value.is_empty()))
}

pub type BoundingBox = [serde_json::Number; 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralBlock {
    #[serde(default)]
    pub block_label: Option<String>,
    #[serde(default)]
    pub block_content: Option<String>,
    #[serde(default)]
    pub block_bbox: Option<BoundingBox>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BlockDocument {
    Bare(Vec<StructuralBlock>),
    Wrapped {
        #[serde(default)]
        parsing_res_list: Vec<StructuralBlock>,
    },
}

impl BlockDocument {
    pub fn into_blocks(self) -> Vec<StructuralBlock> {
        match self {
            BlockDocument::Bare(blocks) => blocks,
            BlockDocument::Wrapped { parsing_res_list } => parsing_res_list,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionUnit {
    pub unit_id: String,
    pub candidate_filename: Option<String>,
    pub markup: String,
    pub markup_path: PathBuf,
    pub blocks: Vec<StructuralBlock>,
    pub blocks_path: Option<PathBuf>,
    pub figure_files: Vec<PathBuf>,
    pub markup_sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub raw_text: String,
    pub cleaned_text: String,
    pub figure_references: Vec<String>,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub db_path: String,
    pub input_root: String,
    pub metadata_path: String,
    pub run_manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOptions {
    pub reset_schema: bool,
    pub layout: String,
    pub figure_source: String,
    pub on_duplicate: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub metadata_record_count: usize,
    pub unit_count: usize,
    pub persisted_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub blocks_inserted: usize,
    pub figures_inserted: usize,
    pub tables_inserted: usize,
    pub posters_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit_id: String,
    pub status: String,
    pub stage: String,
    pub reason: Option<String>,
    pub matched_by: Option<String>,
    pub poster_db_id: Option<i64>,
    pub blocks: usize,
    pub figures: usize,
    pub tables: usize,
    pub markup_sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: IngestPaths,
    pub options: IngestOptions,
    pub metadata_sha256: String,
    pub counts: IngestCounts,
    pub units: Vec<UnitReport>,
}
