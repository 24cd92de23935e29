use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, bail};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use super::artifacts::{UnitSource, load_unit};
use super::persist::{PosterDraft, persist_poster};
use crate::cli::{DuplicatePolicy, FigureSource, IngestArgs, UnitLayout};
use crate::markup::MarkupSplitter;
use crate::metadata::{AuthorSplitter, MetadataMatcher, UnitKey};
use crate::model::{ExtractionUnit, ParsedDocument, SourceMetadataRecord, UnitReport};
use crate::util::{absolute_path_string, resolve_db_path};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub store_connection: PathBuf,
    pub input_root: PathBuf,
    pub metadata_path: PathBuf,
    pub reset_schema: bool,
    pub layout: UnitLayout,
    pub figure_source: FigureSource,
    pub on_duplicate: DuplicatePolicy,
}

impl IngestConfig {
    pub fn from_args(args: &IngestArgs) -> Self {
        Self {
            store_connection: resolve_db_path(&args.cache_root, args.db_path.as_deref()),
            input_root: args.input_root.clone(),
            metadata_path: args.metadata_path.clone(),
            reset_schema: args.reset_schema,
            layout: args.layout,
            figure_source: args.figure_source,
            on_duplicate: args.on_duplicate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_root.is_dir() {
            bail!("input root is not a directory: {}", self.input_root.display());
        }
        if !self.metadata_path.is_file() {
            bail!("metadata file not found: {}", self.metadata_path.display());
        }
        if self.layout == UnitLayout::Flat && self.figure_source == FigureSource::Directory {
            bail!("flat layout has no image directories; use --figure-source markup");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStage {
    Pending,
    ArtifactsRead,
    Matched,
    Persisted,
}

impl UnitStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ArtifactsRead => "artifacts_read",
            Self::Matched => "matched",
            Self::Persisted => "persisted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ArtifactMissing { missing: Vec<String> },
    MatchNotFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactMissing { missing } => {
                write!(f, "missing artifacts: {}", missing.join(", "))
            }
            Self::MatchNotFound => write!(f, "no metadata record matches unit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUnit {
    pub poster_db_id: i64,
    pub matched_by: &'static str,
    pub blocks: usize,
    pub figures: usize,
    pub tables: usize,
    pub markup_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Persisted(PersistedUnit),
    Skipped {
        stage: UnitStage,
        reason: SkipReason,
    },
    Failed {
        stage: UnitStage,
        cause: String,
    },
}

impl UnitOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Persisted(_) => "persisted",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn into_report(self, unit_id: &str) -> UnitReport {
        let status = self.status().to_string();
        match self {
            Self::Persisted(persisted) => UnitReport {
                unit_id: unit_id.to_string(),
                status,
                stage: UnitStage::Persisted.as_str().to_string(),
                reason: None,
                matched_by: Some(persisted.matched_by.to_string()),
                poster_db_id: Some(persisted.poster_db_id),
                blocks: persisted.blocks,
                figures: persisted.figures,
                tables: persisted.tables,
                markup_sha256: Some(persisted.markup_sha256),
            },
            Self::Skipped { stage, reason } => UnitReport {
                unit_id: unit_id.to_string(),
                status,
                stage: stage.as_str().to_string(),
                reason: Some(reason.to_string()),
                matched_by: None,
                poster_db_id: None,
                blocks: 0,
                figures: 0,
                tables: 0,
                markup_sha256: None,
            },
            Self::Failed { stage, cause } => UnitReport {
                unit_id: unit_id.to_string(),
                status,
                stage: stage.as_str().to_string(),
                reason: Some(cause),
                matched_by: None,
                poster_db_id: None,
                blocks: 0,
                figures: 0,
                tables: 0,
                markup_sha256: None,
            },
        }
    }
}

#[derive(Debug)]
pub struct IngestCoordinator {
    config: IngestConfig,
    metadata: Vec<SourceMetadataRecord>,
    splitter: MarkupSplitter,
    matcher: MetadataMatcher,
    authors: AuthorSplitter,
}

impl IngestCoordinator {
    pub fn new(config: IngestConfig, metadata: Vec<SourceMetadataRecord>) -> Result<Self> {
        Ok(Self {
            config,
            metadata,
            splitter: MarkupSplitter::new()?,
            matcher: MetadataMatcher::default(),
            authors: AuthorSplitter::new()?,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn run_units(&self, connection: &mut Connection, sources: &[UnitSource]) -> Vec<UnitReport> {
        let total = sources.len();
        debug!(strategies = ?self.matcher.strategy_names(), "matcher configured");

        sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                info!(index = index + 1, total, unit = %source.unit_id, "processing unit");
                let outcome = self.process_unit(connection, source);
                log_outcome(&source.unit_id, &outcome);
                outcome.into_report(&source.unit_id)
            })
            .collect()
    }

    pub fn process_unit(&self, connection: &mut Connection, source: &UnitSource) -> UnitOutcome {
        let missing = source.missing_artifacts();
        if !missing.is_empty() {
            return UnitOutcome::Skipped {
                stage: UnitStage::Pending,
                reason: SkipReason::ArtifactMissing { missing },
            };
        }

        let unit = match load_unit(source, self.config.figure_source) {
            Ok(unit) => unit,
            Err(err) => {
                return UnitOutcome::Failed {
                    stage: UnitStage::Pending,
                    cause: format!("{err:#}"),
                };
            }
        };

        let key = UnitKey {
            unit_id: &unit.unit_id,
            candidate_filename: unit.candidate_filename.as_deref(),
        };
        let Some(matched) = self.matcher.find(&key, &self.metadata) else {
            return UnitOutcome::Skipped {
                stage: UnitStage::ArtifactsRead,
                reason: SkipReason::MatchNotFound,
            };
        };
        debug!(unit = %unit.unit_id, strategy = matched.strategy, record = matched.index, "metadata matched");

        let document = self.splitter.split(&unit.markup);
        let draft = match self.build_draft(&unit, matched.record, document) {
            Ok(draft) => draft,
            Err(err) => {
                return UnitOutcome::Failed {
                    stage: UnitStage::Matched,
                    cause: format!("{err:#}"),
                };
            }
        };

        match persist_poster(connection, &draft, self.config.on_duplicate) {
            Ok(poster_db_id) => UnitOutcome::Persisted(PersistedUnit {
                poster_db_id,
                matched_by: matched.strategy,
                blocks: draft.blocks.len(),
                figures: draft.figures.len(),
                tables: draft.tables.len(),
                markup_sha256: unit.markup_sha256,
            }),
            Err(err) => UnitOutcome::Failed {
                stage: UnitStage::Matched,
                cause: format!("{err:#}"),
            },
        }
    }

    fn build_draft(
        &self,
        unit: &ExtractionUnit,
        record: &SourceMetadataRecord,
        document: ParsedDocument,
    ) -> Result<PosterDraft> {
        let figures = match self.config.figure_source {
            FigureSource::Markup => document.figure_references,
            FigureSource::Directory => unit
                .figure_files
                .iter()
                .map(|path| absolute_path_string(path))
                .collect::<Result<Vec<String>>>()?,
        };

        let local_path_json = unit
            .blocks_path
            .as_deref()
            .map(absolute_path_string)
            .transpose()?;

        Ok(PosterDraft {
            // The unit id doubles as the poster image stem, which is what
            // readers resolve images by.
            poster_id: Some(unit.unit_id.clone()),
            title: record.title.clone(),
            authors: self.authors.split(record.authors.as_ref()),
            source_url: record.source_url.clone(),
            page_url: record.page_url.clone(),
            text_content: document.cleaned_text,
            local_path_md: Some(absolute_path_string(&unit.markup_path)?),
            local_path_json,
            blocks: unit.blocks.clone(),
            figures,
            tables: document.tables,
        })
    }
}

fn log_outcome(unit_id: &str, outcome: &UnitOutcome) {
    match outcome {
        UnitOutcome::Persisted(persisted) => info!(
            unit = %unit_id,
            poster_db_id = persisted.poster_db_id,
            matched_by = persisted.matched_by,
            blocks = persisted.blocks,
            figures = persisted.figures,
            tables = persisted.tables,
            "unit persisted"
        ),
        UnitOutcome::Skipped { stage, reason } => warn!(
            unit = %unit_id,
            stage = stage.as_str(),
            reason = %reason,
            "unit skipped"
        ),
        UnitOutcome::Failed { stage, cause } => warn!(
            unit = %unit_id,
            stage = stage.as_str(),
            cause = %cause,
            "unit failed, transaction rolled back"
        ),
    }
}
