use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "posterdb",
    version,
    about = "Poster extraction ingestion and lookup tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Reset(ResetArgs),
    Status(StatusArgs),
    Search(SearchArgs),
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/posterdb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "processed_data")]
    pub input_root: PathBuf,

    #[arg(long, default_value = "merged_posters.json")]
    pub metadata_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub reset_schema: bool,

    #[arg(long, value_enum, default_value_t = UnitLayout::Folders)]
    pub layout: UnitLayout,

    #[arg(long, value_enum, default_value_t = FigureSource::Directory)]
    pub figure_source: FigureSource,

    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Reject)]
    pub on_duplicate: DuplicatePolicy,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum UnitLayout {
    Folders,
    Flat,
}

impl UnitLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folders => "folders",
            Self::Flat => "flat",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FigureSource {
    Directory,
    Markup,
}

impl FigureSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Markup => "markup",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DuplicatePolicy {
    Reject,
    Replace,
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Replace => "replace",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    #[arg(long, default_value = ".cache/posterdb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/posterdb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long, default_value = ".cache/posterdb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub query: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".cache/posterdb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub id: i64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
