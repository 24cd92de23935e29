use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::artifacts::discover_units;
use super::coordinator::{IngestConfig, IngestCoordinator};
use super::db_setup::{DB_SCHEMA_VERSION, count_rows, ensure_schema, open_store, reset_schema};
use crate::cli::IngestArgs;
use crate::metadata::load_metadata;
use crate::model::{IngestCounts, IngestOptions, IngestPaths, IngestRunManifest, UnitReport};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = IngestConfig::from_args(&args);
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        input_root = %config.input_root.display(),
        db_path = %config.store_connection.display(),
        run_id = %run_id,
        "starting ingest"
    );

    // Inputs are checked before the store is touched so that a bad
    // invocation never costs a schema reset.
    config.validate()?;
    let metadata = load_metadata(&config.metadata_path)?;
    let metadata_sha256 = sha256_file(&config.metadata_path)?;
    let sources = discover_units(&config.input_root, config.layout)?;
    info!(
        metadata_records = metadata.len(),
        units = sources.len(),
        "loaded metadata and discovered units"
    );

    let mut connection = open_store(&config.store_connection)?;
    if config.reset_schema {
        reset_schema(&mut connection).context("schema reset failed; aborting run")?;
    } else {
        ensure_schema(&connection)?;
    }

    let metadata_record_count = metadata.len();
    let coordinator = IngestCoordinator::new(config, metadata)?;
    let reports = coordinator.run_units(&mut connection, &sources);

    let mut counts = summarize_reports(&reports);
    counts.metadata_record_count = metadata_record_count;
    counts.unit_count = sources.len();
    counts.posters_total = count_rows(&connection, "SELECT COUNT(*) FROM poster_info")?;

    let config = coordinator.config();
    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: if counts.failed_count == 0 {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        paths: IngestPaths {
            cache_root: args.cache_root.display().to_string(),
            db_path: config.store_connection.display().to_string(),
            input_root: config.input_root.display().to_string(),
            metadata_path: config.metadata_path.display().to_string(),
            run_manifest_path: run_manifest_path.display().to_string(),
        },
        options: IngestOptions {
            reset_schema: config.reset_schema,
            layout: config.layout.as_str().to_string(),
            figure_source: config.figure_source.as_str().to_string(),
            on_duplicate: config.on_duplicate.as_str().to_string(),
        },
        metadata_sha256,
        counts: counts.clone(),
        units: reports,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote ingest run manifest");
    info!(
        units = counts.unit_count,
        persisted = counts.persisted_count,
        skipped = counts.skipped_count,
        failed = counts.failed_count,
        posters_total = counts.posters_total,
        "ingest completed"
    );

    Ok(())
}

pub(crate) fn summarize_reports(reports: &[UnitReport]) -> IngestCounts {
    let mut counts = IngestCounts::default();
    for report in reports {
        match report.status.as_str() {
            "persisted" => {
                counts.persisted_count += 1;
                counts.blocks_inserted += report.blocks;
                counts.figures_inserted += report.figures;
                counts.tables_inserted += report.tables;
            }
            "skipped" => counts.skipped_count += 1,
            _ => counts.failed_count += 1,
        }
    }
    counts
}

pub(crate) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "posterdb".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--input-root".to_string(),
        args.input_root.display().to_string(),
        "--metadata-path".to_string(),
        args.metadata_path.display().to_string(),
        "--layout".to_string(),
        args.layout.as_str().to_string(),
        "--figure-source".to_string(),
        args.figure_source.as_str().to_string(),
        "--on-duplicate".to_string(),
        args.on_duplicate.as_str().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.reset_schema {
        command.push("--reset-schema".to_string());
    }

    command.join(" ")
}
