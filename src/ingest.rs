//! Ingestion pipeline orchestration.
//!
//! Drives the full run: manifest → bundle download → extraction → per-file
//! ingestion → cleanup. Files are processed one at a time and chunks within
//! a file strictly in order; a parse or commit failure anywhere halts the
//! whole run, leaving the store at the last committed chunk. Only unknown
//! file names and temp-file cleanup failures are absorbed as warnings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::batch::{self, SubjectIdCounter};
use crate::config::{Config, IngestConfig};
use crate::db;
use crate::dispatch::EntityKind;
use crate::extract;
use crate::fetch;
use crate::reader;
use crate::sink::{self, RecordBuffer};

/// Final outcome of one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub database_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Acquire the latest archive bundle and rebuild the snapshot store.
/// Never returns `Err`; failures land in the outcome so the caller can
/// report them uniformly.
pub async fn run_archive(config: &Config, token: Option<&str>, keep_temp: bool) -> RunOutcome {
    let result = run_inner(config, token).await;

    // Cleanup is best-effort on every exit path and never overrides the
    // primary result.
    if !keep_temp {
        cleanup(&config.archive.temp_dir);
    }

    match result {
        Ok(()) => RunOutcome {
            success: true,
            database_path: Some(config.db.path.clone()),
            error: None,
        },
        Err(e) => RunOutcome {
            success: false,
            database_path: None,
            error: Some(format!("{:#}", e)),
        },
    }
}

async fn run_inner(config: &Config, token: Option<&str>) -> Result<()> {
    let temp = &config.archive.temp_dir;
    tokio::fs::create_dir_all(temp)
        .await
        .with_context(|| format!("Failed to create temp directory {}", temp.display()))?;
    let zip_path = temp.join("archive.zip");
    let extract_path = temp.join("extracted");

    println!("Downloading archive manifest.");
    let manifest = fetch::fetch_manifest(
        &config.archive.manifest_url,
        token,
        Duration::from_secs(config.archive.manifest_timeout_secs),
    )
    .await?;
    println!(
        "Manifest ok: {} ({} bytes, updated {}).",
        manifest.name, manifest.size, manifest.updated_at
    );

    let pool = db::connect(config).await?;
    sink::insert_archive_info(&pool, &manifest).await?;

    println!("Downloading archive bundle. This may take a while.");
    fetch::download_bundle(
        &manifest.url,
        token,
        Duration::from_secs(config.archive.download_timeout_secs),
        &zip_path,
    )
    .await?;
    println!("Bundle downloaded.");

    println!("Extracting bundle.");
    extract::extract_zip(&zip_path, &extract_path).await?;

    ingest_dir(&pool, &extract_path, &config.ingest).await?;

    pool.close().await;
    Ok(())
}

/// Ingest every `.jsonlines` file in `dir`. Unknown file names are skipped
/// with a warning; any other failure aborts and propagates.
pub async fn ingest_dir(pool: &SqlitePool, dir: &Path, cfg: &IngestConfig) -> Result<()> {
    for file in extract::list_jsonlines(dir)? {
        let Some(kind) = EntityKind::from_path(&file) else {
            eprintln!("Warning: Unknown file: {}. Skipping.", file.display());
            continue;
        };
        println!("Ingesting file: {}", file.display());
        let committed = ingest_file(pool, kind, &file, cfg)
            .await
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        println!(
            "Finished ingesting {}: {} {} records.",
            file.display(),
            committed,
            kind
        );
    }
    Ok(())
}

/// Ingest one file chunk by chunk: read → deserialize concurrently →
/// commit as a single transaction. Returns the number of records committed.
pub async fn ingest_file(
    pool: &SqlitePool,
    kind: EntityKind,
    path: &Path,
    cfg: &IngestConfig,
) -> Result<u64> {
    // One id sequence per file, spanning all of its chunks.
    let subject_ids = SubjectIdCounter::new();
    let mut chunker = reader::open_file(path, cfg.chunk_lines).await?;
    let mut buffer = RecordBuffer::new();
    let mut committed = 0u64;

    while let Some(lines) = chunker.next_chunk().await? {
        let records = batch::deserialize_chunk(kind, lines, cfg.batch_divisor, &subject_ids).await?;
        for record in records {
            buffer.push(record);
        }
        let chunk_len = buffer.len() as u64;
        buffer.commit(pool).await?;
        committed += chunk_len;
    }

    Ok(committed)
}

fn cleanup(temp: &Path) {
    if !temp.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(temp) {
        eprintln!(
            "Warning: Failed to delete temporary files at {}: {}. Please delete them manually.",
            temp.display(),
            e
        );
    }
}
