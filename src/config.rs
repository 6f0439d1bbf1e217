use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::batch::DEFAULT_BATCH_DIVISOR;
use crate::reader::DEFAULT_CHUNK_LINES;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Manifest document listing the latest bundle.
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    /// The manifest is a small document; a stalled server fails fast.
    #[serde(default = "default_manifest_timeout_secs")]
    pub manifest_timeout_secs: u64,
    /// Bundle downloads can run to hundreds of megabytes.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Scratch directory for the bundle, the manifest, and the extraction
    /// target. Removed best-effort after a run.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            manifest_timeout_secs: default_manifest_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_manifest_url() -> String {
    "https://raw.githubusercontent.com/bangumi/Archive/refs/heads/master/aux/latest.json"
        .to_string()
}
fn default_manifest_timeout_secs() -> u64 {
    100
}
fn default_download_timeout_secs() -> u64 {
    600
}
fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Lines per chunk; one chunk is one transaction.
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,
    /// Sub-batch size is `max(1, chunk_len / batch_divisor)`. Chunk-relative
    /// on purpose: it mirrors the upstream tool's sizing.
    #[serde(default = "default_batch_divisor")]
    pub batch_divisor: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_lines: default_chunk_lines(),
            batch_divisor: default_batch_divisor(),
        }
    }
}

fn default_chunk_lines() -> usize {
    DEFAULT_CHUNK_LINES
}
fn default_batch_divisor() -> usize {
    DEFAULT_BATCH_DIVISOR
}

impl Config {
    /// A config pointing at `path`, defaults everywhere else.
    pub fn with_db_path(path: PathBuf) -> Self {
        Self {
            db: DbConfig { path },
            archive: ArchiveConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.ingest.chunk_lines == 0 {
        anyhow::bail!("ingest.chunk_lines must be > 0");
    }
    if config.ingest.batch_divisor == 0 {
        anyhow::bail!("ingest.batch_divisor must be > 0");
    }
    if config.archive.manifest_timeout_secs == 0 {
        anyhow::bail!("archive.manifest_timeout_secs must be > 0");
    }
    if config.archive.download_timeout_secs == 0 {
        anyhow::bail!("archive.download_timeout_secs must be > 0");
    }
    if config.archive.manifest_url.is_empty() {
        anyhow::bail!("archive.manifest_url must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "data/archive.sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.chunk_lines, 200_000);
        assert_eq!(config.ingest.batch_divisor, 20_000);
        assert_eq!(config.archive.manifest_timeout_secs, 100);
        assert_eq!(config.archive.download_timeout_secs, 600);
        assert!(config.archive.manifest_url.contains("latest.json"));
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "x.sqlite"

            [ingest]
            chunk_lines = 50000
            batch_divisor = 100

            [archive]
            manifest_url = "http://127.0.0.1:9/latest.json"
            download_timeout_secs = 5
            temp_dir = "scratch"
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.chunk_lines, 50_000);
        assert_eq!(config.ingest.batch_divisor, 100);
        assert_eq!(config.archive.temp_dir, PathBuf::from("scratch"));
    }
}
