//! Bundle extraction.
//!
//! The zip crate is synchronous, so extraction of a multi-hundred-megabyte
//! bundle runs on the blocking pool rather than stalling the runtime.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Extract the zip at `archive` into `dest`, creating it if needed.
pub async fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
        .await
        .context("extraction task panicked")?
}

fn extract_blocking(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open bundle {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("Failed to read bundle as zip")?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract bundle to {}", dest.display()))?;
    Ok(())
}

/// List the `.jsonlines` files directly inside `dir`, sorted by name so runs
/// are deterministic.
pub fn list_jsonlines(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read extracted directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_jsonlines = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("jsonlines"))
            .unwrap_or(false);
        if path.is_file() && is_jsonlines {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_jsonlines_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["subject.jsonlines", "episode.jsonlines", "notes.txt", "aux.json"] {
            std::fs::write(tmp.path().join(name), "").unwrap();
        }
        let files = list_jsonlines(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["episode.jsonlines", "subject.jsonlines"]);
    }

    #[tokio::test]
    async fn test_corrupt_bundle_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("archive.zip");
        std::fs::write(&bad, b"not a zip").unwrap();
        let err = extract_zip(&bad, &tmp.path().join("out")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("zip"));
    }
}
