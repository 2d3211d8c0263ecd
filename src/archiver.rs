use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ScrapeError;
use crate::models::{NormalizedReview, ReviewDataset};

/// Writes the bare review array.
pub fn write_reviews(path: &Path, reviews: &[NormalizedReview]) -> Result<(), ScrapeError> {
    write_json(path, &reviews)
}

/// Writes the reviews wrapped with request metadata.
pub fn write_dataset(path: &Path, dataset: &ReviewDataset<'_>) -> Result<(), ScrapeError> {
    write_json(path, dataset)
}

// Serialize fully before touching disk, then swap the file in with a rename
// so an existing output is either replaced whole or left alone.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp_path = build_temp_path(path);
    let written = fs::write(&temp_path, format!("{json}\n")).and_then(|()| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}

fn build_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => {
            temp_path.set_extension(format!("{ext}.tmp"));
        }
        _ => {
            temp_path.set_extension("tmp");
        }
    }
    temp_path
}
