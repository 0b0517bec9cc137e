//! Whole-file JSON writes: a reader sees either the old file or the new one,
//! never a partial write.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `value` as pretty JSON to `path`, replacing any existing file.
pub fn replace_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = write_temp(path, value)?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Like [`replace_json`] but fails if `path` already exists.
pub fn create_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = write_temp(path, value)?;
    tmp.persist_noclobber(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(())
}

fn write_temp<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
