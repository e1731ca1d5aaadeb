//! Intake screen: turns user-picked files into an [`ImageHandle`].

use super::image::ImageHandle;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Read `{path}` failed. Error: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads one file. No type or size validation is done here; the filter
/// service is the one that rejects bad bytes.
pub async fn accept_file(path: impl AsRef<Path>) -> Result<ImageHandle, IntakeError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|e| IntakeError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let handle = ImageHandle::new(name, bytes);
    log::info!(
        "accepted {} ({}, {})",
        handle.name,
        handle.content_type,
        handle.size_label()
    );

    Ok(handle)
}

/// Every file is read on its own; only the last one that could be read is kept.
pub async fn accept_files(paths: &[impl AsRef<Path>]) -> Option<ImageHandle> {
    let mut latest = None;

    for path in paths {
        match accept_file(path).await {
            Ok(handle) => latest = Some(handle),
            Err(e) => log::warn!("{e}"),
        }
    }

    latest
}
