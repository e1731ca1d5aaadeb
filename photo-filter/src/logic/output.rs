//! Output screen: saving the processed image to disk.

use super::image::ImageHandle;
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Writes `image` to `dir/filename`, replacing any existing file.
///
/// Returns `Ok(None)` without touching the disk when there is nothing to save.
pub fn download(
    image: Option<&ImageHandle>,
    dir: impl AsRef<Path>,
    filename: &str,
) -> Result<Option<PathBuf>> {
    let Some(image) = image.filter(|image| !image.is_empty()) else {
        log::info!("nothing to download");
        return Ok(None);
    };

    let dir = dir.as_ref();
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create download directory {} failed", dir.display()))?;
    }

    let path = dir.join(filename);
    fs::write(&path, &image.bytes)
        .with_context(|| format!("save {} failed", path.display()))?;

    log::info!("saved {} ({})", path.display(), image.size_label());
    Ok(Some(path))
}
