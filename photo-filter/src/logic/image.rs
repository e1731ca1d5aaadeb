//! In-memory image handle shared by every screen.

use bytes::Bytes;
use image::ImageFormat;
use std::{fmt, path::Path};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Image bytes plus the content type used for upload and preview.
///
/// Cloning only bumps a reference count. A handle is never mutated: a new
/// upload or a new filter result produces a new handle.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageHandle {
    /// The content type is sniffed from the magic bytes first, then from the
    /// extension of `name`. Undecodable bytes are accepted as-is.
    pub fn new(name: impl ToString, bytes: impl Into<Bytes>) -> ImageHandle {
        let name = name.to_string();
        let bytes = bytes.into();

        let content_type = image::guess_format(&bytes)
            .or_else(|_| ImageFormat::from_path(Path::new(&name)))
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| FALLBACK_CONTENT_TYPE.to_string());

        ImageHandle {
            name,
            content_type,
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size_label(&self) -> String {
        pretty_bytes_size(self.len())
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn pretty_bytes_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
