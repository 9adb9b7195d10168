//! Operator-supplied image input

use crate::error::{AtlasError, Result};
use std::path::Path;

/// Raster image bytes accepted for recognition
#[derive(Debug, Clone)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl ImageInput {
    /// Accept bytes only if their magic number identifies a raster format
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(AtlasError::InputRejected("empty input".to_string()));
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| AtlasError::InputRejected(format!("not a recognized image: {}", e)))?;

        Ok(Self {
            mime_type: format.to_mime_type(),
            bytes,
        })
    }

    /// Read an image file, rejecting files that are not images
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(mime) = mime_from_extension(path) {
            if !mime.starts_with("image/") {
                return Err(AtlasError::InputRejected(format!(
                    "{} is {}, not an image",
                    path.display(),
                    mime
                )));
            }
        }

        let bytes = std::fs::read(path)?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type implied by a file extension, if the extension is known
fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => return None,
    };

    Some(mime)
}
