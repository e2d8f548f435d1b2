//! Filesystem store for post images
//!
//! One file per post, named `{post_id}.{format}` under a base directory.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

static DATA_URL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/[a-zA-Z]+;base64,").expect("hardcoded data url regex is invalid")
});

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_dir: PathBuf,
    format: String,
}

impl ImageStore {
    pub fn new(base_dir: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            format: format.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, post_id: i64) -> PathBuf {
        self.base_dir.join(format!("{}.{}", post_id, self.format))
    }

    /// Write the image for `post_id`, creating the base directory if needed.
    pub async fn save(&self, post_id: i64, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.base_dir).await?;
        fs::write(self.path_for(post_id), bytes).await?;
        tracing::debug!(post_id, size = bytes.len(), "image stored");
        Ok(())
    }

    /// Stored image as base64, `None` if the file does not exist.
    pub async fn load_base64(&self, post_id: i64) -> io::Result<Option<String>> {
        match fs::read(self.path_for(post_id)).await {
            Ok(bytes) => Ok(Some(STANDARD.encode(bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the image; a missing file is not an error.
    pub async fn delete(&self, post_id: i64) -> io::Result<()> {
        match fs::remove_file(self.path_for(post_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(post_id, "image file already missing on delete");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, post_id: i64) -> bool {
        fs::try_exists(self.path_for(post_id)).await.unwrap_or(false)
    }
}

/// Decode a client supplied image, accepting an optional
/// `data:image/<type>;base64,` prefix.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = DATA_URL_PREFIX.replace(input.trim(), "");
    STANDARD.decode(payload.as_bytes())
}

pub fn is_jpeg(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SOI marker followed by an APP0 segment header
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn decode_strips_data_url_prefix() {
        let encoded = STANDARD.encode(JPEG_HEADER);
        let with_prefix = format!("data:image/jpeg;base64,{}", encoded);

        assert_eq!(decode_base64(&encoded).unwrap(), JPEG_HEADER);
        assert_eq!(decode_base64(&with_prefix).unwrap(), JPEG_HEADER);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_base64("not base64 at all!").is_err());
    }

    #[test]
    fn jpeg_sniffing() {
        assert!(is_jpeg(JPEG_HEADER));
        assert!(!is_jpeg(b"\x89PNG\r\n\x1a\n0000"));
        assert!(!is_jpeg(b"plain text"));
    }

    #[tokio::test]
    async fn save_load_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"), "jpeg");

        assert_eq!(store.path_for(7), dir.path().join("images").join("7.jpeg"));
        assert_eq!(store.load_base64(7).await.unwrap(), None);

        store.save(7, JPEG_HEADER).await.unwrap();
        assert!(store.exists(7).await);
        assert_eq!(
            store.load_base64(7).await.unwrap(),
            Some(STANDARD.encode(JPEG_HEADER))
        );

        store.delete(7).await.unwrap();
        assert!(!store.exists(7).await);
        // second delete is a no-op
        store.delete(7).await.unwrap();
    }
}
