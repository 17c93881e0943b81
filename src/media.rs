//! Local filesystem storage for uploaded avatar images.

use crate::error::AppError;
use image::ImageFormat;
use std::path::{Path, PathBuf};

const AVATAR_DIR: &str = "avatars";

/// Image formats accepted for avatars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageKind {
    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Identify an accepted format from the leading bytes, then decode the whole image.
    /// Truncated or corrupted data is rejected even when the signature matches.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let format = image::guess_format(bytes).ok()?;
        let kind = Self::from_format(format)?;
        match image::load_from_memory_with_format(bytes, format) {
            Ok(img) => {
                tracing::debug!(?kind, width = img.width(), height = img.height(), "decoded avatar");
                Some(kind)
            }
            Err(e) => {
                tracing::debug!(?kind, error = %e, "avatar failed to decode");
                None
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    /// `url_prefix` is expected to start and end with `/`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        MediaStorage {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a stored name such as `avatars/<uuid>.png`.
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.url_prefix, name)
    }

    /// Write avatar bytes under a fresh name and return that name (relative to the root).
    pub async fn save_avatar(&self, kind: ImageKind, bytes: &[u8]) -> Result<String, AppError> {
        let dir = self.root.join(AVATAR_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.{}", uuid::Uuid::new_v4().simple(), kind.extension());
        tokio::fs::write(dir.join(&file_name), bytes).await?;
        let name = format!("{}/{}", AVATAR_DIR, file_name);
        tracing::debug!(name = %name, size = bytes.len(), "stored avatar");
        Ok(name)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        if name.split('/').any(|part| part == "..") {
            return Err(AppError::Internal(format!("refusing to delete media path {}", name)));
        }
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(img: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_accepted_formats() {
        let png = encode(image::DynamicImage::new_rgb8(2, 2), ImageFormat::Png);
        let jpeg = encode(image::DynamicImage::new_rgb8(2, 2), ImageFormat::Jpeg);
        let gif = encode(image::DynamicImage::new_rgba8(2, 2), ImageFormat::Gif);
        assert_eq!(ImageKind::decode(&png), Some(ImageKind::Png));
        assert_eq!(ImageKind::decode(&jpeg), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::decode(&gif), Some(ImageKind::Gif));
    }

    #[test]
    fn rejects_non_images_and_corrupt_data() {
        assert_eq!(ImageKind::decode(b"hello world"), None);
        assert_eq!(ImageKind::decode(b""), None);

        let mut fake = b"\x89PNG\r\n\x1a\n".to_vec();
        fake.extend_from_slice(b"this is not image data at all");
        assert_eq!(ImageKind::decode(&fake), None);

        let png = encode(image::DynamicImage::new_rgb8(2, 2), ImageFormat::Png);
        assert_eq!(ImageKind::decode(&png[..png.len() / 2]), None);

        assert_eq!(ImageKind::decode(b"BM\0\0\0\0\0\0\0\0"), None);
    }

    #[tokio::test]
    async fn save_then_delete_avatar() {
        let root = std::env::temp_dir().join(format!("profiles-media-{}", uuid::Uuid::new_v4()));
        let media = MediaStorage::new(&root, "/media/");
        let name = media.save_avatar(ImageKind::Png, b"\x89PNG\r\n\x1a\n").await.unwrap();
        assert!(name.starts_with("avatars/") && name.ends_with(".png"));
        assert_eq!(media.url(&name), format!("/media/{}", name));
        assert!(root.join(&name).exists());

        media.delete(&name).await.unwrap();
        assert!(!root.join(&name).exists());
        media.delete(&name).await.unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }
}
