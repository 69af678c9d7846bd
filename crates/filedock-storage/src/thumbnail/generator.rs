//! Thumbnail generator for image files.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::imageops::FilterType;

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;
use filedock_core::traits::storage::StorageProvider;

/// Generates resized derivatives of stored image files.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    /// Storage provider for reading source files and writing derivatives.
    provider: Arc<dyn StorageProvider>,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Check if a file is a supported image format for thumbnailing.
    pub fn is_supported(mime_type: &str) -> bool {
        matches!(
            mime_type,
            "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/bmp"
        )
    }

    /// Generate a derivative of the specified width.
    ///
    /// The derivative is written next to the original as
    /// `<source_path>_<width>`, re-encoded in the source format. Returns the
    /// storage path of the written derivative.
    pub async fn generate(&self, source_path: &str, width: u32) -> AppResult<String> {
        let source_bytes = self.provider.read_bytes(source_path).await?;

        let thumbnail_bytes =
            tokio::task::spawn_blocking(move || resize_to_width(&source_bytes, width))
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e)
                })??;

        let target = format!("{source_path}_{width}");
        self.provider.write(&target, thumbnail_bytes).await?;

        tracing::debug!(
            source = source_path,
            width,
            output = %target,
            "Generated thumbnail"
        );

        Ok(target)
    }
}

/// Decode, scale to the exact target width preserving aspect ratio, and
/// re-encode in the source format.
fn resize_to_width(data: &[u8], width: u32) -> AppResult<Bytes> {
    if data.is_empty() {
        return Err(AppError::validation("Empty image data"));
    }

    let format = image::guess_format(data).map_err(|e| {
        AppError::with_source(ErrorKind::Validation, "Unrecognized image format", e)
    })?;

    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| AppError::with_source(ErrorKind::Validation, "Failed to decode image", e))?;

    let height = ((u64::from(width) * u64::from(img.height())) / u64::from(img.width())).max(1);
    let resized = img.resize_exact(width, height as u32, FilterType::Lanczos3);

    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, format)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode thumbnail", e))?;

    Ok(Bytes::from(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::LocalStorageProvider;

    fn png_fixture(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        Bytes::from(buf.into_inner())
    }

    async fn make_generator() -> (tempfile::TempDir, Arc<dyn StorageProvider>, ThumbnailGenerator)
    {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .expect("provider"),
        );
        let generator = ThumbnailGenerator::new(Arc::clone(&provider));
        (dir, provider, generator)
    }

    #[tokio::test]
    async fn test_generate_writes_sibling_derivative() {
        let (_dir, provider, generator) = make_generator().await;
        provider.write("img", png_fixture(16, 8)).await.unwrap();

        let path = generator.generate("img", 4).await.unwrap();

        assert_eq!(path, "img_4");
        let bytes = provider.read_bytes("img_4").await.unwrap();
        let thumb = image::load_from_memory(&bytes).unwrap();
        assert_eq!(thumb.width(), 4);
        assert_eq!(thumb.height(), 2);
    }

    #[tokio::test]
    async fn test_generate_missing_source_fails() {
        let (_dir, _provider, generator) = make_generator().await;
        let err = generator.generate("absent", 4).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_generate_rejects_non_image_data() {
        let (_dir, provider, generator) = make_generator().await;
        provider
            .write("not-an-image", Bytes::from_static(b"plain text"))
            .await
            .unwrap();

        let err = generator.generate("not-an-image", 4).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_is_supported() {
        assert!(ThumbnailGenerator::is_supported("image/png"));
        assert!(!ThumbnailGenerator::is_supported("application/pdf"));
    }
}
