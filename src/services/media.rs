//! Storage for uploaded movie posters.
//!
//! Files live under the configured media root and are served back under the
//! media URL prefix. The database keeps only the path relative to the root.

use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

const MOVIE_IMAGE_DIR: &str = "uploads/movies";

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub fn new(root: PathBuf, url_prefix: &str) -> Self {
        let trimmed = url_prefix.trim_matches('/');
        let trimmed = if trimmed.is_empty() { "media" } else { trimmed };
        Self {
            root,
            url_prefix: format!("/{trimmed}"),
        }
    }

    /// Path the stored files are served under, always starting with `/`.
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a stored relative path.
    pub fn url_for(&self, relative: Option<&str>) -> Option<String> {
        relative.map(|path| format!("{}/{}", self.url_prefix, path.trim_start_matches('/')))
    }

    /// Validates `data` as an image and writes it next to the other posters.
    /// Returns the stored path relative to the media root.
    pub async fn save_movie_image(&self, title: &str, data: &[u8]) -> Result<String, AppError> {
        let format = detect_image(data)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        let relative = format!("{}/{}-{}.{}", MOVIE_IMAGE_DIR, slugify(title), Uuid::new_v4(), extension);
        let absolute = self.root.join(&relative);

        if let Some(dir) = absolute.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&absolute, data).await?;

        info!(path = %relative, bytes = data.len(), "stored movie image");
        Ok(relative)
    }

    /// Best-effort removal of a previously stored file.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove old media file");
        }
    }
}

/// Accepts only formats we can fully decode.
pub fn detect_image(data: &[u8]) -> Result<ImageFormat, AppError> {
    let invalid = || {
        AppError::validation(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        )
    };

    if data.is_empty() {
        return Err(AppError::validation("The submitted file is empty."));
    }

    let format = image::guess_format(data).map_err(|_| invalid())?;
    if !matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
    ) {
        return Err(invalid());
    }

    image::load_from_memory_with_format(data, format).map_err(|_| invalid())?;
    Ok(format)
}

/// Lowercase ASCII slug: runs of anything non-alphanumeric become one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "movie".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify("The Matrix: Reloaded!"), "the-matrix-reloaded");
        assert_eq!(slugify("  Amélie  "), "am-lie");
        assert_eq!(slugify("???"), "movie");
    }

    #[test]
    fn text_is_not_an_image() {
        assert!(matches!(detect_image(b"hello, world"), Err(AppError::Validation(_))));
        assert!(matches!(detect_image(b""), Err(AppError::Validation(_))));
    }

    #[test]
    fn truncated_png_is_rejected() {
        let bytes = png_bytes();
        assert!(detect_image(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn url_joins_prefix_and_path() {
        let media = MediaStorage::new(PathBuf::from("/srv/media"), "/media/");
        assert_eq!(
            media.url_for(Some("uploads/movies/a.png")).as_deref(),
            Some("/media/uploads/movies/a.png")
        );
        assert_eq!(media.url_for(None), None);
        assert_eq!(MediaStorage::new(PathBuf::from("m"), "uploads").url_prefix(), "/uploads");
    }

    #[tokio::test]
    async fn stores_valid_png_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStorage::new(dir.path().to_path_buf(), "/media");

        let relative = media.save_movie_image("Blade Runner", &png_bytes()).await.unwrap();
        assert!(relative.starts_with("uploads/movies/blade-runner-"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        media.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());
    }
}
