use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, FieldViolation};

/// Accepted upload content types.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Prefix under which stored images are publicly addressable.
const PUBLIC_PREFIX: &str = "images/";

/// Persist an uploaded image under the images directory.
///
/// Files are named `<unix-millis>-<original name>`; the returned value is the
/// public relative path (`images/<filename>`) stored on the post record.
pub fn store_image(
    dir: &Path,
    original_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> AppResult<String> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::Validation(vec![FieldViolation::new(
            "image",
            "Only PNG and JPEG images are accepted",
        )]));
    }

    let filename = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_filename(original_name)
    );

    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Internal(format!("failed to create images dir: {}", e)))?;
    std::fs::write(dir.join(&filename), bytes)
        .map_err(|e| AppError::Internal(format!("failed to store image: {}", e)))?;

    Ok(format!("{}{}", PUBLIC_PREFIX, filename))
}

/// Best-effort removal of a previously stored image. Runs when a post's
/// image reference is superseded or the post is deleted; failures are
/// logged, never surfaced, since the mutation itself already succeeded.
pub fn clear_image(dir: &Path, image_path: &str) {
    let Some(path) = resolve(dir, image_path) else {
        tracing::warn!("refusing to clear suspicious image path: {}", image_path);
        return;
    };

    if let Err(e) = std::fs::remove_file(&path) {
        tracing::warn!("failed to remove stored image {}: {}", path.display(), e);
    }
}

/// Resolve a stored `images/<filename>` reference to its on-disk path.
/// Returns `None` for references that would escape the images directory.
pub fn resolve(dir: &Path, image_path: &str) -> Option<PathBuf> {
    let filename = image_path.strip_prefix(PUBLIC_PREFIX).unwrap_or(image_path);
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return None;
    }
    Some(dir.join(filename))
}

fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
