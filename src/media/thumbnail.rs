use image::{imageops::FilterType, ImageFormat};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Size of generated thumbnails (square bound)
const THUMBNAIL_SIZE: u32 = 256;

/// Thumbnail cache directory
/// Returns ~/.cache/geocam/thumbnails on Linux
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("geocam").join("thumbnails"))
}

/// Where the thumbnail for `uri` lives (doesn't generate, just returns the expected path)
pub fn thumbnail_path(cache_dir: &Path, uri: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    uri.hash(&mut hasher);
    cache_dir.join(format!("{:016x}.jpg", hasher.finish()))
}

/// Generate (or reuse) the thumbnail for one photo.
/// Returns None if the photo can't be decoded or the cache can't be written.
pub fn generate(cache_dir: &Path, uri: &str) -> Option<PathBuf> {
    let target = thumbnail_path(cache_dir, uri);
    if target.exists() {
        return Some(target);
    }

    let img = match image::open(uri) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(uri, error = %e, "cannot decode photo for thumbnail");
            return None;
        }
    };

    fs::create_dir_all(cache_dir).ok()?;

    // JPEG has no alpha channel
    let thumbnail = img
        .resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
        .to_rgb8();

    if let Err(e) = thumbnail.save_with_format(&target, ImageFormat::Jpeg) {
        tracing::warn!(target = %target.display(), error = %e, "cannot save thumbnail");
        return None;
    }

    tracing::debug!(uri, thumbnail = %target.display(), "thumbnail generated");
    Some(target)
}

/// Generate thumbnails for a batch of photos, returning the ones that worked
pub fn generate_all(cache_dir: &Path, uris: &[String]) -> Vec<(String, PathBuf)> {
    uris.iter()
        .filter_map(|uri| generate(cache_dir, uri).map(|path| (uri.clone(), path)))
        .collect()
}
