use std::fs;
use std::path::{Path, PathBuf};

use super::{Album, Asset, Gallery, PhotoHandle};
use crate::error::{Error, Result};

/// Gallery on the local filesystem: each album is a directory under `root`.
pub struct DirectoryGallery {
    root: PathBuf,
}

impl DirectoryGallery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The user's pictures directory, falling back to ~/Pictures
    pub fn default_root() -> Option<PathBuf> {
        dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
    }

    fn album_dir(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.trim().is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(Error::StorageWrite(format!("invalid album name {:?}", name)));
        }
        Ok(self.root.join(name))
    }
}

impl Gallery for DirectoryGallery {
    fn create_asset(&self, photo: &PhotoHandle) -> Result<Asset> {
        let path = PathBuf::from(&photo.uri);
        if !path.is_file() {
            return Err(Error::StorageWrite(format!("photo {} does not exist", photo.uri)));
        }
        Ok(Asset { path })
    }

    fn album(&self, name: &str) -> Result<Option<Album>> {
        let path = self.album_dir(name)?;
        Ok(path.is_dir().then(|| Album {
            name: name.to_string(),
            path,
        }))
    }

    fn create_album(&self, name: &str, asset: &Asset) -> Result<Album> {
        let path = self.album_dir(name)?;
        fs::create_dir_all(&path)
            .map_err(|e| Error::StorageWrite(format!("cannot create album {}: {}", path.display(), e)))?;

        tracing::info!(album = name, path = %path.display(), "album created");

        let album = Album {
            name: name.to_string(),
            path,
        };
        self.add_assets_to_album(std::slice::from_ref(asset), &album)?;
        Ok(album)
    }

    fn add_assets_to_album(&self, assets: &[Asset], album: &Album) -> Result<()> {
        for asset in assets {
            let file_name = asset
                .path
                .file_name()
                .ok_or_else(|| Error::StorageWrite(format!("asset {} has no file name", asset.path.display())))?;
            let target = free_path(&album.path.join(file_name));

            fs::copy(&asset.path, &target)
                .map_err(|e| Error::StorageWrite(format!("cannot copy into {}: {}", target.display(), e)))?;

            tracing::debug!(asset = %asset.path.display(), target = %target.display(), "asset added to album");
        }
        Ok(())
    }
}

/// `path` itself if unused, otherwise `stem-1.ext`, `stem-2.ext`, ...
fn free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    (1..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{}-{}.{}", stem, n, ext),
                None => format!("{}-{}", stem, n),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::save_to_album;
    use tempfile::TempDir;

    #[test]
    fn test_first_save_creates_album_then_reuses_it() {
        let dir = TempDir::new().unwrap();
        let photo_path = dir.path().join("IMG_1.jpg");
        fs::write(&photo_path, b"jpeg").unwrap();
        let photo = PhotoHandle {
            uri: photo_path.to_string_lossy().to_string(),
        };

        let gallery = DirectoryGallery::new(dir.path().join("Pictures"));
        assert_eq!(gallery.album("GeoCam").unwrap(), None);

        let album = save_to_album(&gallery, &photo, "GeoCam").unwrap();
        assert!(album.path.join("IMG_1.jpg").is_file());

        save_to_album(&gallery, &photo, "GeoCam").unwrap();
        assert!(album.path.join("IMG_1-1.jpg").is_file());
        assert_eq!(gallery.album("GeoCam").unwrap(), Some(album));
    }

    #[test]
    fn test_missing_photo_is_a_write_failure() {
        let dir = TempDir::new().unwrap();
        let gallery = DirectoryGallery::new(dir.path());
        let photo = PhotoHandle {
            uri: dir.path().join("gone.jpg").to_string_lossy().to_string(),
        };
        assert!(matches!(gallery.create_asset(&photo), Err(Error::StorageWrite(_))));
    }

    #[test]
    fn test_album_names_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let gallery = DirectoryGallery::new(dir.path());
        assert!(gallery.album("../elsewhere").is_err());
        assert!(gallery.album("").is_err());
    }
}
