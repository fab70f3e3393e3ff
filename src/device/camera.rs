use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use walkdir::WalkDir;

use super::{Camera, KeyValueStore, PermissionStatus, PhotoHandle};
use crate::error::{Error, Result};

/// Image extensions a tethered camera or phone sync folder will drop
const PHOTO_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "heic", "webp"];

/// Key holding the inbox photos already taken, across sessions
pub const TAKEN_KEY: &str = "capturedSources";

/// Tethered camera.
///
/// Photos arrive in an inbox directory (tethering software, a phone sync
/// folder). Pressing the shutter takes the newest photo not taken before and
/// copies it into the capture directory. The set of taken photos is kept in
/// the key-value store so a restart doesn't take them again.
pub struct TetherCamera {
    inbox: PathBuf,
    capture_dir: PathBuf,
    kv: Arc<dyn KeyValueStore>,
    /// Loaded from the store on first capture
    taken: Mutex<Option<HashSet<PathBuf>>>,
}

impl TetherCamera {
    pub fn new(
        inbox: impl Into<PathBuf>,
        capture_dir: impl Into<PathBuf>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            inbox: inbox.into(),
            capture_dir: capture_dir.into(),
            kv,
            taken: Mutex::new(None),
        }
    }

    fn load_taken(&self) -> Result<HashSet<PathBuf>> {
        match self.kv.get(TAKEN_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(HashSet::new()),
        }
    }

    fn save_taken(&self, taken: &HashSet<PathBuf>) -> Result<()> {
        let mut sorted: Vec<&PathBuf> = taken.iter().collect();
        sorted.sort();
        self.kv.set(TAKEN_KEY, &serde_json::to_string(&sorted)?)
    }

    /// Newest photo in the inbox (top level only) that hasn't been taken yet
    fn newest_untaken(&self, taken: &HashSet<PathBuf>) -> Option<PathBuf> {
        WalkDir::new(&self.inbox)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| is_photo(e.path()))
            .filter(|e| !taken.contains(e.path()))
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                Some((modified, e.into_path()))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, path)| path)
    }
}

impl Camera for TetherCamera {
    fn request_permission(&self) -> Result<PermissionStatus> {
        match fs::read_dir(&self.inbox) {
            Ok(_) => Ok(PermissionStatus::Granted),
            Err(e) => {
                tracing::warn!(inbox = %self.inbox.display(), error = %e, "capture inbox not readable");
                Ok(PermissionStatus::Denied)
            }
        }
    }

    fn capture_photo(&self) -> Result<PhotoHandle> {
        let mut guard = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let loaded = self.load_taken().map_err(|e| {
                Error::DeviceUnavailable(format!("cannot read taken photos: {}", e))
            })?;
            *guard = Some(loaded);
        }
        let taken = guard.get_or_insert_with(HashSet::new);

        let source = self.newest_untaken(taken).ok_or_else(|| {
            Error::DeviceUnavailable(format!("no new photo in {}", self.inbox.display()))
        })?;

        fs::create_dir_all(&self.capture_dir).map_err(|e| {
            Error::DeviceUnavailable(format!("cannot create {}: {}", self.capture_dir.display(), e))
        })?;

        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let target = self.capture_dir.join(format!(
            "IMG_{}_{:04}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            taken.len(),
            extension
        ));

        fs::copy(&source, &target).map_err(|e| {
            Error::DeviceUnavailable(format!("cannot read {}: {}", source.display(), e))
        })?;

        tracing::info!(source = %source.display(), target = %target.display(), "photo captured");

        taken.insert(source);
        self.save_taken(taken)?;

        Ok(PhotoHandle {
            uri: target.to_string_lossy().to_string(),
        })
    }
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::MemoryKv;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_photo(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_missing_inbox_is_denied() {
        let dir = TempDir::new().unwrap();
        let camera = TetherCamera::new(
            dir.path().join("nope"),
            dir.path().join("captures"),
            Arc::new(MemoryKv::default()),
        );
        assert_eq!(camera.request_permission().unwrap(), PermissionStatus::Denied);
    }

    #[test]
    fn test_empty_inbox_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let camera = TetherCamera::new(dir.path(), dir.path().join("captures"), Arc::new(MemoryKv::default()));
        assert_eq!(camera.request_permission().unwrap(), PermissionStatus::Granted);
        assert!(matches!(camera.capture_photo(), Err(Error::DeviceUnavailable(_))));
    }

    #[test]
    fn test_captures_newest_first_and_never_twice() {
        let inbox = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_photo(inbox.path(), "old.jpg", 120);
        write_photo(inbox.path(), "new.JPG", 10);
        fs::write(inbox.path().join("notes.txt"), "skip me").unwrap();

        let camera = TetherCamera::new(inbox.path(), out.path(), Arc::new(MemoryKv::default()));

        let first = camera.capture_photo().unwrap();
        assert_eq!(fs::read(&first.uri).unwrap(), b"new.JPG");
        assert!(first.uri.ends_with(".jpg"));

        let second = camera.capture_photo().unwrap();
        assert_eq!(fs::read(&second.uri).unwrap(), b"old.jpg");
        assert_ne!(first.uri, second.uri);

        assert!(camera.capture_photo().is_err());
    }

    #[test]
    fn test_taken_photos_survive_restart() {
        let inbox = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_photo(inbox.path(), "only.jpg", 30);
        let kv = Arc::new(MemoryKv::default());

        let first_session = TetherCamera::new(inbox.path(), out.path(), kv.clone());
        first_session.capture_photo().unwrap();
        assert!(kv.raw(TAKEN_KEY).unwrap().contains("only.jpg"));

        let second_session = TetherCamera::new(inbox.path(), out.path(), kv.clone());
        assert!(matches!(second_session.capture_photo(), Err(Error::DeviceUnavailable(_))));

        write_photo(inbox.path(), "fresh.jpg", 5);
        let handle = second_session.capture_photo().unwrap();
        assert_eq!(fs::read(&handle.uri).unwrap(), b"fresh.jpg");
    }

    #[test]
    fn test_unreadable_taken_set_refuses_capture() {
        let inbox = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_photo(inbox.path(), "only.jpg", 30);

        let kv = Arc::new(MemoryKv::with(TAKEN_KEY, "not json"));
        let camera = TetherCamera::new(inbox.path(), out.path(), kv);
        assert!(matches!(camera.capture_photo(), Err(Error::DeviceUnavailable(_))));
    }
}
