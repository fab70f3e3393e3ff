use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};

use super::data::{CaptureEntry, LocationState, PermissionState};
use super::store::EntryStore;
use crate::device::{self, Camera, Gallery, PhotoHandle};
use crate::error::{Error, Result};

/// A photo paired with the location known when it was taken.
///
/// Coordinates travel with the record only; nothing is written into the
/// image file itself.
#[derive(Debug, Clone)]
pub struct GeotaggedPhoto {
    pub photo: PhotoHandle,
    pub location: LocationState,
}

/// Capture workflow: shutter, geotag, gallery, entry list.
///
/// Invocations are serialized; a second capture waits for the first.
pub struct CaptureWorkflow {
    camera: Arc<dyn Camera>,
    gallery: Arc<dyn Gallery>,
    store: Arc<EntryStore>,
    album_name: String,
    in_flight: Mutex<()>,
}

impl CaptureWorkflow {
    pub fn new(
        camera: Arc<dyn Camera>,
        gallery: Arc<dyn Gallery>,
        store: Arc<EntryStore>,
        album_name: impl Into<String>,
    ) -> Self {
        Self {
            camera,
            gallery,
            store,
            album_name: album_name.into(),
            in_flight: Mutex::new(()),
        }
    }

    /// Take one photo and record it.
    ///
    /// Nothing is recorded unless the photo reached the gallery. If only the
    /// final list write fails, the entry is kept in memory and the error is
    /// still returned so the failure can be shown.
    pub fn capture(&self, permission: PermissionState, location: LocationState) -> Result<CaptureEntry> {
        let _guard = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if permission != PermissionState::Granted {
            return Err(Error::PermissionDenied("camera access was not granted".into()));
        }

        let photo = self.camera.capture_photo()?;
        let tagged = attach_location(photo, location);

        let album = device::save_to_album(self.gallery.as_ref(), &tagged.photo, &self.album_name)?;
        tracing::info!(uri = %tagged.photo.uri, album = %album.name, "photo saved to gallery");

        let entry = CaptureEntry::new(tagged.photo.uri, tagged.location, Utc::now());
        self.store.append(entry.clone())?;

        Ok(entry)
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }
}

fn attach_location(photo: PhotoHandle, location: LocationState) -> GeotaggedPhoto {
    if location == LocationState::Unknown {
        tracing::debug!(uri = %photo.uri, "no location known, recording without coordinates");
    }
    GeotaggedPhoto { photo, location }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::{FakeCamera, FakeGallery, MemoryKv};
    use crate::device::{Coordinates, PermissionStatus};
    use crate::state::store::STORAGE_KEY;
    use std::sync::atomic::Ordering;
    use std::thread;

    struct Rig {
        kv: Arc<MemoryKv>,
        gallery: Arc<FakeGallery>,
        workflow: Arc<CaptureWorkflow>,
    }

    fn rig(camera: FakeCamera, gallery: FakeGallery) -> Rig {
        let kv = Arc::new(MemoryKv::default());
        let gallery = Arc::new(gallery);
        let store = Arc::new(EntryStore::new(kv.clone()));
        let workflow = Arc::new(CaptureWorkflow::new(
            Arc::new(camera),
            gallery.clone(),
            store,
            "GeoCam",
        ));
        Rig { kv, gallery, workflow }
    }

    fn bangalore() -> LocationState {
        LocationState::Known(Coordinates {
            latitude: 12.9,
            longitude: 77.6,
        })
    }

    #[test]
    fn test_successful_capture_records_and_persists() {
        let rig = rig(FakeCamera::granted(), FakeGallery::default());

        let before = Utc::now();
        let entry = rig.workflow.capture(PermissionState::Granted, bangalore()).unwrap();

        assert_eq!(entry.uri, "file:///captures/0.jpg");
        assert_eq!(entry.latitude, Some(12.9));
        assert_eq!(entry.longitude, Some(77.6));
        assert!(entry.date_time >= before);

        let persisted: Vec<CaptureEntry> =
            serde_json::from_str(&rig.kv.raw(STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(persisted.last(), Some(&entry));
        assert_eq!(rig.gallery.albums.lock().unwrap()["GeoCam"].len(), 1);
    }

    #[test]
    fn test_n_captures_give_n_entries_in_order() {
        let rig = rig(FakeCamera::granted(), FakeGallery::default());

        for _ in 0..5 {
            rig.workflow.capture(PermissionState::Granted, bangalore()).unwrap();
        }

        let uris: Vec<String> = rig.workflow.store().snapshot().into_iter().map(|e| e.uri).collect();
        let expected: Vec<String> = (0..5).map(|n| format!("file:///captures/{}.jpg", n)).collect();
        assert_eq!(uris, expected);
    }

    #[test]
    fn test_unknown_location_gives_null_coordinates() {
        let rig = rig(FakeCamera::granted(), FakeGallery::default());
        let entry = rig.workflow.capture(PermissionState::Granted, LocationState::Unknown).unwrap();
        assert_eq!(entry.coordinates(), None);
        assert!(rig.kv.raw(STORAGE_KEY).unwrap().contains("\"latitude\":null"));
    }

    #[test]
    fn test_denied_permission_leaves_list_untouched() {
        let camera = FakeCamera {
            permission: Ok(PermissionStatus::Denied),
            ..FakeCamera::granted()
        };
        let rig = rig(camera, FakeGallery::default());

        for permission in [PermissionState::Denied, PermissionState::Pending] {
            let result = rig.workflow.capture(permission, bangalore());
            assert!(matches!(result, Err(Error::PermissionDenied(_))));
        }
        assert_eq!(rig.workflow.store().len(), 0);
        assert_eq!(rig.kv.raw(STORAGE_KEY), None);
    }

    #[test]
    fn test_camera_failure_aborts_capture() {
        let camera = FakeCamera {
            fail_capture: true,
            ..FakeCamera::granted()
        };
        let rig = rig(camera, FakeGallery::default());

        let result = rig.workflow.capture(PermissionState::Granted, bangalore());
        assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
        assert_eq!(rig.workflow.store().len(), 0);
        assert!(rig.gallery.albums.lock().unwrap().is_empty());
    }

    #[test]
    fn test_gallery_failure_records_nothing() {
        let gallery = FakeGallery {
            fail_assets: true,
            ..FakeGallery::default()
        };
        let rig = rig(FakeCamera::granted(), gallery);

        let result = rig.workflow.capture(PermissionState::Granted, bangalore());
        assert!(matches!(result, Err(Error::StorageWrite(_))));
        assert_eq!(rig.workflow.store().len(), 0);
        assert_eq!(rig.kv.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parallel_captures_are_serialized() {
        let rig = rig(FakeCamera::granted(), FakeGallery::default());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let workflow = Arc::clone(&rig.workflow);
                thread::spawn(move || {
                    for _ in 0..10 {
                        workflow.capture(PermissionState::Granted, bangalore()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Shot numbers come from the camera, so serialized captures record them in sequence
        let uris: Vec<String> = rig.workflow.store().snapshot().into_iter().map(|e| e.uri).collect();
        let expected: Vec<String> = (0..40).map(|n| format!("file:///captures/{}.jpg", n)).collect();
        assert_eq!(uris, expected);
    }
}
