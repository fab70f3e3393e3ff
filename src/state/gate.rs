/// Startup requests that gate capture: camera permission and the one-time
/// location snapshot. Both run once, independently of each other.

use super::data::{LocationState, PermissionState};
use crate::device::{Camera, LocationSource, PermissionStatus};

/// What the capture screen shows for a camera permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPanel {
    /// A status line only; no capture control
    Message(&'static str),
    CaptureControls,
}

pub fn camera_panel(permission: PermissionState) -> CameraPanel {
    match permission {
        PermissionState::Pending => CameraPanel::Message("Requesting camera permission"),
        PermissionState::Denied => CameraPanel::Message("No access to camera"),
        PermissionState::Granted => CameraPanel::CaptureControls,
    }
}

/// Startup progress the shutter waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub permission: PermissionState,
    pub location_settled: bool,
    pub hydrated: bool,
    pub capturing: bool,
}

impl Readiness {
    /// Capture needs camera access, a settled location snapshot, a loaded
    /// entry list and no capture already running
    pub fn can_capture(&self) -> bool {
        self.permission == PermissionState::Granted
            && self.location_settled
            && self.hydrated
            && !self.capturing
    }
}

/// Ask for camera access. A failed request counts as a refusal.
pub fn request_camera_access(camera: &dyn Camera) -> PermissionState {
    match camera.request_permission() {
        Ok(status) => {
            tracing::info!(?status, "camera permission answered");
            status.into()
        }
        Err(e) => {
            tracing::warn!(error = %e, "camera permission request failed");
            PermissionState::Denied
        }
    }
}

/// Take the location snapshot used by every later capture
pub fn locate(source: &dyn LocationSource) -> LocationState {
    match source.request_foreground_permission() {
        Ok(PermissionStatus::Granted) => {}
        Ok(PermissionStatus::Denied) => {
            tracing::info!("location permission denied");
            return LocationState::Unknown;
        }
        Err(e) => {
            tracing::warn!(error = %e, "location permission request failed");
            return LocationState::Unknown;
        }
    }

    match source.current_position() {
        Ok(coordinates) => {
            tracing::info!(
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                "location fix obtained"
            );
            LocationState::Known(coordinates)
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not get a location fix");
            LocationState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::{FakeCamera, FakeLocation};
    use crate::device::Coordinates;
    use crate::error::Error;

    const HERE: Coordinates = Coordinates {
        latitude: 12.9,
        longitude: 77.6,
    };

    #[test]
    fn test_camera_answers_map_to_state() {
        assert_eq!(request_camera_access(&FakeCamera::granted()), PermissionState::Granted);

        let denied = FakeCamera {
            permission: Ok(PermissionStatus::Denied),
            ..FakeCamera::granted()
        };
        assert_eq!(request_camera_access(&denied), PermissionState::Denied);
    }

    #[test]
    fn test_failed_camera_request_is_denied_not_pending() {
        let broken = FakeCamera {
            permission: Err(Error::DeviceUnavailable("no camera service".into())),
            ..FakeCamera::granted()
        };
        assert_eq!(request_camera_access(&broken), PermissionState::Denied);
    }

    #[test]
    fn test_only_granted_access_shows_capture_controls() {
        assert_eq!(
            camera_panel(PermissionState::Denied),
            CameraPanel::Message("No access to camera")
        );
        assert_eq!(
            camera_panel(PermissionState::Pending),
            CameraPanel::Message("Requesting camera permission")
        );
        assert_eq!(camera_panel(PermissionState::Granted), CameraPanel::CaptureControls);
    }

    #[test]
    fn test_shutter_waits_for_every_startup_request() {
        let ready = Readiness {
            permission: PermissionState::Granted,
            location_settled: true,
            hydrated: true,
            capturing: false,
        };
        assert!(ready.can_capture());

        assert!(!Readiness { location_settled: false, ..ready }.can_capture());
        assert!(!Readiness { hydrated: false, ..ready }.can_capture());
        assert!(!Readiness { capturing: true, ..ready }.can_capture());
        assert!(!Readiness::default().can_capture());

        for permission in [PermissionState::Denied, PermissionState::Pending] {
            assert!(!Readiness { permission, ..ready }.can_capture());
        }
    }

    #[test]
    fn test_location_snapshot() {
        let source = FakeLocation {
            permission: Ok(PermissionStatus::Granted),
            position: Ok(HERE),
        };
        assert_eq!(locate(&source), LocationState::Known(HERE));
    }

    #[test]
    fn test_location_unknown_on_denial_or_failure() {
        let denied = FakeLocation {
            permission: Ok(PermissionStatus::Denied),
            position: Ok(HERE),
        };
        assert_eq!(locate(&denied), LocationState::Unknown);

        let no_fix = FakeLocation {
            permission: Ok(PermissionStatus::Granted),
            position: Err(Error::DeviceUnavailable("no satellites".into())),
        };
        assert_eq!(locate(&no_fix), LocationState::Unknown);

        let broken = FakeLocation {
            permission: Err(Error::DeviceUnavailable("service down".into())),
            position: Ok(HERE),
        };
        assert_eq!(locate(&broken), LocationState::Unknown);
    }
}
