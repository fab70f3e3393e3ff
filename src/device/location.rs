use super::{Coordinates, LocationSource, PermissionStatus};
use crate::error::{Error, Result};

/// Location source for hosts without a positioning device.
///
/// The position is whatever the user configured. With location disabled the
/// permission request is refused, just like a denied system prompt.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    enabled: bool,
    position: Option<(f64, f64)>,
}

impl FixedLocation {
    pub fn new(enabled: bool, position: Option<(f64, f64)>) -> Self {
        Self { enabled, position }
    }
}

impl LocationSource for FixedLocation {
    fn request_foreground_permission(&self) -> Result<PermissionStatus> {
        Ok(if self.enabled {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    fn current_position(&self) -> Result<Coordinates> {
        if !self.enabled {
            return Err(Error::PermissionDenied("location is disabled".into()));
        }

        let (latitude, longitude) = self
            .position
            .ok_or_else(|| Error::DeviceUnavailable("no position configured".into()))?;

        Coordinates::new(latitude, longitude)
    }
}
