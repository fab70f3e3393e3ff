/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the capture core, the entry store and the UI layer.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{Coordinates, PermissionStatus};

/// Map span around a selected entry, in degrees
pub const DEFAULT_SPAN: f64 = 0.005;

/// Camera access as seen by the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Pending,
    Granted,
    Denied,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => PermissionState::Granted,
            PermissionStatus::Denied => PermissionState::Denied,
        }
    }
}

/// Last known device position, taken once at startup
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocationState {
    #[default]
    Unknown,
    Known(Coordinates),
}

impl LocationState {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            LocationState::Known(coordinates) => Some(*coordinates),
            LocationState::Unknown => None,
        }
    }
}

/// One completed capture.
///
/// Serialized as `{uri, latitude, longitude, dateTime}`; coordinates are
/// `null` when no location was known at capture time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEntry {
    /// Path of the captured image
    pub uri: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// When the entry was recorded
    pub date_time: DateTime<Utc>,
}

impl CaptureEntry {
    pub fn new(uri: impl Into<String>, location: LocationState, date_time: DateTime<Utc>) -> Self {
        let coordinates = location.coordinates();
        Self {
            uri: uri.into(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            date_time,
        }
    }

    /// Both coordinates, if the entry has them
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }

    /// Recording time in local time, `YYYY-MM-DD HH:MM:SS`
    pub fn formatted_time(&self) -> String {
        self.date_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Visible map area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinates,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn around(center: Coordinates) -> Self {
        Self {
            center,
            latitude_delta: DEFAULT_SPAN,
            longitude_delta: DEFAULT_SPAN,
        }
    }
}

/// A pin on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinates: Coordinates,
    pub title: String,
}

/// The entry whose location is shown on the map, if any.
///
/// Holds the entry by value: positions in the list are not stable references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection(Option<CaptureEntry>);

impl Selection {
    pub fn select(&mut self, entry: CaptureEntry) {
        self.0 = Some(entry);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn entry(&self) -> Option<&CaptureEntry> {
        self.0.as_ref()
    }

    /// Map region centered on the selected entry
    pub fn region(&self) -> Option<Region> {
        self.0.as_ref()?.coordinates().map(Region::around)
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.0
            .as_ref()
            .and_then(CaptureEntry::coordinates)
            .map(|coordinates| Marker {
                coordinates,
                title: "Image Location".to_string(),
            })
            .into_iter()
            .collect()
    }
}
