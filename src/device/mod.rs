/// Device capability layer
///
/// The capture core never talks to the filesystem or the database directly.
/// It goes through these traits:
/// - Camera permission and photo capture (camera.rs)
/// - Foreground location permission and position fix (location.rs)
/// - Gallery assets and albums (gallery.rs)
/// - Key-value persistence (kv.rs)

pub mod camera;
pub mod gallery;
pub mod kv;
pub mod location;

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Answer to a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Opaque handle to a freshly captured photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoHandle {
    pub uri: String,
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the WGS84 ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(Error::DeviceUnavailable(format!(
                "invalid coordinates ({}, {})",
                latitude, longitude
            )));
        }

        Ok(Self { latitude, longitude })
    }
}

/// A photo registered with the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
}

/// A named collection of assets in the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub path: PathBuf,
}

pub trait Camera: Send + Sync {
    fn request_permission(&self) -> Result<PermissionStatus>;

    /// Fails with `DeviceUnavailable` when no live capture source exists
    fn capture_photo(&self) -> Result<PhotoHandle>;
}

pub trait LocationSource: Send + Sync {
    fn request_foreground_permission(&self) -> Result<PermissionStatus>;

    fn current_position(&self) -> Result<Coordinates>;
}

pub trait Gallery: Send + Sync {
    fn create_asset(&self, photo: &PhotoHandle) -> Result<Asset>;

    /// Look up an album by name. `Ok(None)` if it does not exist yet.
    fn album(&self, name: &str) -> Result<Option<Album>>;

    /// Create an album seeded with its first asset
    fn create_album(&self, name: &str, asset: &Asset) -> Result<Album>;

    fn add_assets_to_album(&self, assets: &[Asset], album: &Album) -> Result<()>;
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Save a photo into the named album, creating the album on first use
pub fn save_to_album(gallery: &dyn Gallery, photo: &PhotoHandle, album_name: &str) -> Result<Album> {
    let asset = gallery.create_asset(photo)?;

    match gallery.album(album_name)? {
        Some(album) => {
            gallery.add_assets_to_album(std::slice::from_ref(&asset), &album)?;
            Ok(album)
        }
        None => gallery.create_album(album_name, &asset),
    }
}
