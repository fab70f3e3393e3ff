/// Error taxonomy shared by the device layer, the entry store and the UI.
///
/// Payloads are plain strings so errors can be cloned into iced messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The user or the host refused access to a capability
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Camera, location fix or gallery not obtainable right now
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Gallery or key-value store write failed
    #[error("storage write failed: {0}")]
    StorageWrite(String),

    /// Persisted data could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Run blocking device work off the UI executor.
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::DeviceUnavailable(format!("background task failed: {}", e)))?
}
