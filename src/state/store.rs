use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::data::CaptureEntry;
use crate::device::KeyValueStore;
use crate::error::{Error, Result};

/// Key under which the whole entry list is persisted
pub const STORAGE_KEY: &str = "imageArray";

/// What a hydration found in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrationReport {
    /// Entries now in memory
    pub loaded: usize,
    /// Stored elements that didn't match the entry layout
    pub dropped: usize,
    /// The stored value wasn't a JSON array at all
    pub malformed: bool,
}

impl HydrationReport {
    /// Whether stored data was discarded and will be overwritten by the next append
    pub fn lost_data(&self) -> bool {
        self.malformed || self.dropped > 0
    }
}

/// The ordered, append-only list of captures and its persisted mirror.
///
/// One mutex covers both the in-memory push and the full-list write, so
/// appends land in memory and on disk strictly in call order.
pub struct EntryStore {
    kv: Arc<dyn KeyValueStore>,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: Vec<CaptureEntry>,
    /// Set when the stored list couldn't be read; appending would overwrite it
    unread: bool,
}

impl EntryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                unread: false,
            }),
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Absent or malformed data yields an empty list and says so in the
    /// report. A failed read is an error, and appends stay refused until a
    /// later hydrate succeeds.
    pub fn hydrate(&self) -> Result<HydrationReport> {
        let mut inner = self.lock();

        let stored = match self.kv.get(STORAGE_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, "could not read stored entries");
                inner.unread = true;
                return Err(e);
            }
        };

        let (entries, report) = match stored {
            Some(json) => decode_entries(&json),
            None => (Vec::new(), HydrationReport::default()),
        };

        tracing::info!(count = report.loaded, dropped = report.dropped, "entry list hydrated");
        inner.entries = entries;
        inner.unread = false;
        Ok(report)
    }

    /// Append an entry and rewrite the persisted list.
    ///
    /// If the write fails the entry is still kept in memory; the next
    /// successful append brings the persisted copy back in line.
    pub fn append(&self, entry: CaptureEntry) -> Result<()> {
        let mut inner = self.lock();
        if inner.unread {
            return Err(Error::StorageWrite(
                "stored entries could not be read, refusing to overwrite them".into(),
            ));
        }

        inner.entries.push(entry);

        let json = serde_json::to_string(&inner.entries)?;
        self.kv.set(STORAGE_KEY, &json)?;

        tracing::debug!(count = inner.entries.len(), "entry list persisted");
        Ok(())
    }

    /// Copy of the current list, in capture order
    pub fn snapshot(&self) -> Vec<CaptureEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decode a persisted list, dropping elements that don't match the layout
fn decode_entries(json: &str) -> (Vec<CaptureEntry>, HydrationReport) {
    let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "stored entry list is malformed, starting empty");
            let report = HydrationReport {
                malformed: true,
                ..HydrationReport::default()
            };
            return (Vec::new(), report);
        }
    };

    let total = values.len();
    let entries: Vec<CaptureEntry> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();

    let report = HydrationReport {
        loaded: entries.len(),
        dropped: total - entries.len(),
        malformed: false,
    };
    if report.dropped > 0 {
        tracing::warn!(dropped = report.dropped, "discarded unreadable stored entries");
    }

    (entries, report)
}
