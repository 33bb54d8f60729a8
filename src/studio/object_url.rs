use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::assets::source::{FetchedResource, ResourceFetcher};
use crate::encode::sink::Blob;
use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Prefix of every reference handed out by [`ObjectUrlRegistry`].
pub const OBJECT_URL_PREFIX: &str = "blob:reelcast/";

#[derive(Debug, Default)]
struct Entries {
    next: u64,
    live: HashMap<String, FetchedResource>,
}

/// In-process `blob:` references for produced media.
///
/// References stay fetchable until revoked. References outside [`OBJECT_URL_PREFIX`] are left to
/// other fetchers.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<Entries>,
}

impl ObjectUrlRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `bytes` and return a fresh reference.
    pub fn create(&self, bytes: Vec<u8>, mime: impl Into<String>) -> String {
        let mut entries = self.lock();
        entries.next += 1;
        let url = format!("{OBJECT_URL_PREFIX}{}", entries.next);
        entries.live.insert(
            url.clone(),
            FetchedResource {
                mime: Some(mime.into()),
                bytes,
            },
        );
        tracing::debug!(%url, "object url created");
        url
    }

    /// Register an encoded recording.
    pub fn create_from_blob(&self, blob: &Blob) -> String {
        self.create(blob.bytes.clone(), blob.mime.clone())
    }

    /// Contents behind `url`, if it is still live.
    pub fn get(&self, url: &str) -> Option<FetchedResource> {
        self.lock().live.get(url).cloned()
    }

    /// Release `url`. Returns `false` when it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.lock().live.remove(url).is_some();
        if removed {
            tracing::debug!(%url, "object url revoked");
        }
        removed
    }

    /// Number of live references.
    pub fn len(&self) -> usize {
        self.lock().live.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceFetcher for ObjectUrlRegistry {
    fn try_fetch(&self, reference: &str) -> ReelcastResult<Option<FetchedResource>> {
        if !reference.starts_with(OBJECT_URL_PREFIX) {
            return Ok(None);
        }
        self.get(reference).map(Some).ok_or_else(|| {
            ReelcastError::decode(format!("object url '{reference}' is not live"))
        })
    }
}
