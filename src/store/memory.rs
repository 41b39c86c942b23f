//! In-process object store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ListOptions, Listing, ObjectDescriptor, ObjectStore, Payload, PutOptions};
use crate::error::StoreError;

#[derive(Clone, Debug)]
struct Entry {
    body: Bytes,
    content_type: Option<String>,
}

/// A `BTreeMap`-backed store. Listings come back in lexicographic key order,
/// the same order S3-compatible services use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object without going through the async trait.
    pub fn insert(&self, path: impl Into<String>, body: impl Into<Bytes>) -> Result<(), StoreError> {
        self.write()?.insert(path.into(), Entry { body: body.into(), content_type: None });
        Ok(())
    }

    /// Returns a copy of the stored body, if any.
    pub fn body(&self, path: &str) -> Option<Bytes> {
        self.read().ok()?.get(path).map(|e| e.body.clone())
    }

    /// Returns the content type recorded by the last `put` at `path`.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.read().ok()?.get(path)?.content_type.clone()
    }

    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Entry>>, StoreError> {
        self.objects.read().map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Entry>>, StoreError> {
        self.objects.write().map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Payload>, StoreError> {
        Ok(self.read()?.get(path).map(|e| Payload::Buffered(e.body.clone())))
    }

    async fn list(&self, opts: ListOptions) -> Result<Listing, StoreError> {
        let objects = self
            .read()?
            .range(opts.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&opts.prefix))
            .map(|(key, _)| ObjectDescriptor::new(key.as_str()))
            .collect();
        Ok(Listing::new(objects))
    }

    async fn put(&self, path: &str, body: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        self.write()?.insert(path.to_owned(), Entry { body, content_type: opts.content_type });
        Ok(())
    }
}
