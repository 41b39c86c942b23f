//! Filesystem-backed object store.
//!
//! Object keys map one-to-one onto paths below a root directory:
//! `libs/common/a.jar` lives at `<root>/libs/common/a.jar`. Content-type
//! metadata is accepted by `put` but not persisted.
//!
//! Writes land in `<root>/.staging/` first and are renamed into place, so a
//! half-written object is never visible under any listed prefix. The
//! staging directory is not addressable as a key.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::{ListOptions, Listing, ObjectDescriptor, ObjectStore, Payload, PutOptions};
use crate::error::StoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Top-level directory holding in-flight writes.
const STAGING_DIR: &str = ".staging";

/// Serves objects from files under `root`.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an object key to a file path, refusing anything that could
    /// escape `root`.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }
}

fn key_segments(key: &str) -> Result<Vec<&str>, StoreError> {
    if key.is_empty() || key.ends_with('/') {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    if key.split('/').next() == Some(STAGING_DIR) {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    key.split('/')
        .map(|segment| match segment {
            "" | "." | ".." => Err(StoreError::InvalidKey(key.to_owned())),
            s if s.contains('\\') => Err(StoreError::InvalidKey(key.to_owned())),
            s => Ok(s),
        })
        .collect()
}

#[async_trait]
impl ObjectStore for FsStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get(&self, path: &str) -> Result<Option<Payload>, StoreError> {
        let file_path = self.resolve(path)?;
        let file = match tokio::fs::File::open(&file_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if file.metadata().await?.is_dir() {
            return Ok(None);
        }

        let stream = ReaderStream::new(file).map_err(StoreError::from);
        Ok(Some(Payload::Streaming(Box::pin(stream))))
    }

    #[instrument(skip(self), fields(root = %self.root.display(), prefix = %opts.prefix))]
    async fn list(&self, opts: ListOptions) -> Result<Listing, StoreError> {
        // Only the directory holding the prefix's last complete segment can
        // contain matches; walk from there.
        let base = match opts.prefix.rfind('/') {
            Some(idx) => &opts.prefix[..idx],
            None => "",
        };
        let start = if base.is_empty() { self.root.clone() } else { self.resolve(base)? };

        let mut keys = Vec::new();
        let mut pending = vec![(start, base.to_owned())];

        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => continue,
                Err(e) => return Err(e.into()),
            };

            let mut empty = true;
            while let Some(entry) = entries.next_entry().await? {
                empty = false;
                let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                    debug!(path = %entry.path().display(), "skipping non-utf8 file name");
                    continue;
                };
                if dir_key.is_empty() && name == STAGING_DIR {
                    continue;
                }
                let key = if dir_key.is_empty() { name } else { format!("{dir_key}/{name}") };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(&opts.prefix) {
                    keys.push(key);
                }
            }

            // S3-style consoles create folder markers; mirror them for
            // empty directories so callers see the same shape.
            if empty && !dir_key.is_empty() {
                let marker = format!("{dir_key}/");
                if marker.starts_with(&opts.prefix) {
                    keys.push(marker);
                }
            }
        }

        keys.sort();
        debug!(count = keys.len(), "listed objects");
        Ok(Listing::new(keys.into_iter().map(ObjectDescriptor::new).collect()))
    }

    #[instrument(skip(self, body, opts), fields(root = %self.root.display(), len = body.len()))]
    async fn put(&self, path: &str, body: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        let file_path = self.resolve(path)?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;
        let tmp = staging.join(format!(
            "{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        ));

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &file_path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(content_type = opts.content_type.as_deref().unwrap_or(""), "object written");
        Ok(())
    }
}
