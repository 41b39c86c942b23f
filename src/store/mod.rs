//! Object store collaborator.
//!
//! The asset handler never talks to a storage SDK directly. It sees three
//! operations (`get`, `list`, `put`) behind [`ObjectStore`], and two payload
//! shapes behind [`Payload`]: bytes already in memory, or a body that can be
//! streamed straight into the HTTP response.
//!
//! Two backends ship with the crate:
//!
//! | Backend | `get` yields | Use |
//! |---|---|---|
//! | [`MemoryStore`] | [`Payload::Buffered`] | tests, ephemeral deployments |
//! | [`FsStore`] | [`Payload::Streaming`] | local disk / mounted bucket |

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::StoreError;

/// A boxed stream of bytes for object data.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StoreError>> + Send>>;

/// A stored object's body.
pub enum Payload {
    /// The whole body is already in memory.
    Buffered(Bytes),
    /// The body is read lazily; the caller should forward it chunk by chunk.
    Streaming(ByteStream),
}

impl Payload {
    /// Reads the whole payload into memory.
    ///
    /// The HTTP path never does this. It exists for callers that need to
    /// inspect a cached value (tooling, tests).
    pub async fn into_bytes(self) -> Result<Bytes, StoreError> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Streaming(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Arguments to [`ObjectStore::list`].
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub prefix: String,
}

impl ListOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

/// One entry of a listing. Backends may omit the key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub key: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: Some(key.into()) }
    }
}

/// Result of [`ObjectStore::list`]. `objects` is `None` when the backend
/// returned no results field at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub objects: Option<Vec<ObjectDescriptor>>,
}

impl Listing {
    pub fn new(objects: Vec<ObjectDescriptor>) -> Self {
        Self { objects: Some(objects) }
    }

    /// Consumes the listing, treating a missing results field as empty.
    pub fn into_objects(self) -> Vec<ObjectDescriptor> {
        self.objects.unwrap_or_default()
    }
}

/// Arguments to [`ObjectStore::put`].
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    pub content_type: Option<String>,
}

impl PutOptions {
    pub fn content_type(content_type: impl Into<String>) -> Self {
        Self { content_type: Some(content_type.into()) }
    }
}

/// Key/blob storage with prefix listing.
///
/// Implementations must be shareable across concurrent requests; the
/// handler holds one as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object at `path`. Absence is `Ok(None)`, not an error.
    async fn get(&self, path: &str) -> Result<Option<Payload>, StoreError>;

    /// Enumerate objects whose key starts with `opts.prefix`.
    async fn list(&self, opts: ListOptions) -> Result<Listing, StoreError>;

    /// Create or overwrite the object at `path`.
    async fn put(&self, path: &str, body: Bytes, opts: PutOptions) -> Result<(), StoreError>;
}
