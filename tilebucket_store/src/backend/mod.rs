//! The seam between the client and a concrete object store.

mod object_store_backend;
pub use object_store_backend::ObjectStoreBackend;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt::Debug;
use tilebucket_core::{Blob, StoreError};

/// Metadata of a stored object, as returned by `head` and `list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectInfo {
	pub key: String,
	pub size: u64,
}

/// The minimal object store surface the driver needs.
///
/// Implementations perform exactly one attempt per call and classify failures into
/// [`StoreError::NotFound`], [`StoreError::Transient`] and [`StoreError::Permanent`]. Timeouts,
/// retries and connection limits are handled by the
/// [`ObjectStoreClient`](crate::ObjectStoreClient).
#[async_trait]
pub trait ObjectBackend: Debug + Send + Sync {
	/// Uploads `data` under `key` in a single request, replacing any existing object.
	async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

	async fn get(&self, key: &str) -> Result<Blob, StoreError>;

	/// Fetches metadata only.
	async fn head(&self, key: &str) -> Result<ObjectInfo, StoreError>;

	async fn delete(&self, key: &str) -> Result<(), StoreError>;

	/// Lists all objects whose key starts with the path segments of `prefix`. An empty prefix
	/// lists everything.
	fn list(&self, prefix: &str) -> BoxStream<'_, Result<ObjectInfo, StoreError>>;
}
