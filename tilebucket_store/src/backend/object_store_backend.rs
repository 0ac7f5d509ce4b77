use super::{ObjectBackend, ObjectInfo};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use object_store::{
	ObjectStore, PutPayload, RetryConfig, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, path::Path,
};
use std::sync::Arc;
use tilebucket_core::{
	Blob, StoreError,
	config::{StoreConfig, StoreKind},
};

/// Fragments of error messages that mark a fault as permanent even though the store reports it
/// as a generic error.
const PERMANENT_MARKERS: [&str; 11] = [
	"accessdenied",
	"access denied",
	"permission denied",
	"forbidden",
	"nosuchbucket",
	"invalidaccesskeyid",
	"signaturedoesnotmatch",
	"invalidbucketname",
	"403",
	"401",
	"400 bad request",
];

/// [`ObjectBackend`] on top of any [`ObjectStore`]: Amazon S3 or S3 compatible services, a
/// local directory or process memory.
#[derive(Debug, Clone)]
pub struct ObjectStoreBackend {
	store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
	pub fn new(store: Arc<dyn ObjectStore>) -> ObjectStoreBackend {
		ObjectStoreBackend { store }
	}

	pub fn in_memory() -> ObjectStoreBackend {
		ObjectStoreBackend::new(Arc::new(InMemory::new()))
	}

	/// Stores objects as files below `root`, creating the directory if necessary.
	pub fn local(root: &std::path::Path) -> Result<ObjectStoreBackend, StoreError> {
		std::fs::create_dir_all(root)
			.map_err(|e| StoreError::Permanent(format!("cannot create directory {root:?}: {e}")))?;
		let store = LocalFileSystem::new_with_prefix(root)
			.map_err(|e| StoreError::Permanent(format!("cannot open directory {root:?}: {e}")))?;
		Ok(ObjectStoreBackend::new(Arc::new(store)))
	}

	/// Connects to the S3 bucket `bucket`. Credentials and unset options are taken from the
	/// usual `AWS_*` environment variables. The store's own retries are disabled.
	pub fn s3(bucket: &str, config: &StoreConfig) -> Result<ObjectStoreBackend, StoreError> {
		let mut builder = AmazonS3Builder::from_env()
			.with_bucket_name(bucket)
			.with_retry(RetryConfig {
				max_retries: 0,
				..RetryConfig::default()
			});

		if let Some(region) = &config.region {
			builder = builder.with_region(region);
		}
		if let Some(endpoint) = &config.endpoint {
			builder = builder.with_endpoint(endpoint);
		}
		if let Some(allow_http) = config.allow_http {
			builder = builder.with_allow_http(allow_http);
		}

		let store = builder
			.build()
			.map_err(|e| StoreError::Permanent(format!("cannot configure S3 bucket '{bucket}': {e}")))?;
		Ok(ObjectStoreBackend::new(Arc::new(store)))
	}

	pub fn from_config(bucket: &str, config: &StoreConfig) -> Result<ObjectStoreBackend, StoreError> {
		match config.kind {
			StoreKind::S3 => ObjectStoreBackend::s3(bucket, config),
			StoreKind::Local => {
				let root = config
					.root
					.as_deref()
					.ok_or_else(|| StoreError::Permanent("a local store needs a 'root' directory".to_string()))?;
				ObjectStoreBackend::local(std::path::Path::new(root))
			}
			StoreKind::Memory => Ok(ObjectStoreBackend::in_memory()),
		}
	}
}

fn parse_path(key: &str) -> Result<Path, StoreError> {
	Path::parse(key).map_err(|e| StoreError::Permanent(format!("malformed key '{key}': {e}")))
}

/// Sorts an object store error into not found, transient or permanent.
fn classify(key: &str, error: object_store::Error) -> StoreError {
	match error {
		object_store::Error::NotFound { .. } => StoreError::NotFound { key: key.to_string() },
		object_store::Error::Generic { .. } => {
			let message = error.to_string();
			let lowercase = message.to_lowercase();
			if PERMANENT_MARKERS.iter().any(|marker| lowercase.contains(marker)) {
				StoreError::Permanent(message)
			} else {
				StoreError::Transient(message)
			}
		}
		other => StoreError::Permanent(other.to_string()),
	}
}

#[async_trait]
impl ObjectBackend for ObjectStoreBackend {
	async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
		let path = parse_path(key)?;
		self
			.store
			.put(&path, PutPayload::from(data))
			.await
			.map_err(|e| classify(key, e))?;
		Ok(())
	}

	async fn get(&self, key: &str) -> Result<Blob, StoreError> {
		let path = parse_path(key)?;
		let result = self.store.get(&path).await.map_err(|e| classify(key, e))?;
		let bytes = result.bytes().await.map_err(|e| classify(key, e))?;
		Ok(Blob::from(bytes.to_vec()))
	}

	async fn head(&self, key: &str) -> Result<ObjectInfo, StoreError> {
		let path = parse_path(key)?;
		let meta = self.store.head(&path).await.map_err(|e| classify(key, e))?;
		Ok(ObjectInfo {
			key: meta.location.to_string(),
			size: meta.size as u64,
		})
	}

	async fn delete(&self, key: &str) -> Result<(), StoreError> {
		let path = parse_path(key)?;
		self.store.delete(&path).await.map_err(|e| classify(key, e))
	}

	fn list(&self, prefix: &str) -> BoxStream<'_, Result<ObjectInfo, StoreError>> {
		let trimmed = prefix.trim_matches('/');
		let path = if trimmed.is_empty() {
			None
		} else {
			match parse_path(trimmed) {
				Ok(path) => Some(path),
				Err(e) => return futures::stream::once(async move { Err(e) }).boxed(),
			}
		};
		let prefix = prefix.to_string();
		self
			.store
			.list(path.as_ref())
			.map(move |item| {
				item
					.map(|meta| ObjectInfo {
						key: meta.location.to_string(),
						size: meta.size as u64,
					})
					.map_err(|e| classify(&prefix, e))
			})
			.boxed()
	}
}
