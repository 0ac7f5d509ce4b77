//! Object store client with timeouts, retries, a connection bound and cancellation.
//!
//! Every verb runs against an [`ObjectBackend`]. Each attempt is limited by
//! [`RetryPolicy::timeout`]. Transient faults (connection errors, timeouts, server errors,
//! throttling) are retried with exponential backoff; permanent faults and missing objects fail
//! immediately. When all attempts fail, the call returns [`StoreError::Unavailable`].

mod retry;
pub use retry::RetryPolicy;

use crate::{ObjectBackend, ObjectInfo, ObjectStoreBackend};
use bytes::Bytes;
use futures::{
	StreamExt,
	stream::{self, BoxStream},
};
use std::{future::Future, sync::Arc};
use tilebucket_core::{
	Blob, ObjectKey, StoreError,
	config::{DEFAULT_MAX_CONNECTIONS, StoreConfig},
};
use tokio::{sync::Semaphore, time::timeout};
use tokio_util::sync::CancellationToken;

/// Cheap to clone; clones share the backend and the connection limit.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient {
	backend: Arc<dyn ObjectBackend>,
	policy: RetryPolicy,
	connections: Arc<Semaphore>,
	max_connections: usize,
	cancel: Option<CancellationToken>,
}

impl ObjectStoreClient {
	/// Creates a client with the default [`RetryPolicy`] and connection limit.
	pub fn new(backend: Arc<dyn ObjectBackend>) -> ObjectStoreClient {
		ObjectStoreClient {
			backend,
			policy: RetryPolicy::default(),
			connections: Arc::new(Semaphore::new(DEFAULT_MAX_CONNECTIONS)),
			max_connections: DEFAULT_MAX_CONNECTIONS,
			cancel: None,
		}
	}

	/// Creates the backend described by `config` and applies its limits.
	pub fn from_config(bucket: &str, config: &StoreConfig) -> Result<ObjectStoreClient, StoreError> {
		let backend = ObjectStoreBackend::from_config(bucket, config)?;
		Ok(ObjectStoreClient::new(Arc::new(backend))
			.with_policy(RetryPolicy::from_config(config))
			.with_max_connections(config.max_connections()))
	}

	#[must_use]
	pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Replaces the connection limit. The new limit is not shared with earlier clones.
	#[must_use]
	pub fn with_max_connections(mut self, max_connections: usize) -> Self {
		let max_connections = max_connections.max(1);
		self.connections = Arc::new(Semaphore::new(max_connections));
		self.max_connections = max_connections;
		self
	}

	/// Returns a client whose calls end with [`StoreError::Cancelled`] once `token` is cancelled.
	#[must_use]
	pub fn with_cancellation(&self, token: CancellationToken) -> Self {
		ObjectStoreClient {
			cancel: Some(token),
			..self.clone()
		}
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	pub fn max_connections(&self) -> usize {
		self.max_connections
	}

	/// Uploads `blob` under `key`, replacing any existing object. The last writer wins.
	pub async fn put(&self, key: &ObjectKey, blob: Blob) -> Result<(), StoreError> {
		let data = Bytes::from(blob.into_vec());
		log::trace!("put '{key}' ({} bytes)", data.len());
		let (backend, key) = (self.backend.as_ref(), key.as_str());
		self.call("put", key, move || backend.put(key, data.clone())).await
	}

	pub async fn get(&self, key: &ObjectKey) -> Result<Blob, StoreError> {
		log::trace!("get '{key}'");
		let (backend, key) = (self.backend.as_ref(), key.as_str());
		self.call("get", key, move || backend.get(key)).await
	}

	pub async fn head(&self, key: &ObjectKey) -> Result<ObjectInfo, StoreError> {
		log::trace!("head '{key}'");
		let (backend, key) = (self.backend.as_ref(), key.as_str());
		self.call("head", key, move || backend.head(key)).await
	}

	/// Checks for an object with a metadata request. The payload is never downloaded.
	pub async fn exists(&self, key: &ObjectKey) -> Result<bool, StoreError> {
		match self.head(key).await {
			Ok(_) => Ok(true),
			Err(StoreError::NotFound { .. }) => Ok(false),
			Err(e) => Err(e),
		}
	}

	/// Deletes an object. Deleting a missing object succeeds.
	pub async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
		log::trace!("delete '{key}'");
		let (backend, key) = (self.backend.as_ref(), key.as_str());
		match self.call("delete", key, move || backend.delete(key)).await {
			Err(StoreError::NotFound { .. }) => Ok(()),
			result => result,
		}
	}

	/// Lazily lists the keys below `prefix`.
	///
	/// A transient fault is retried only as long as no key has been yielded; afterwards it ends
	/// the stream. The stream always ends after the first error.
	pub fn list<'a>(&'a self, prefix: &str) -> BoxStream<'a, Result<ObjectKey, StoreError>> {
		log::trace!("list '{prefix}'");
		let state = ListState {
			client: self,
			prefix: prefix.to_string(),
			inner: None,
			attempts: 0,
			yielded: false,
			finished: false,
		};
		stream::unfold(state, ListState::advance).boxed()
	}

	/// Runs `future` unless the cancellation token fires first.
	async fn cancellable<T>(&self, future: impl Future<Output = T>) -> Result<T, StoreError> {
		match &self.cancel {
			Some(token) => tokio::select! {
				biased;
				() = token.cancelled() => Err(StoreError::Cancelled),
				value = future => Ok(value),
			},
			None => Ok(future.await),
		}
	}

	/// Runs one attempt of `operation` within the connection limit and the per-attempt timeout.
	async fn attempt<T, Fut>(&self, operation: &impl Fn() -> Fut) -> Result<T, StoreError>
	where
		Fut: Future<Output = Result<T, StoreError>>,
	{
		let _permit = self
			.cancellable(self.connections.acquire())
			.await?
			.map_err(|e| StoreError::Permanent(format!("connection pool closed: {e}")))?;

		match self.cancellable(timeout(self.policy.timeout, operation())).await? {
			Ok(result) => result,
			Err(_) => Err(StoreError::Transient(format!(
				"attempt timed out after {:?}",
				self.policy.timeout
			))),
		}
	}

	/// Retries `operation` on transient faults according to the policy.
	async fn call<T, Fut>(&self, verb: &str, key: &str, operation: impl Fn() -> Fut) -> Result<T, StoreError>
	where
		Fut: Future<Output = Result<T, StoreError>>,
	{
		let max_retries = self.policy.max_retries;
		let mut attempts: u32 = 0;
		loop {
			attempts += 1;
			let message = match self.attempt(&operation).await {
				Ok(value) => return Ok(value),
				Err(StoreError::Transient(message)) => message,
				Err(e @ StoreError::NotFound { .. }) => {
					log::debug!("{verb} '{key}': object not found");
					return Err(e);
				}
				Err(e) => return Err(e),
			};

			if attempts > max_retries {
				log::warn!("{verb} '{key}' failed after {attempts} attempts: {message}");
				return Err(StoreError::Unavailable {
					attempts,
					last: message,
				});
			}

			let backoff = self.policy.backoff(attempts);
			log::warn!("retry attempt {attempts}/{max_retries} for {verb} '{key}' after '{message}', waiting {backoff:?}");
			self.cancellable(tokio::time::sleep(backoff)).await?;
		}
	}
}

/// State of a [`ObjectStoreClient::list`] stream.
struct ListState<'a> {
	client: &'a ObjectStoreClient,
	prefix: String,
	inner: Option<BoxStream<'a, Result<ObjectInfo, StoreError>>>,
	attempts: u32,
	yielded: bool,
	finished: bool,
}

impl<'a> ListState<'a> {
	async fn advance(mut self) -> Option<(Result<ObjectKey, StoreError>, Self)> {
		let client = self.client;
		loop {
			if self.finished {
				return None;
			}

			let inner = match &mut self.inner {
				Some(inner) => inner,
				empty => {
					self.attempts += 1;
					empty.insert(client.backend.list(&self.prefix))
				}
			};

			let error = match client.cancellable(timeout(client.policy.timeout, inner.next())).await {
				Err(e) => e,
				Ok(Err(_)) => StoreError::Transient(format!("listing timed out after {:?}", client.policy.timeout)),
				Ok(Ok(None)) => return None,
				Ok(Ok(Some(Ok(info)))) => {
					self.yielded = true;
					return Some((Ok(ObjectKey::from_listing(info.key)), self));
				}
				Ok(Ok(Some(Err(e)))) => e,
			};

			if let StoreError::Transient(message) = &error {
				if self.yielded {
					log::warn!("listing '{}' interrupted: {message}", self.prefix);
				} else if self.attempts <= client.policy.max_retries {
					let backoff = client.policy.backoff(self.attempts);
					log::warn!(
						"retry attempt {}/{} for list '{}' after '{message}', waiting {backoff:?}",
						self.attempts,
						client.policy.max_retries,
						self.prefix
					);
					self.inner = None;
					if let Err(e) = client.cancellable(tokio::time::sleep(backoff)).await {
						self.finished = true;
						return Some((Err(e), self));
					}
					continue;
				} else {
					let error = StoreError::Unavailable {
						attempts: self.attempts,
						last: message.clone(),
					};
					self.finished = true;
					return Some((Err(error), self));
				}
			}

			self.finished = true;
			return Some((Err(error), self));
		}
	}
}
