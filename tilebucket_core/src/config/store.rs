use serde::Deserialize;
use std::time::Duration;

/// Per-attempt timeout if none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Retries after the first attempt if none are configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);
/// Maximum number of requests in flight per client.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Which object store implementation backs the output.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
	/// Amazon S3 or an S3 compatible service.
	#[default]
	S3,
	/// A directory on the local filesystem.
	Local,
	/// Process memory, lost on exit.
	Memory,
}

/// Connection settings of the object store.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
	#[serde(default)]
	pub kind: StoreKind,

	/// AWS region. Falls back to the environment.
	#[serde(default)]
	pub region: Option<String>,

	/// Custom endpoint of an S3 compatible service, e.g. `http://localhost:9000`.
	#[serde(default)]
	pub endpoint: Option<String>,

	/// Allow plain HTTP endpoints.
	#[serde(default)]
	pub allow_http: Option<bool>,

	/// Root directory of a `local` store.
	#[serde(default)]
	pub root: Option<String>,

	#[serde(default)]
	pub timeout_secs: Option<u64>,

	#[serde(default)]
	pub max_retries: Option<u32>,

	#[serde(default)]
	pub initial_backoff_ms: Option<u64>,

	#[serde(default)]
	pub max_backoff_ms: Option<u64>,

	#[serde(default)]
	pub max_connections: Option<usize>,
}

impl StoreConfig {
	pub fn timeout(&self) -> Duration {
		self.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
	}

	pub fn max_retries(&self) -> u32 {
		self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
	}

	pub fn initial_backoff(&self) -> Duration {
		self.initial_backoff_ms.map_or(DEFAULT_INITIAL_BACKOFF, Duration::from_millis)
	}

	pub fn max_backoff(&self) -> Duration {
		self.max_backoff_ms.map_or(DEFAULT_MAX_BACKOFF, Duration::from_millis)
	}

	pub fn max_connections(&self) -> usize {
		self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS).max(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = StoreConfig::default();
		assert_eq!(config.kind, StoreKind::S3);
		assert_eq!(config.timeout(), Duration::from_secs(30));
		assert_eq!(config.max_retries(), 3);
		assert_eq!(config.initial_backoff(), Duration::from_millis(100));
		assert_eq!(config.max_backoff(), Duration::from_secs(5));
		assert_eq!(config.max_connections(), 64);
	}

	#[test]
	fn overrides() {
		let config: StoreConfig =
			serde_yaml_ng::from_str("kind: local\nroot: /tmp/tiles\ntimeout_secs: 5\nmax_retries: 0\nmax_connections: 0\n")
				.unwrap();
		assert_eq!(config.kind, StoreKind::Local);
		assert_eq!(config.root.as_deref(), Some("/tmp/tiles"));
		assert_eq!(config.timeout(), Duration::from_secs(5));
		assert_eq!(config.max_retries(), 0);
		assert_eq!(config.max_connections(), 1);
	}

	#[test]
	fn unknown_field() {
		assert!(serde_yaml_ng::from_str::<StoreConfig>("kind: s3\nbukket: x\n").is_err());
	}
}
