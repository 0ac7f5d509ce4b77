use async_trait::async_trait;
use bytes::Bytes;
use futures::{TryStreamExt, stream::BoxStream};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::{
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Duration,
};
use tilebucket_core::{
	Blob, Compression, DataType, OutputProfile, RasterArray, RasterDriver, StoreError, TileCoord, TileErrorKind,
	TileOperation,
};
use tilebucket_store::{
	ObjectBackend, ObjectInfo, ObjectStoreBackend, ObjectStoreClient, RetryPolicy, TileFilter, TileStore, WriteOutcome,
};

/// In-memory backend whose first `failing_puts` uploads fail with `fault`.
#[derive(Debug)]
struct FlakyBackend {
	inner: ObjectStoreBackend,
	fault: StoreError,
	failing_puts: u32,
	puts: AtomicU32,
	requests: AtomicU32,
}

impl FlakyBackend {
	fn new(failing_puts: u32, fault: StoreError) -> Arc<Self> {
		Arc::new(FlakyBackend {
			inner: ObjectStoreBackend::in_memory(),
			fault,
			failing_puts,
			puts: AtomicU32::new(0),
			requests: AtomicU32::new(0),
		})
	}

	fn healthy() -> Arc<Self> {
		FlakyBackend::new(0, StoreError::Transient(String::new()))
	}

	fn puts(&self) -> u32 {
		self.puts.load(Ordering::SeqCst)
	}

	fn requests(&self) -> u32 {
		self.requests.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ObjectBackend for FlakyBackend {
	async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
		if attempt < self.failing_puts {
			return Err(self.fault.clone());
		}
		self.inner.put(key, data).await
	}

	async fn get(&self, key: &str) -> Result<Blob, StoreError> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		self.inner.get(key).await
	}

	async fn head(&self, key: &str) -> Result<ObjectInfo, StoreError> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		self.inner.head(key).await
	}

	async fn delete(&self, key: &str) -> Result<(), StoreError> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		self.inner.delete(key).await
	}

	fn list(&self, prefix: &str) -> BoxStream<'_, Result<ObjectInfo, StoreError>> {
		self.requests.fetch_add(1, Ordering::SeqCst);
		self.inner.list(prefix)
	}
}

fn fast_policy() -> RetryPolicy {
	RetryPolicy {
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(10),
		..RetryPolicy::default()
	}
}

fn profile(driver: RasterDriver, bands: u16, dtype: DataType) -> Arc<OutputProfile> {
	Arc::new(OutputProfile::new(driver, bands, dtype, "my-bucket", "run1").unwrap())
}

fn tile_store(backend: &Arc<FlakyBackend>, profile: Arc<OutputProfile>) -> TileStore {
	let client = ObjectStoreClient::new(backend.clone()).with_policy(fast_policy());
	TileStore::new(profile, client).unwrap()
}

fn coord(zoom: u8, row: u32, col: u32) -> TileCoord {
	TileCoord::new(zoom, row, col).unwrap()
}

fn rgb_tile() -> RasterArray {
	let values: Vec<u8> = (0..3 * 256 * 256).map(|i| (i % 251) as u8).collect();
	RasterArray::from_vec(3, 256, 256, values).unwrap()
}

#[tokio::test]
async fn write_exists_read() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));
	let tile = coord(5, 15, 32);

	assert!(!store.tile_exists(&tile).await.unwrap());
	assert_eq!(store.write_tile(&tile, rgb_tile()).await.unwrap(), WriteOutcome::Written);
	assert!(store.tile_exists(&tile).await.unwrap());
	assert_eq!(store.read_tile(&tile).await.unwrap(), rgb_tile());
	assert_eq!(store.get_key(&tile).as_str(), "run1/5/15/32.tif");
	assert_eq!(store.get_path(&tile), "s3://my-bucket/run1/5/15/32.tif");
}

#[rstest]
#[case(RasterDriver::GTiff, 1, DataType::Float32, Compression::Deflate)]
#[case(RasterDriver::GTiff, 4, DataType::Int16, Compression::None)]
#[case(RasterDriver::Png, 4, DataType::Uint8, Compression::None)]
#[case(RasterDriver::Png, 1, DataType::Uint16, Compression::None)]
#[tokio::test]
async fn round_trip_profiles(
	#[case] driver: RasterDriver,
	#[case] bands: u16,
	#[case] dtype: DataType,
	#[case] compress: Compression,
) {
	let backend = FlakyBackend::healthy();
	let profile = OutputProfile::new(driver, bands, dtype, "my-bucket", "run1")
		.unwrap()
		.with_compression(compress);
	let store = tile_store(&backend, Arc::new(profile));

	let size = 32;
	let values: Vec<f64> = (0..usize::from(bands) * size * size).map(|i| (i % 97) as f64).collect();
	let array = RasterArray::from_vec(usize::from(bands), size, size, values)
		.unwrap()
		.convert_to(dtype);

	store.write_tile(&coord(3, 2, 1), array.clone()).await.unwrap();
	assert_eq!(store.read_tile(&coord(3, 2, 1)).await.unwrap(), array);
}

#[tokio::test]
async fn overwrite_last_writer_wins() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 1, DataType::Uint8));
	let tile = coord(1, 0, 1);

	store
		.write_tile(&tile, RasterArray::filled(1, 4, 4, DataType::Uint8, 1.0).unwrap())
		.await
		.unwrap();
	store
		.write_tile(&tile, RasterArray::filled(1, 4, 4, DataType::Uint8, 2.0).unwrap())
		.await
		.unwrap();
	assert!(store.read_tile(&tile).await.unwrap().is_all(2.0));
}

#[tokio::test]
async fn delete_is_idempotent() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));
	let tile = coord(2, 3, 5);

	store.write_tile(&tile, rgb_tile()).await.unwrap();
	store.delete_tile(&tile).await.unwrap();
	assert!(!store.tile_exists(&tile).await.unwrap());
	store.delete_tile(&tile).await.unwrap();
	assert!(!store.tile_exists(&tile).await.unwrap());
}

#[tokio::test]
async fn missing_tile() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));

	let error = store.read_tile(&coord(9, 9, 9)).await.unwrap_err();
	assert!(error.is_not_found());
	assert_eq!(error.operation, TileOperation::ReadTile);
	assert_eq!(error.to_string(), "read_tile failed for tile 9/9/9: tile not found");
	assert!(!store.tile_exists(&coord(9, 9, 9)).await.unwrap());
}

#[tokio::test]
async fn list_written_tiles_by_zoom() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 1, DataType::Uint8));
	let written = [coord(0, 0, 0), coord(1, 1, 1), coord(2, 3, 5)];
	for tile in &written {
		store
			.write_tile(tile, RasterArray::filled(1, 2, 2, DataType::Uint8, 1.0).unwrap())
			.await
			.unwrap();
	}

	let mut listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::Zoom(0..=2)).try_collect().await.unwrap();
	listed.sort();
	assert_eq!(listed, written.to_vec());

	let listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::Zoom(1..=1)).try_collect().await.unwrap();
	assert_eq!(listed, vec![coord(1, 1, 1)]);

	let mut listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::All).try_collect().await.unwrap();
	listed.sort();
	assert_eq!(listed, written.to_vec());

	let listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::Zoom(3..=9)).try_collect().await.unwrap();
	assert!(listed.is_empty());
}

#[tokio::test]
async fn leading_slash_in_base_prefix() {
	let backend = FlakyBackend::healthy();
	let profile = OutputProfile::new(RasterDriver::GTiff, 1, DataType::Uint8, "my-bucket", "/run1").unwrap();
	let store = tile_store(&backend, Arc::new(profile));
	let tile = coord(2, 3, 5);

	store
		.write_tile(&tile, RasterArray::filled(1, 2, 2, DataType::Uint8, 1.0).unwrap())
		.await
		.unwrap();
	assert!(store.tile_exists(&tile).await.unwrap());
	assert_eq!(store.get_path(&tile), "s3://my-bucket/run1/2/3/5.tif");

	let listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::All).try_collect().await.unwrap();
	assert_eq!(listed, vec![tile]);
	let listed: Vec<TileCoord> = store.list_written_tiles(TileFilter::zoom(2)).try_collect().await.unwrap();
	assert_eq!(listed, vec![tile]);
}

#[test]
fn base_prefix_with_empty_segment_is_rejected() {
	assert!(OutputProfile::new(RasterDriver::GTiff, 1, DataType::Uint8, "my-bucket", "runs//run1").is_err());
}

#[tokio::test]
async fn transient_faults_are_retried_transparently() {
	let backend = FlakyBackend::new(2, StoreError::Transient("503 Service Unavailable".into()));
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));
	let tile = coord(4, 2, 7);

	assert_eq!(store.write_tile(&tile, rgb_tile()).await.unwrap(), WriteOutcome::Written);
	assert_eq!(backend.puts(), 3);
	assert_eq!(store.read_tile(&tile).await.unwrap(), rgb_tile());
}

#[tokio::test]
async fn exhausted_retries_report_unavailable() {
	let backend = FlakyBackend::new(100, StoreError::Transient("connection reset".into()));
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));

	let error = store.write_tile(&coord(4, 2, 7), rgb_tile()).await.unwrap_err();
	assert!(matches!(
		error.kind(),
		TileErrorKind::StoreUnavailable { attempts: 4, .. }
	));
	assert_eq!(backend.puts(), 4);
}

#[tokio::test]
async fn permission_denied_is_not_retried() {
	let backend = FlakyBackend::new(100, StoreError::Permanent("AccessDenied".into()));
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));

	let error = store.write_tile(&coord(4, 2, 7), rgb_tile()).await.unwrap_err();
	assert!(matches!(error.kind(), TileErrorKind::PermanentStoreFault(_)));
	assert_eq!(error.coord, Some(coord(4, 2, 7)));
	assert_eq!(backend.puts(), 1);
}

#[tokio::test]
async fn codec_mismatch_makes_no_request() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 3, DataType::Uint8));

	let wrong_dtype = rgb_tile().convert_to(DataType::Float32);
	let error = store.write_tile(&coord(1, 1, 1), wrong_dtype).await.unwrap_err();
	assert!(matches!(error.kind(), TileErrorKind::CodecMismatch(_)));
	assert_eq!(backend.requests(), 0);
}

#[tokio::test]
async fn concurrent_writes_to_different_tiles() {
	let backend = FlakyBackend::healthy();
	let store = tile_store(&backend, profile(RasterDriver::GTiff, 1, DataType::Uint16));

	let mut tasks = Vec::new();
	for col in 0..16u32 {
		let store = store.clone();
		tasks.push(tokio::spawn(async move {
			let tile = RasterArray::filled(1, 8, 8, DataType::Uint16, f64::from(col)).unwrap();
			store.write_tile(&coord(4, 0, col), tile).await
		}));
	}
	for task in tasks {
		task.await.unwrap().unwrap();
	}

	let coords: Vec<TileCoord> = (0..16).map(|col| coord(4, 0, col)).collect();
	assert_eq!(store.tiles_exist(&coords).await.unwrap(), vec![true; 16]);
	assert!(store.read_tile(&coord(4, 0, 9)).await.unwrap().is_all(9.0));
}

#[tokio::test]
async fn local_filesystem_store() {
	let dir = tempfile::tempdir().unwrap();
	let backend = Arc::new(ObjectStoreBackend::local(dir.path()).unwrap());
	let client = ObjectStoreClient::new(backend);
	let store = TileStore::new(profile(RasterDriver::Png, 3, DataType::Uint8), client).unwrap();

	store.write_tile(&coord(2, 3, 5), rgb_tile()).await.unwrap();
	assert!(dir.path().join("run1/2/3/5.png").is_file());
	assert_eq!(store.read_tile(&coord(2, 3, 5)).await.unwrap(), rgb_tile());
}
