//! The tile storage driver.
//!
//! A [`TileStore`] persists the tiles of one output in an object store bucket. It composes the
//! [`KeyBuilder`], the [`CodecAdapter`] and the [`ObjectStoreClient`]:
//!
//! * writing: array → key → encode → put
//! * reading: key → get → decode → array
//! * existence checks: key → head, the payload is never downloaded
//!
//! Every call is stateless against the store. Concurrent writes to the same tile are not
//! coordinated; the last writer wins.

mod filter;
pub use filter::*;

use crate::ObjectStoreClient;
use futures::{
	StreamExt, TryStreamExt, future,
	stream::{self, BoxStream},
};
use std::sync::Arc;
use tilebucket_core::{
	CodecError, KeyBuilder, ObjectKey, OutputProfile, RasterArray, StoreError, TileCoord, TileError, TileErrorKind,
	TileOperation, config::OutputConfig,
};
use tilebucket_raster::{CodecAdapter, CodecRegistry};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub struct TileStore {
	profile: Arc<OutputProfile>,
	keys: KeyBuilder,
	codec: CodecAdapter,
	client: ObjectStoreClient,
}

impl TileStore {
	/// Creates a driver using the built-in codecs.
	///
	/// # Errors
	/// Fails if no codec supports the profile's driver, band count and data type.
	pub fn new(profile: Arc<OutputProfile>, client: ObjectStoreClient) -> Result<TileStore, CodecError> {
		TileStore::with_registry(profile, client, &CodecRegistry::default())
	}

	pub fn with_registry(
		profile: Arc<OutputProfile>,
		client: ObjectStoreClient,
		registry: &CodecRegistry,
	) -> Result<TileStore, CodecError> {
		let codec = CodecAdapter::new(profile.clone(), registry)?;
		let keys = KeyBuilder::from_profile(&profile);
		log::debug!(
			"tile store for s3://{}/{} ({} bands of {} as {})",
			profile.bucket,
			keys.prefix(),
			profile.bands,
			profile.dtype,
			profile.driver
		);
		Ok(TileStore {
			profile,
			keys,
			codec,
			client,
		})
	}

	/// Builds profile, object store client and driver from a configuration.
	pub fn from_config(config: &OutputConfig) -> anyhow::Result<TileStore> {
		let profile = config.to_output_profile()?;
		let client = ObjectStoreClient::from_config(&profile.bucket, &config.store)?;
		Ok(TileStore::new(Arc::new(profile), client)?)
	}

	/// Returns a view of this driver whose calls end with a `Cancelled` error once `token` is
	/// cancelled.
	#[must_use]
	pub fn with_cancellation(&self, token: CancellationToken) -> TileStore {
		TileStore {
			client: self.client.with_cancellation(token),
			..self.clone()
		}
	}

	pub fn profile(&self) -> &OutputProfile {
		&self.profile
	}

	pub fn client(&self) -> &ObjectStoreClient {
		&self.client
	}

	pub fn key_builder(&self) -> &KeyBuilder {
		&self.keys
	}

	pub fn get_key(&self, coord: &TileCoord) -> ObjectKey {
		self.keys.build_key(coord)
	}

	/// `s3://bucket/key` URL of a tile.
	pub fn get_path(&self, coord: &TileCoord) -> String {
		self.keys.get_path(coord)
	}

	/// Encodes and uploads a tile, replacing an existing one.
	///
	/// Arrays that do not match the profile fail before any request is made. If the profile
	/// has `skip_empty` set and every sample equals `nodata`, nothing is uploaded.
	pub async fn write_tile(&self, coord: &TileCoord, array: RasterArray) -> Result<WriteOutcome, TileError> {
		let fail = |kind: TileErrorKind| TileError::new(TileOperation::WriteTile, Some(*coord), kind);

		self.codec.check(&array).map_err(|e| fail(e.into()))?;

		if self.profile.skip_empty
			&& let Some(nodata) = self.profile.nodata
			&& array.is_all(nodata)
		{
			log::debug!("skipping empty tile {coord}");
			return Ok(WriteOutcome::SkippedEmpty);
		}

		let key = self.keys.build_key(coord);
		let blob = self.codec.encode(&array).map_err(|e| fail(e.into()))?;
		drop(array);

		log::trace!("write tile {coord} to '{key}' ({} bytes)", blob.len());
		self.client.put(&key, blob).await.map_err(|e| fail(e.into()))?;
		Ok(WriteOutcome::Written)
	}

	/// Downloads and decodes a tile.
	///
	/// # Errors
	/// `TileNotFound` if the tile was never written, `CodecFailure` if the stored object cannot
	/// be decoded with the profile.
	pub async fn read_tile(&self, coord: &TileCoord) -> Result<RasterArray, TileError> {
		let fail = |kind: TileErrorKind| TileError::new(TileOperation::ReadTile, Some(*coord), kind);

		let key = self.keys.build_key(coord);
		log::trace!("read tile {coord} from '{key}'");
		let blob = self.client.get(&key).await.map_err(|e| {
			if e.is_not_found() {
				log::debug!("tile {coord} does not exist");
			}
			fail(e.into())
		})?;
		self.codec.decode(&blob).map_err(|e| fail(e.into()))
	}

	/// Like [`TileStore::read_tile`], but returns [`TileStore::empty_tile`] for a tile that was
	/// never written.
	pub async fn read_tile_or_empty(&self, coord: &TileCoord, width: usize, height: usize) -> Result<RasterArray, TileError> {
		match self.read_tile(coord).await {
			Err(e) if e.is_not_found() => self
				.empty_tile(width, height)
				.map_err(|e| TileError::new(TileOperation::ReadTile, Some(*coord), e)),
			result => result,
		}
	}

	/// A tile of the profile's bands and data type filled with `nodata` (or 0 without one).
	pub fn empty_tile(&self, width: usize, height: usize) -> Result<RasterArray, CodecError> {
		RasterArray::filled(
			usize::from(self.profile.bands),
			height,
			width,
			self.profile.dtype,
			self.profile.fill_value(),
		)
		.map_err(|e| CodecError::Mismatch(format!("{e:#}")))
	}

	/// Checks with a metadata request whether a tile was written.
	pub async fn tile_exists(&self, coord: &TileCoord) -> Result<bool, TileError> {
		let key = self.keys.build_key(coord);
		log::trace!("check tile {coord} at '{key}'");
		self
			.client
			.exists(&key)
			.await
			.map_err(|e| TileError::new(TileOperation::TileExists, Some(*coord), e))
	}

	/// Checks several tiles concurrently. The result has the order of `coords`.
	pub async fn tiles_exist(&self, coords: &[TileCoord]) -> Result<Vec<bool>, TileError> {
		stream::iter(coords)
			.map(|coord| self.tile_exists(coord))
			.buffered(self.client.max_connections())
			.try_collect()
			.await
	}

	/// `true` as soon as one of `coords` is found.
	pub async fn any_tile_exists(&self, coords: &[TileCoord]) -> Result<bool, TileError> {
		let mut checks = stream::iter(coords)
			.map(|coord| self.tile_exists(coord))
			.buffer_unordered(self.client.max_connections());
		while let Some(exists) = checks.next().await {
			if exists? {
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Deletes a tile. Deleting a tile that does not exist succeeds.
	pub async fn delete_tile(&self, coord: &TileCoord) -> Result<(), TileError> {
		let key = self.keys.build_key(coord);
		log::trace!("delete tile {coord} at '{key}'");
		self
			.client
			.delete(&key)
			.await
			.map_err(|e| TileError::new(TileOperation::DeleteTile, Some(*coord), e))
	}

	/// Lazily lists the coordinates of written tiles.
	///
	/// Objects below the prefix that are not tiles of this output are logged and skipped. The
	/// stream ends after the first error.
	pub fn list_written_tiles(&self, filter: TileFilter) -> BoxStream<'_, Result<TileCoord, TileError>> {
		let prefixes: Vec<String> = match filter.zoom_levels() {
			None => vec![self.keys.prefix().to_string()],
			Some(levels) => levels.into_iter().map(|zoom| self.keys.zoom_prefix(zoom)).collect(),
		};

		stream::iter(prefixes)
			.flat_map(move |prefix| self.client.list(&prefix))
			.filter_map(move |result| future::ready(self.to_listed_coord(result, &filter)))
			.scan(false, |failed, item| {
				if *failed {
					return future::ready(None);
				}
				*failed = item.is_err();
				future::ready(Some(item))
			})
			.boxed()
	}

	fn to_listed_coord(
		&self,
		result: Result<ObjectKey, StoreError>,
		filter: &TileFilter,
	) -> Option<Result<TileCoord, TileError>> {
		match result {
			Ok(key) => match self.keys.parse_key(key.as_str()) {
				Some(coord) => filter.matches(&coord).then_some(Ok(coord)),
				None => {
					log::warn!("ignoring object '{key}', it is not a tile of this output");
					None
				}
			},
			Err(e) => Some(Err(TileError::new(TileOperation::ListWrittenTiles, None, e))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ObjectStoreBackend;
	use bytes::Bytes;
	use tilebucket_core::{Blob, DataType, RasterDriver};

	fn new_store(skip_empty: bool) -> TileStore {
		let profile = OutputProfile::new(RasterDriver::GTiff, 2, DataType::Int16, "bucket", "run1")
			.unwrap()
			.with_nodata(-1.0)
			.with_skip_empty(skip_empty);
		let client = ObjectStoreClient::new(Arc::new(ObjectStoreBackend::in_memory()));
		TileStore::new(Arc::new(profile), client).unwrap()
	}

	fn coord(zoom: u8, row: u32, col: u32) -> TileCoord {
		TileCoord::new(zoom, row, col).unwrap()
	}

	#[tokio::test]
	async fn skip_empty_tiles() {
		let store = new_store(true);
		let empty = RasterArray::filled(2, 4, 4, DataType::Int16, -1.0).unwrap();
		let outcome = store.write_tile(&coord(1, 0, 0), empty.clone()).await.unwrap();
		assert_eq!(outcome, WriteOutcome::SkippedEmpty);
		assert!(!store.tile_exists(&coord(1, 0, 0)).await.unwrap());

		let store = new_store(false);
		let outcome = store.write_tile(&coord(1, 0, 0), empty).await.unwrap();
		assert_eq!(outcome, WriteOutcome::Written);
		assert!(store.tile_exists(&coord(1, 0, 0)).await.unwrap());
	}

	#[tokio::test]
	async fn mismatch_is_checked_before_skipping() {
		let store = new_store(true);
		let wrong = RasterArray::filled(1, 4, 4, DataType::Int16, -1.0).unwrap();
		let error = store.write_tile(&coord(1, 0, 0), wrong).await.unwrap_err();
		assert!(matches!(error.kind(), TileErrorKind::CodecMismatch(_)));
		assert_eq!(error.operation, TileOperation::WriteTile);
	}

	#[tokio::test]
	async fn read_missing_or_empty() {
		let store = new_store(false);
		let error = store.read_tile(&coord(3, 1, 2)).await.unwrap_err();
		assert!(error.is_not_found());
		assert_eq!(error.coord, Some(coord(3, 1, 2)));

		let empty = store.read_tile_or_empty(&coord(3, 1, 2), 8, 4).await.unwrap();
		assert_eq!((empty.bands(), empty.height(), empty.width()), (2, 4, 8));
		assert!(empty.is_all(-1.0));
	}

	#[tokio::test]
	async fn corrupt_object_is_a_codec_failure() {
		let store = new_store(false);
		let key = store.get_key(&coord(0, 0, 0));
		store.client().put(&key, Blob::from("garbage")).await.unwrap();
		let error = store.read_tile(&coord(0, 0, 0)).await.unwrap_err();
		assert!(matches!(error.kind(), TileErrorKind::CodecFailure(_)));
	}

	#[tokio::test]
	async fn bulk_existence() {
		let store = new_store(false);
		let tile = RasterArray::filled(2, 2, 2, DataType::Int16, 5.0).unwrap();
		store.write_tile(&coord(2, 1, 1), tile).await.unwrap();

		let coords = [coord(2, 0, 0), coord(2, 1, 1), coord(2, 1, 2)];
		assert_eq!(store.tiles_exist(&coords).await.unwrap(), vec![false, true, false]);
		assert!(store.any_tile_exists(&coords).await.unwrap());
		assert!(!store.any_tile_exists(&coords[..1]).await.unwrap());
		assert!(!store.any_tile_exists(&[]).await.unwrap());
	}

	#[tokio::test]
	async fn listing_skips_foreign_objects() {
		let backend = Arc::new(ObjectStoreBackend::in_memory());
		let profile = OutputProfile::new(RasterDriver::Png, 1, DataType::Uint8, "bucket", "run1").unwrap();
		let store = TileStore::new(Arc::new(profile), ObjectStoreClient::new(backend.clone())).unwrap();

		use crate::ObjectBackend;
		for key in ["run1/2/3/5.png", "run1/2/3/5.tif", "run1/2/03/5.png", "run1/notes.txt"] {
			backend.put(key, Bytes::from_static(b"x")).await.unwrap();
		}

		let coords: Vec<TileCoord> = store.list_written_tiles(TileFilter::All).try_collect().await.unwrap();
		assert_eq!(coords, vec![coord(2, 3, 5)]);
	}

	#[tokio::test]
	async fn cancelled_view() {
		let store = new_store(false);
		let token = CancellationToken::new();
		let cancelled = store.with_cancellation(token.clone());
		token.cancel();
		let error = cancelled.tile_exists(&coord(0, 0, 0)).await.unwrap_err();
		assert!(matches!(error.kind(), TileErrorKind::Cancelled));
		assert!(!store.tile_exists(&coord(0, 0, 0)).await.unwrap());
	}
}
