//! Object store client and tile storage driver.
//!
//! [`ObjectStoreClient`] wraps an [`ObjectBackend`] with per-attempt timeouts, retries of
//! transient faults, a bound on requests in flight and optional cancellation.
//! [`TileStore`] builds on it: it maps tile coordinates to object keys, encodes and decodes
//! tiles with the profile's codec and turns every failure into a
//! [`TileError`](tilebucket_core::TileError) naming the operation and the tile.
//!
//! ```rust
//! use std::sync::Arc;
//! use tilebucket_core::{DataType, OutputProfile, RasterArray, RasterDriver, TileCoord};
//! use tilebucket_store::{ObjectStoreBackend, ObjectStoreClient, TileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let profile = OutputProfile::new(RasterDriver::GTiff, 1, DataType::Uint8, "bucket", "run1")?;
//!     let client = ObjectStoreClient::new(Arc::new(ObjectStoreBackend::in_memory()));
//!     let store = TileStore::new(Arc::new(profile), client)?;
//!
//!     let coord = TileCoord::new(2, 3, 5)?;
//!     store.write_tile(&coord, RasterArray::filled(1, 4, 4, DataType::Uint8, 7.0)?).await?;
//!     assert!(store.tile_exists(&coord).await?);
//!     assert_eq!(store.get_path(&coord), "s3://bucket/run1/2/3/5.tif");
//!     Ok(())
//! }
//! ```

mod backend;
pub use backend::*;

mod client;
pub use client::*;

mod driver;
pub use driver::*;
