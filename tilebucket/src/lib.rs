//! Store and retrieve raster map tiles in object-storage buckets.
//!
//! This crate bundles the workspace:
//!
//! - [`core`]: tile coordinates, raster arrays, output profiles, object keys, configuration
//!   and the error types
//! - [`raster`]: GeoTIFF and PNG codecs behind the [`RasterCodec`](raster::RasterCodec) trait
//! - [`store`]: the retrying object store client and the [`TileStore`](store::TileStore) driver
//!
//! ```rust
//! use tilebucket::{core::config::OutputConfig, store::TileStore};
//!
//! let config = OutputConfig::from_string(
//!     "bucket: tiles\nbasekey: run1\nprofile: { driver: PNG, bands: 4, dtype: uint8 }\nstore: { kind: memory }",
//! )
//! .unwrap();
//! let store = TileStore::from_config(&config).unwrap();
//! assert_eq!(store.get_path(&"0/0/0".parse().unwrap()), "s3://tiles/run1/0/0/0.png");
//! ```

pub use tilebucket_core as core;
pub use tilebucket_raster as raster;
pub use tilebucket_store as store;
