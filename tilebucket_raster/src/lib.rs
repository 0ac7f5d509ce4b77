//! Raster codec adapter: turns a [`RasterArray`](tilebucket_core::RasterArray) into the bytes of
//! a raster file and back, according to an [`OutputProfile`](tilebucket_core::OutputProfile).
//!
//! Encoding and decoding go through a [`MemoryFile`], a seekable in-memory file allocated per
//! call, so no temporary files are ever created.
//!
//! ```rust
//! use std::sync::Arc;
//! use tilebucket_core::{DataType, OutputProfile, RasterArray, RasterDriver};
//! use tilebucket_raster::{CodecAdapter, CodecRegistry};
//!
//! let profile = Arc::new(OutputProfile::new(RasterDriver::GTiff, 1, DataType::Uint8, "bucket", "run1").unwrap());
//! let adapter = CodecAdapter::new(profile, &CodecRegistry::default()).unwrap();
//!
//! let array = RasterArray::from_vec(1, 2, 2, vec![1u8, 2, 3, 4]).unwrap();
//! let blob = adapter.encode(&array).unwrap();
//! assert_eq!(adapter.decode(&blob).unwrap(), array);
//! ```

mod adapter;
pub use adapter::*;

pub mod codec;
pub use codec::{GeoTiffCodec, PngCodec, RasterCodec};

mod memory_file;
pub use memory_file::*;

mod registry;
pub use registry::*;
