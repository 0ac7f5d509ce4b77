//! Raster codecs, one per [`RasterDriver`].

mod geotiff;
pub use geotiff::GeoTiffCodec;

mod png;
pub use png::PngCodec;

use std::fmt::Debug;
use tilebucket_core::{Blob, CodecError, DataType, OutputProfile, RasterArray, RasterDriver};

/// Encodes raster arrays into the bytes of one file format and decodes them back.
///
/// Implementations must be stateless: every call allocates its own buffers, so one codec can
/// serve any number of concurrent calls.
pub trait RasterCodec: Debug + Send + Sync {
	fn driver(&self) -> RasterDriver;

	/// File extension including the leading dot.
	fn extension(&self) -> &'static str {
		self.driver().extension()
	}

	/// Checks whether the codec can store `bands` bands of `dtype`.
	fn supports(&self, bands: u16, dtype: DataType) -> Result<(), CodecError>;

	/// Encodes `array`. The array already matches the profile's band count and data type.
	fn encode(&self, array: &RasterArray, profile: &OutputProfile) -> Result<Blob, CodecError>;

	fn decode(&self, blob: &Blob, profile: &OutputProfile) -> Result<RasterArray, CodecError>;
}

/// Wraps an internal failure with a short description of what the codec was doing.
pub(crate) fn failure(context: &str, error: impl Into<anyhow::Error>) -> CodecError {
	CodecError::Failure(error.into().context(context.to_string()))
}
